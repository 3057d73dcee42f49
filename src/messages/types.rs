use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Position of a message in the session log.
///
/// Ids are handed out by [`MessageLog`](super::MessageLog) in append order, so
/// comparing two ids compares their creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Text,
    Image,
}

/// Reference to an image stored on the device (a `file://` URI or a plain path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve the reference to a local filesystem path.
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.0.strip_prefix("file://").unwrap_or(&self.0))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    Text(String),
    Image(ImageRef),
}

impl MessageContent {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageContent::Text(_) => MessageKind::Text,
            MessageContent::Image(_) => MessageKind::Image,
        }
    }

    /// The text body, if this is a text message.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Image(_) => None,
        }
    }
}

/// A single entry in the conversation. Never changes after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(id: MessageId, role: Role, content: MessageContent) -> Self {
        Self {
            id,
            role,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.content.kind()
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_resolves_file_uri() {
        let image = ImageRef::new("file:///tmp/a.jpg");
        assert_eq!(image.to_path(), PathBuf::from("/tmp/a.jpg"));

        let image = ImageRef::new("/sdcard/DCIM/b.jpg");
        assert_eq!(image.to_path(), PathBuf::from("/sdcard/DCIM/b.jpg"));
    }

    #[test]
    fn test_content_kind() {
        assert_eq!(MessageContent::Text("hi".into()).kind(), MessageKind::Text);
        let image = MessageContent::Image(ImageRef::new("file:///tmp/a.jpg"));
        assert_eq!(image.kind(), MessageKind::Image);
        assert_eq!(image.text(), None);
    }

    #[test]
    fn test_ids_order_by_creation() {
        assert!(MessageId(1) < MessageId(2));
        assert_eq!(MessageId(7).to_string(), "#7");
    }
}
