use super::types::{Message, MessageContent, MessageId, Role};
use parking_lot::RwLock;
use std::sync::Arc;

/// Append-only, insertion-ordered conversation log.
///
/// Clones share the same underlying log. There is no way to
/// remove or edit a message once it has been appended.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append a message and return a copy of what was stored.
    ///
    /// Id assignment and the push happen under one write lock, so ids stay
    /// in the same order as the log.
    pub fn append(&self, role: Role, content: MessageContent) -> Message {
        let mut messages = self.messages.write();
        let id = MessageId(messages.len() as u64 + 1);
        let message = Message::new(id, role, content);
        messages.push(message.clone());
        message
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn get(&self, id: MessageId) -> Option<Message> {
        self.messages.read().iter().find(|m| m.id == id).cloned()
    }

    pub fn last(&self) -> Option<Message> {
        self.messages.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::ImageRef;

    #[test]
    fn test_append_preserves_order() {
        let log = MessageLog::new();
        assert!(log.is_empty());

        let first = log.append(Role::User, MessageContent::Text("hello".into()));
        let second = log.append(
            Role::User,
            MessageContent::Image(ImageRef::new("file:///tmp/a.jpg")),
        );
        let third = log.append(Role::Assistant, MessageContent::Text("hi".into()));

        assert!(first.id < second.id && second.id < third.id);
        let all = log.snapshot();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], first);
        assert_eq!(all[2].role, Role::Assistant);
        assert_eq!(log.last(), Some(third));
    }

    #[test]
    fn test_clones_share_log() {
        let log = MessageLog::new();
        let other = log.clone();
        let msg = other.append(Role::User, MessageContent::Text("x".into()));
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(msg.id), Some(msg));
        assert_eq!(log.get(MessageId(42)), None);
    }

    #[test]
    fn test_concurrent_appends_get_unique_ids() {
        let log = MessageLog::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        log.append(Role::User, MessageContent::Text(format!("{t}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let ids: Vec<u64> = log.snapshot().iter().map(|m| m.id.0).collect();
        let expected: Vec<u64> = (1..=100).collect();
        assert_eq!(ids, expected);
    }
}
