use crate::messages::Message;
use crate::MurmurError;

/// Category of a user-visible notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    PermissionDenied,
    TranscriptionFailure,
    ChatFailure,
    CaptureFailure,
    InvalidSetting,
}

/// A failure converted into something the UI can show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Short text for the user
    pub message: String,
    /// Underlying error, for logs and debug views
    pub detail: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, error: &MurmurError) -> Self {
        Self {
            kind,
            message: error.user_message(),
            detail: error.to_string(),
        }
    }
}

/// State changes published by the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended(Message),
    RecordingStarted,
    RecordingStopped,
    DraftChanged(String),
    SpeakerToggled(bool),
    Notice(Notice),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_from_error() {
        let err = MurmurError::Transcription("backend returned 502".into());
        let notice = Notice::new(NoticeKind::TranscriptionFailure, &err);
        assert_eq!(notice.message, "Speech recognition failed. Please try again.");
        assert!(notice.detail.contains("502"));
    }
}
