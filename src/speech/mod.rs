//! Spoken output of assistant replies

pub mod command;

pub use command::CommandSpeaker;

use tracing::info;

/// Vocalizes text. Fire and forget: implementations never report failures
/// back to the caller.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str);
}

/// Speech output that only records what would have been said
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

impl SpeechOutput for LogSpeaker {
    fn speak(&self, text: &str) {
        info!(target: "murmur::speech", "Speaking: {}", text);
    }
}
