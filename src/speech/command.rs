use super::SpeechOutput;
use crate::config::SpeechConfig;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, warn};

/// Speaks by running an external text-to-speech program (`espeak`, `say`, ...)
/// with the text as its final argument.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Build from config; `None` when no command is configured
    pub fn from_config(config: &SpeechConfig) -> Option<Self> {
        config
            .command
            .as_ref()
            .map(|program| Self::new(program.clone()).with_args(config.args.clone()))
    }

    fn command(&self, text: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl SpeechOutput for CommandSpeaker {
    fn speak(&self, text: &str) {
        let mut cmd = self.command(text);
        let program = self.program.clone();

        // Wait on a separate thread so the caller never blocks on playback
        thread::spawn(move || match cmd.status() {
            Ok(status) if status.success() => debug!("{} finished", program),
            Ok(status) => warn!("{} exited with {}", program, status),
            Err(e) => warn!("Failed to run {}: {}", program, e),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        assert!(CommandSpeaker::from_config(&SpeechConfig::default()).is_none());

        let config = SpeechConfig {
            command: Some("espeak".into()),
            args: vec!["-s".into(), "150".into()],
        };
        let speaker = CommandSpeaker::from_config(&config).unwrap();
        let cmd = speaker.command("hello there");
        assert_eq!(cmd.get_program(), "espeak");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-s", "150", "hello there"]);
    }

    #[test]
    fn test_missing_program_does_not_panic() {
        let speaker = CommandSpeaker::new("murmur-no-such-tts-binary");
        speaker.speak("ignored");
    }
}
