use anyhow::{Context, Result};
use clap::Parser;
use murmur::backend::HttpBackend;
use murmur::capture::{DesktopCapture, ImageSource};
use murmur::config::AppConfig;
use murmur::messages::{Message, MessageContent, Role};
use murmur::session::{SessionCommand, SessionController, SessionEvent, SessionRuntime};
use murmur::settings::{ChatModel, SettingField, SettingsStore, SpeechModel};
use murmur::speech::{CommandSpeaker, LogSpeaker, SpeechOutput};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chat with a remote assistant by text, voice or image
#[derive(Parser, Debug)]
#[command(name = "murmur", version)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL, e.g. http://192.168.0.189:8000
    #[arg(long)]
    backend_url: Option<String>,

    /// Start with the speaker enabled
    #[arg(long)]
    speak: bool,
}

/// One line of user input
#[derive(Debug, PartialEq)]
enum Input {
    Text(String),
    Record,
    SendDraft,
    Speaker,
    Image { path: String, text: Option<String> },
    Gallery(String),
    Camera,
    Model { field: SettingField, value: String },
    Settings,
    History,
    Help,
    Quit,
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Input::Text(line.to_string());
    };

    let mut parts = command.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim).unwrap_or_default();

    match name {
        "record" | "r" => Input::Record,
        "send" => Input::SendDraft,
        "speaker" => Input::Speaker,
        "camera" => Input::Camera,
        "settings" => Input::Settings,
        "history" => Input::History,
        "help" => Input::Help,
        "quit" | "exit" => Input::Quit,
        "gallery" if !rest.is_empty() => Input::Gallery(rest.to_string()),
        "image" if !rest.is_empty() => {
            let mut args = rest.splitn(2, char::is_whitespace);
            let path = args.next().unwrap_or_default().to_string();
            let text = args.next().map(str::trim).filter(|t| !t.is_empty());
            Input::Image {
                path,
                text: text.map(str::to_string),
            }
        }
        "model" => {
            let mut args = rest.split_whitespace();
            match (args.next().map(str::parse::<SettingField>), args.next()) {
                (Some(Ok(field)), Some(value)) => Input::Model {
                    field,
                    value: value.to_string(),
                },
                _ => Input::Invalid("usage: /model chat|speech VALUE".into()),
            }
        }
        _ => Input::Invalid(format!("unknown command: /{}", name)),
    }
}

const HELP: &str = "\
  <text>                  send a message
  /record                 start or stop voice recording
  /send                   send the transcribed draft
  /speaker                toggle spoken replies
  /image PATH [TEXT]      send an image with optional text
  /gallery PATH           pick an image from disk
  /camera                 take a photo
  /model chat|speech ID   change the chat or speech model
  /settings               show current settings
  /history                show the conversation
  /quit                   exit";

fn render_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    match &message.content {
        MessageContent::Text(text) => format!("{}: {}", who, text),
        MessageContent::Image(image) => format!("{}: [image {}]", who, image),
    }
}

fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::MessageAppended(message) if message.role == Role::Assistant => {
            Some(render_message(message))
        }
        SessionEvent::MessageAppended(message) => match &message.content {
            MessageContent::Image(_) => Some(render_message(message)),
            MessageContent::Text(_) => None,
        },
        SessionEvent::RecordingStarted => Some("* recording... (/record to stop)".into()),
        SessionEvent::RecordingStopped => Some("* recording stopped, transcribing".into()),
        SessionEvent::DraftChanged(draft) if !draft.is_empty() => {
            Some(format!("* draft: {} (/send to send)", draft))
        }
        SessionEvent::DraftChanged(_) => None,
        SessionEvent::SpeakerToggled(on) => {
            Some(format!("* speaker {}", if *on { "on" } else { "off" }))
        }
        SessionEvent::Notice(notice) => Some(format!("! {}", notice.message)),
    }
}

fn print_settings(settings: &SettingsStore) {
    let current = settings.get();
    println!("chat model:   {} ({})", current.chat_model, current.chat_model.label());
    println!("  choices:    {}", join(ChatModel::ALL.iter().map(ChatModel::as_str)));
    println!("speech model: {} ({})", current.speech_model, current.speech_model.label());
    println!("  choices:    {}", join(SpeechModel::ALL.iter().map(SpeechModel::as_str)));
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn main() -> Result<()> {
    // Logs go to stderr so they do not interleave with the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "murmur=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config =
        AppConfig::load_or_default(cli.config.as_deref()).context("loading configuration")?;
    if let Some(url) = &cli.backend_url {
        config = config.with_backend_url(url);
        config.validate()?;
    }

    info!(
        "Starting murmur (chat: {}, transcribe: {})",
        config.backend.chat_url, config.backend.transcribe_url
    );

    let settings = SettingsStore::new(config.settings);
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let capture = Arc::new(DesktopCapture::new(&config.audio.recordings_dir));
    let speech: Arc<dyn SpeechOutput> = match CommandSpeaker::from_config(&config.speech) {
        Some(speaker) => Arc::new(speaker),
        None => Arc::new(LogSpeaker),
    };

    let (controller, events) = SessionController::with_audio_format(
        settings,
        backend,
        capture.clone(),
        speech,
        config.audio.format(),
    );
    if cli.speak {
        controller.toggle_speaker();
    }

    let mut handle = SessionRuntime::start(controller, events)?;

    // The printer thread is the session's only event consumer
    let events = handle
        .take_event_receiver()
        .context("event receiver already taken")?;
    thread::spawn(move || {
        for event in events.iter() {
            if let Some(line) = render_event(&event) {
                println!("{}", line);
            }
        }
    });

    println!("murmur: type a message, or /help");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let cmd = match parse_input(&line) {
            Input::Text(text) if text.is_empty() => continue,
            Input::Text(text) => SessionCommand::SendText(text),
            Input::Record => SessionCommand::ToggleRecording,
            Input::SendDraft => SessionCommand::SendDraft,
            Input::Speaker => SessionCommand::ToggleSpeaker,
            Input::Image { path, text } => SessionCommand::SendImage { uri: path, text },
            Input::Gallery(path) => {
                capture.stage_gallery_selection(path);
                SessionCommand::CaptureImage(ImageSource::Gallery)
            }
            Input::Camera => SessionCommand::CaptureImage(ImageSource::Camera),
            Input::Model { field, value } => SessionCommand::UpdateSetting { field, value },
            Input::Settings => {
                print_settings(handle.controller().settings());
                continue;
            }
            Input::History => {
                for message in handle.controller().messages() {
                    println!("{} {}", message.id, render_message(&message));
                }
                continue;
            }
            Input::Help => {
                println!("{}", HELP);
                continue;
            }
            Input::Invalid(reason) => {
                println!("! {}", reason);
                continue;
            }
            Input::Quit => break,
        };
        handle.send_command(cmd)?;
        io::stdout().flush()?;
    }

    handle.shutdown()?;
    info!("Goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_input("  hello there "), Input::Text("hello there".into()));
        assert_eq!(parse_input(""), Input::Text(String::new()));
    }

    #[test]
    fn test_image_with_and_without_text() {
        assert_eq!(
            parse_input("/image /tmp/a.jpg what is this?"),
            Input::Image {
                path: "/tmp/a.jpg".into(),
                text: Some("what is this?".into())
            }
        );
        assert_eq!(
            parse_input("/image file:///tmp/a.jpg"),
            Input::Image {
                path: "file:///tmp/a.jpg".into(),
                text: None
            }
        );
        assert!(matches!(parse_input("/image"), Input::Invalid(_)));
    }

    #[test]
    fn test_model_command() {
        assert_eq!(
            parse_input("/model chat gpt-4"),
            Input::Model {
                field: SettingField::ChatModel,
                value: "gpt-4".into()
            }
        );
        assert!(matches!(parse_input("/model volume 3"), Input::Invalid(_)));
        assert!(matches!(parse_input("/model speech"), Input::Invalid(_)));
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_input("/record"), Input::Record);
        assert_eq!(parse_input("/r"), Input::Record);
        assert_eq!(parse_input("/gallery /tmp/b.png"), Input::Gallery("/tmp/b.png".into()));
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert!(matches!(parse_input("/dance"), Input::Invalid(_)));
    }

    #[test]
    fn test_render_hides_own_text() {
        use murmur::messages::MessageLog;

        let log = MessageLog::new();
        let mine = log.append(Role::User, MessageContent::Text("hi".into()));
        let reply = log.append(Role::Assistant, MessageContent::Text("hello".into()));

        assert_eq!(render_event(&SessionEvent::MessageAppended(mine)), None);
        assert_eq!(
            render_event(&SessionEvent::MessageAppended(reply)).as_deref(),
            Some("assistant: hello")
        );
    }
}
