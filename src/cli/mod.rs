//! Command-line interface parsing and dispatch.

pub mod ask;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::run_chat;
use crate::utils::logging::TranscriptLog;

#[derive(Parser)]
#[command(name = "astroguide")]
#[command(about = "A terminal chat client for a space travel assistant service")]
#[command(
    long_about = "Astroguide is a full-screen terminal chat client that talks to a space \
travel assistant relay. Replies are cleaned of pictographs and kept short; \
voice input and voice output are available when the platform provides them.\n\n\
Controls:\n\
  Type              Compose your message in the input field\n\
  Enter             Send the message\n\
  Alt+1..9          Send a quick-reply prompt\n\
  F2                Toggle voice capture (when available)\n\
  Up/Down           Scroll through the feed\n\
  Esc               Select a message (then: c copy, x delete, r regenerate,\n\
                    s speak, l like, d dislike, Esc back)\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Relay endpoint to send utterances to
    #[arg(short, long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Append the conversation transcript to this file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub log: Option<String>,

    /// Disable voice capture and playback even when available
    #[arg(long, global = true)]
    pub no_voice: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a single utterance and print the reply
    Ask {
        /// The utterance to send
        #[arg(trailing_var_arg = true)]
        prompt: Vec<String>,
    },
}

pub async fn run() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let transcript = match &args.log {
        Some(path) => TranscriptLog::new(PathBuf::from(path))?,
        None => TranscriptLog::disabled(),
    };

    match args.command {
        Some(Commands::Ask { prompt }) => ask::run_ask(&config, prompt).await,
        Some(Commands::Chat) | None => run_chat(config, transcript, args.no_voice).await,
    }
}
