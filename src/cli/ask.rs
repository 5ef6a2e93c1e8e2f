//! TUI-less one-shot "ask" command.

use std::error::Error;

use crate::core::config::Config;
use crate::core::responder::{HttpResponder, Responder};
use crate::core::sanitize::sanitize;
use crate::core::session::truncate_reply;

pub async fn run_ask(config: &Config, prompt: Vec<String>) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: astroguide ask <prompt>");
        std::process::exit(1);
    }

    let responder = HttpResponder::new(config.endpoint.as_str());
    match responder.request(&prompt).await {
        Ok(raw) => {
            println!("{}", truncate_reply(&sanitize(&raw)));
            Ok(())
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
