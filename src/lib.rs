//! Astroguide is a terminal chat client for a space travel assistant relay.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the message feed, per-message feedback, reply
//!   sanitization/truncation, the relay boundary, and the session controller
//!   that ties them together.
//! - [`speech`] wraps voice capture (speech-to-text) and playback
//!   (text-to-speech) as independent, cancelable command-driven services.
//! - [`ui`] renders the full-screen terminal interface and runs the event
//!   loop that drives the controller.
//! - [`cli`] parses command-line arguments and dispatches into the chat
//!   interface or the one-shot `ask` command.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`cli::run`].

pub mod cli;
pub mod core;
pub mod speech;
pub mod ui;
pub mod utils;
