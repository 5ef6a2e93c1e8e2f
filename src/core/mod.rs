pub mod config;
pub mod feed;
pub mod message;
pub mod responder;
pub mod sanitize;
pub mod session;
