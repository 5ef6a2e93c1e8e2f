//! Boundary to the assistant relay endpoint.
//!
//! The relay speaks a single-turn wire format: POST `{"message": …}`, receive
//! `{"reply": …}`. Anything else (transport error, non-2xx status, malformed
//! body) is a [`ResponderError`]. Requests carry the id of the user message
//! that triggered them so completions can be paired with their origin no
//! matter what order they arrive in.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::core::message::MessageId;

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug)]
pub enum ResponderError {
    /// The request never produced an HTTP response.
    Transport(reqwest::Error),

    /// The relay answered with a non-success status.
    Status(reqwest::StatusCode),

    /// The response body was not a valid reply payload.
    Body(serde_json::Error),
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderError::Transport(source) => write!(f, "request failed: {source}"),
            ResponderError::Status(status) => write!(f, "relay returned {status}"),
            ResponderError::Body(source) => write!(f, "malformed reply body: {source}"),
        }
    }
}

impl StdError for ResponderError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ResponderError::Transport(source) => Some(source),
            ResponderError::Status(_) => None,
            ResponderError::Body(source) => Some(source),
        }
    }
}

/// One conversational turn against the completion relay.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn request(&self, utterance: &str) -> Result<String, ResponderError>;
}

pub struct HttpResponder {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpResponder {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn request(&self, utterance: &str) -> Result<String, ResponderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest {
                message: utterance.to_string(),
            })
            .send()
            .await
            .map_err(ResponderError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResponderError::Status(status));
        }

        let body = response.text().await.map_err(ResponderError::Transport)?;
        let reply: ChatReply = serde_json::from_str(&body).map_err(ResponderError::Body)?;
        Ok(reply.reply)
    }
}

/// An in-flight send: the utterance plus the user message it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub user_id: MessageId,
    pub utterance: String,
}

/// Completion of a [`SendRequest`], delivered on the session event channel.
#[derive(Debug)]
pub struct ResponderEvent {
    pub user_id: MessageId,
    pub result: Result<String, ResponderError>,
}

/// Runs relay requests on the runtime and reports completions over a channel.
///
/// Overlapping requests are not serialized: events arrive in completion
/// order, each tagged with its originating user message id.
#[derive(Clone)]
pub struct ResponderService {
    responder: Arc<dyn Responder>,
    tx: mpsc::UnboundedSender<ResponderEvent>,
}

impl ResponderService {
    pub fn new(responder: Arc<dyn Responder>) -> (Self, mpsc::UnboundedReceiver<ResponderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { responder, tx }, rx)
    }

    pub fn spawn_request(&self, request: SendRequest) {
        let responder = Arc::clone(&self.responder);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = responder.request(&request.utterance).await;
            let _ = tx.send(ResponderEvent {
                user_id: request.user_id,
                result,
            });
        });
    }
}
