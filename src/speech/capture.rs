use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::speech::CommandSpec;

/// Events from a capture attempt, tagged with the capture generation that
/// produced them. `Ended` is always the last event of a generation.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// The final transcript. Non-interim, single alternative: the first
    /// non-empty line the transcriber prints.
    Transcript(String),
    Error(String),
    Ended,
}

/// Runs the transcriber command for voice capture.
///
/// At most one capture is active at a time: starting a new generation or
/// calling [`CaptureService::stop`] cancels the previous child process.
pub struct CaptureService {
    tx: mpsc::UnboundedSender<(CaptureEvent, u64)>,
    command: Option<CommandSpec>,
    locale: String,
    cancel: Option<CancellationToken>,
}

impl CaptureService {
    pub fn new(
        command: Option<CommandSpec>,
        locale: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<(CaptureEvent, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                command,
                locale: locale.into(),
                cancel: None,
            },
            rx,
        )
    }

    pub fn is_available(&self) -> bool {
        self.command.is_some()
    }

    /// Start a capture under `capture_id`, stopping any capture still running.
    pub fn start(&mut self, capture_id: u64) {
        self.stop();
        let Some(command) = self.command.clone() else {
            return;
        };
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());

        let tx = self.tx.clone();
        let locale = self.locale.clone();
        tokio::spawn(async move {
            let mut cmd = Command::new(&command.program);
            cmd.args(&command.args)
                .arg(&locale)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true);

            let mut child = match cmd.spawn() {
                Ok(child) => child,
                Err(err) => {
                    let _ = tx.send((CaptureEvent::Error(err.to_string()), capture_id));
                    let _ = tx.send((CaptureEvent::Ended, capture_id));
                    return;
                }
            };

            match child.stdout.take() {
                Some(stdout) => {
                    let mut lines = BufReader::new(stdout).lines();
                    let outcome = tokio::select! {
                        line = lines.next_line() => Some(line),
                        _ = token.cancelled() => None,
                    };
                    match outcome {
                        Some(Ok(Some(line))) if !line.trim().is_empty() => {
                            let _ = tx.send((
                                CaptureEvent::Transcript(line.trim().to_string()),
                                capture_id,
                            ));
                        }
                        // EOF without a transcript, or an explicit stop.
                        Some(Ok(_)) | None => {}
                        Some(Err(err)) => {
                            let _ = tx.send((CaptureEvent::Error(err.to_string()), capture_id));
                        }
                    }
                }
                None => {
                    let _ = tx.send((
                        CaptureEvent::Error("transcriber stdout unavailable".to_string()),
                        capture_id,
                    ));
                }
            }

            // One transcript per capture: the recorder is done once the first
            // line is in (or the capture was stopped).
            let _ = child.kill().await;
            let _ = tx.send((CaptureEvent::Ended, capture_id));
        });
    }

    /// Stop the active capture, if any. The running generation still emits
    /// its terminal `Ended` event.
    pub fn stop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}
