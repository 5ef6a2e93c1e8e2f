use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::speech::CommandSpec;

/// Terminal event for one playback generation: the utterance finished or
/// failed. A canceled (superseded) utterance emits nothing; its generation
/// is already stale by the time it is killed.
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    Ended,
    Error(String),
}

/// A playback order from the session: which generation, and what to say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub playback_id: u64,
    pub text: String,
}

/// Runs the synthesizer command for voice output.
///
/// At most one utterance plays at a time: [`PlaybackService::speak`] cancels
/// whatever is still in flight before starting the new child process.
pub struct PlaybackService {
    tx: mpsc::UnboundedSender<(PlaybackEvent, u64)>,
    command: Option<CommandSpec>,
    cancel: Option<CancellationToken>,
}

impl PlaybackService {
    pub fn new(
        command: Option<CommandSpec>,
    ) -> (Self, mpsc::UnboundedReceiver<(PlaybackEvent, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                command,
                cancel: None,
            },
            rx,
        )
    }

    pub fn is_available(&self) -> bool {
        self.command.is_some()
    }

    pub fn speak(&mut self, request: PlaybackRequest) {
        self.cancel_current();
        let Some(command) = self.command.clone() else {
            return;
        };
        let token = CancellationToken::new();
        self.cancel = Some(token.clone());

        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut cmd = Command::new(&command.program);
            cmd.args(&command.args)
                .arg(&request.text)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true);

            let mut child = match cmd.spawn() {
                Ok(child) => child,
                Err(err) => {
                    let _ = tx.send((PlaybackEvent::Error(err.to_string()), request.playback_id));
                    return;
                }
            };

            let status = tokio::select! {
                status = child.wait() => Some(status),
                _ = token.cancelled() => None,
            };
            match status {
                Some(Ok(status)) if status.success() => {
                    let _ = tx.send((PlaybackEvent::Ended, request.playback_id));
                }
                Some(Ok(status)) => {
                    let _ = tx.send((
                        PlaybackEvent::Error(format!("synthesizer exited with {status}")),
                        request.playback_id,
                    ));
                }
                Some(Err(err)) => {
                    let _ = tx.send((PlaybackEvent::Error(err.to_string()), request.playback_id));
                }
                // Superseded or shut down: reap the child, emit nothing.
                None => {
                    let _ = child.kill().await;
                }
            }
        });
    }

    pub fn cancel_current(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finished_utterances_report_ended_with_their_generation() {
        let command = CommandSpec::parse("true").unwrap();
        let (mut service, mut rx) = PlaybackService::new(Some(command));
        service.speak(PlaybackRequest {
            playback_id: 4,
            text: "Welcome aboard".to_string(),
        });

        let (event, id) = rx.recv().await.expect("expected end of playback");
        assert_eq!(id, 4);
        assert!(matches!(event, PlaybackEvent::Ended));
    }

    #[tokio::test]
    async fn speaking_again_supersedes_the_utterance_in_flight() {
        // First utterance would take 5 seconds; the second finishes at once.
        // Only the second may report, and with its own generation.
        let command = CommandSpec::parse("sleep").unwrap();
        let (mut service, mut rx) = PlaybackService::new(Some(command));
        service.speak(PlaybackRequest {
            playback_id: 1,
            text: "5".to_string(),
        });
        service.speak(PlaybackRequest {
            playback_id: 2,
            text: "0".to_string(),
        });

        let (event, id) = rx.recv().await.expect("expected end of playback");
        assert_eq!(id, 2);
        assert!(matches!(event, PlaybackEvent::Ended));
    }

    #[tokio::test]
    async fn failures_are_reported_not_propagated() {
        let command = CommandSpec::parse("definitely-not-a-real-synthesizer").unwrap();
        let (mut service, mut rx) = PlaybackService::new(Some(command));
        service.speak(PlaybackRequest {
            playback_id: 8,
            text: "unused".to_string(),
        });

        let (event, id) = rx.recv().await.expect("expected error event");
        assert_eq!(id, 8);
        assert!(matches!(event, PlaybackEvent::Error(_)));
    }

    #[test]
    fn availability_follows_resolution() {
        let (unavailable, _rx) = PlaybackService::new(None);
        assert!(!unavailable.is_available());
    }
}
