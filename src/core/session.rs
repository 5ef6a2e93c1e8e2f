//! The session controller: owns the message feed, the input buffer, and the
//! voice state machines, and implements every user-facing feed operation.
//!
//! The controller is deliberately synchronous. Operations that need side
//! effects hand an explicit request back to the event loop (a [`SendRequest`]
//! to spawn, a [`PlaybackRequest`] to play, a [`CaptureControl`] to execute),
//! and asynchronous completions come back in as explicit events. That keeps
//! every state transition testable without a runtime, and it keeps all feed
//! mutation on the single control thread.

use tracing::{debug, warn};

use crate::core::feed::MessageFeed;
use crate::core::message::{FeedbackKind, MessageId, Sender};
use crate::core::responder::{ResponderEvent, SendRequest};
use crate::core::sanitize::sanitize;
use crate::speech::{CaptureEvent, PlaybackEvent, PlaybackRequest};
use crate::utils::clipboard::copy_to_clipboard;
use crate::utils::logging::TranscriptLog;

/// Longest bot reply stored in the feed, in characters; anything longer is
/// cut there and marked with an ellipsis.
pub const MAX_REPLY_CHARS: usize = 450;

const REPLY_ELLIPSIS: char = '\u{2026}';

const USER_SPEAKER: &str = "You";
const BOT_SPEAKER: &str = "Guide";

/// Cut an (already sanitized) reply at the character boundary after
/// [`MAX_REPLY_CHARS`], dropping whitespace exposed at the cut and appending
/// a single ellipsis. Replies within the limit pass through unchanged.
pub fn truncate_reply(text: &str) -> String {
    match text.char_indices().nth(MAX_REPLY_CHARS) {
        None => text.to_string(),
        Some((cut, _)) => {
            let mut truncated = text[..cut].trim_end().to_string();
            truncated.push(REPLY_ELLIPSIS);
            truncated
        }
    }
}

/// What the event loop should do to the capture service after a mic toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureControl {
    Start(u64),
    Stop,
}

pub struct SessionInit {
    pub quick_replies: Vec<String>,
    pub capture_available: bool,
    pub playback_available: bool,
    pub transcript: TranscriptLog,
}

pub struct ChatSession {
    feed: MessageFeed,
    input: String,
    quick_replies: Vec<String>,
    capture_available: bool,
    playback_available: bool,
    listening: bool,
    speaking: bool,
    capture_id: u64,
    playback_id: u64,
    transcript: TranscriptLog,
}

impl ChatSession {
    pub fn new(init: SessionInit) -> Self {
        Self {
            feed: MessageFeed::new(),
            input: String::new(),
            quick_replies: init.quick_replies,
            capture_available: init.capture_available,
            playback_available: init.playback_available,
            listening: false,
            speaking: false,
            capture_id: 0,
            playback_id: 0,
            transcript: init.transcript,
        }
    }

    pub fn feed(&self) -> &MessageFeed {
        &self.feed
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn quick_replies(&self) -> &[String] {
        &self.quick_replies
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn capture_available(&self) -> bool {
        self.capture_available
    }

    pub fn playback_available(&self) -> bool {
        self.playback_available
    }

    /// Send the override text if given, otherwise the input buffer.
    ///
    /// The user message is appended immediately, before any network traffic;
    /// the returned request is what the event loop hands to the responder
    /// service. Empty (or whitespace-only) utterances are a no-op. The input
    /// buffer is cleared either way, matching the widget behavior of clearing
    /// the compose line on every send.
    pub fn send(&mut self, override_text: Option<&str>) -> Option<SendRequest> {
        let utterance = override_text.unwrap_or(&self.input);
        if utterance.trim().is_empty() {
            return None;
        }
        let utterance = utterance.to_string();
        self.input.clear();

        let user_id = self.feed.push(Sender::User, utterance.clone());
        self.log_transcript(USER_SPEAKER, &utterance);

        Some(SendRequest {
            user_id,
            utterance,
        })
    }

    /// Completion of an in-flight send. A successful reply is sanitized,
    /// truncated, and appended as a bot message; a failure is logged and
    /// appends nothing, leaving the user message in place.
    pub fn handle_responder_event(&mut self, event: ResponderEvent) -> Option<MessageId> {
        match event.result {
            Ok(raw) => {
                let text = truncate_reply(&sanitize(&raw));
                self.log_transcript(BOT_SPEAKER, &text);
                Some(self.feed.push(Sender::Bot, text))
            }
            Err(err) => {
                warn!(user_id = %event.user_id, error = %err, "assistant request failed");
                None
            }
        }
    }

    /// Re-send the most recent user message, appending a fresh user+bot pair.
    /// No-op when no user message exists.
    pub fn regenerate(&mut self) -> Option<SendRequest> {
        let text = self
            .feed
            .find_last_by_sender(Sender::User)
            .map(|message| message.text.clone())?;
        self.send(Some(&text))
    }

    /// Delete one message. No cascading effect on any other message.
    pub fn delete(&mut self, id: MessageId) {
        self.feed.remove(id);
    }

    pub fn toggle_feedback(&mut self, id: MessageId, kind: FeedbackKind) {
        self.feed.toggle_feedback(id, kind);
    }

    /// Copy to the system clipboard. Failure is swallowed.
    pub fn copy(&self, text: &str) {
        if let Err(err) = copy_to_clipboard(text) {
            debug!(error = %err, "clipboard copy failed");
        }
    }

    /// Toggle the microphone. Activating starts a new capture generation;
    /// activating while already listening stops the one in progress instead
    /// of starting a second. `None` when capture is unavailable.
    pub fn toggle_capture(&mut self) -> Option<CaptureControl> {
        if !self.capture_available {
            return None;
        }
        if self.listening {
            self.listening = false;
            // Anything the stopped capture still emits is stale.
            self.capture_id += 1;
            Some(CaptureControl::Stop)
        } else {
            self.listening = true;
            self.capture_id += 1;
            Some(CaptureControl::Start(self.capture_id))
        }
    }

    /// Event from the capture service. Events from a superseded generation
    /// are ignored; current-generation events all return the session to idle,
    /// and a transcript additionally replaces the input buffer.
    pub fn handle_capture_event(&mut self, capture_id: u64, event: CaptureEvent) {
        if capture_id != self.capture_id {
            return;
        }
        match event {
            CaptureEvent::Transcript(text) => {
                self.input = text;
                self.listening = false;
            }
            CaptureEvent::Error(err) => {
                debug!(error = %err, "voice capture failed");
                self.listening = false;
            }
            CaptureEvent::Ended => {
                self.listening = false;
            }
        }
    }

    /// Request voice playback of `text`. The new generation supersedes any
    /// utterance still in flight (the service cancels it before starting).
    /// `None` when playback is unavailable.
    pub fn speak(&mut self, text: &str) -> Option<PlaybackRequest> {
        if !self.playback_available {
            return None;
        }
        self.playback_id += 1;
        self.speaking = true;
        Some(PlaybackRequest {
            playback_id: self.playback_id,
            text: text.to_string(),
        })
    }

    /// Terminal event from the playback service. Stale generations are
    /// ignored; failures are swallowed beyond a debug trace.
    pub fn handle_playback_event(&mut self, playback_id: u64, event: PlaybackEvent) {
        if playback_id != self.playback_id {
            return;
        }
        if let PlaybackEvent::Error(err) = &event {
            debug!(error = %err, "voice playback failed");
        }
        self.speaking = false;
    }

    fn log_transcript(&self, speaker: &str, text: &str) {
        if let Err(err) = self.transcript.log_message(speaker, text) {
            warn!(error = %err, "failed to write transcript log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Feedback;
    use crate::core::responder::ResponderError;

    fn session() -> ChatSession {
        ChatSession::new(SessionInit {
            quick_replies: vec!["Plan a Mars trip".to_string()],
            capture_available: true,
            playback_available: true,
            transcript: TranscriptLog::disabled(),
        })
    }

    fn reply_ok(user_id: MessageId, text: &str) -> ResponderEvent {
        ResponderEvent {
            user_id,
            result: Ok(text.to_string()),
        }
    }

    fn reply_err(user_id: MessageId) -> ResponderEvent {
        ResponderEvent {
            user_id,
            result: Err(ResponderError::Status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            )),
        }
    }

    #[test]
    fn send_with_empty_input_is_a_no_op() {
        let mut session = session();
        assert!(session.send(None).is_none());
        session.set_input("   ");
        assert!(session.send(None).is_none());
        assert!(session.feed().is_empty());
    }

    #[test]
    fn send_appends_the_user_message_before_any_reply() {
        let mut session = session();
        session.set_input("How long to reach Neptune?");
        let request = session.send(None).unwrap();

        assert_eq!(session.feed().len(), 1);
        let message = session.feed().get(request.user_id).unwrap();
        assert!(message.is_user());
        assert_eq!(message.text, "How long to reach Neptune?");
        assert_eq!(request.utterance, "How long to reach Neptune?");
        assert_eq!(session.input(), "");
    }

    #[test]
    fn quick_reply_override_wins_over_the_input_buffer() {
        let mut session = session();
        session.set_input("half-typed draft");
        let request = session.send(Some("Cost of lunar tourism")).unwrap();
        assert_eq!(request.utterance, "Cost of lunar tourism");
        assert_eq!(
            session.feed().get(request.user_id).unwrap().text,
            "Cost of lunar tourism"
        );
    }

    #[test]
    fn successful_replies_are_sanitized_and_appended() {
        let mut session = session();
        session.set_input("hello");
        let request = session.send(None).unwrap();

        let bot_id = session
            .handle_responder_event(reply_ok(request.user_id, "Greetings  \u{1F680} traveler"))
            .unwrap();
        let bot = session.feed().get(bot_id).unwrap();
        assert!(bot.is_bot());
        assert_eq!(bot.text, "Greetings traveler");
        assert_eq!(session.feed().len(), 2);
    }

    #[test]
    fn responder_failure_appends_nothing_and_keeps_the_user_message() {
        let mut session = session();
        session.set_input("anyone there?");
        let request = session.send(None).unwrap();

        assert!(session
            .handle_responder_event(reply_err(request.user_id))
            .is_none());
        assert_eq!(session.feed().len(), 1);
        assert!(session.feed().get(request.user_id).is_some());
    }

    #[test]
    fn long_replies_are_cut_at_450_chars_with_an_ellipsis() {
        let mut session = session();
        session.set_input("Best time to visit Saturn");
        let request = session.send(None).unwrap();

        let long_reply = "a".repeat(500);
        let bot_id = session
            .handle_responder_event(reply_ok(request.user_id, &long_reply))
            .unwrap();
        let text = &session.feed().get(bot_id).unwrap().text;
        assert_eq!(text.chars().count(), MAX_REPLY_CHARS + 1);
        assert!(text.ends_with('\u{2026}'));
    }

    #[test]
    fn replies_within_the_limit_are_stored_unchanged() {
        let mut session = session();
        session.set_input("short one please");
        let request = session.send(None).unwrap();

        let reply = "b".repeat(MAX_REPLY_CHARS);
        let bot_id = session
            .handle_responder_event(reply_ok(request.user_id, &reply))
            .unwrap();
        assert_eq!(session.feed().get(bot_id).unwrap().text, reply);
    }

    #[test]
    fn truncate_reply_trims_whitespace_exposed_at_the_cut() {
        let mut text = "c".repeat(MAX_REPLY_CHARS - 3);
        text.push_str("    tail");
        let truncated = truncate_reply(&text);
        assert_eq!(truncated, format!("{}\u{2026}", "c".repeat(MAX_REPLY_CHARS - 3)));
    }

    #[test]
    fn regenerate_appends_a_fresh_pair_without_touching_the_original() {
        let mut session = session();
        session.set_input("Plan a Mars trip");
        let first = session.send(None).unwrap();
        let first_bot = session
            .handle_responder_event(reply_ok(first.user_id, "Leave in the 2031 window."))
            .unwrap();

        let redo = session.regenerate().unwrap();
        assert_eq!(redo.utterance, "Plan a Mars trip");
        let redo_bot = session
            .handle_responder_event(reply_ok(redo.user_id, "Take the scenic Venus flyby."))
            .unwrap();

        let texts: Vec<_> = session
            .feed()
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(
            texts,
            vec![
                "Plan a Mars trip",
                "Leave in the 2031 window.",
                "Plan a Mars trip",
                "Take the scenic Venus flyby.",
            ]
        );
        // Originals untouched, new pair distinct.
        assert!(session.feed().get(first.user_id).is_some());
        assert!(session.feed().get(first_bot).is_some());
        assert_ne!(first.user_id, redo.user_id);
        assert_ne!(first_bot, redo_bot);
    }

    #[test]
    fn regenerate_without_a_user_message_is_a_no_op() {
        let mut session = session();
        assert!(session.regenerate().is_none());
        assert!(session.feed().is_empty());
    }

    #[test]
    fn overlapping_sends_append_replies_in_completion_order() {
        let mut session = session();
        let first = session.send(Some("first question")).unwrap();
        let second = session.send(Some("second question")).unwrap();

        // The second request resolves before the first.
        let second_bot = session
            .handle_responder_event(reply_ok(second.user_id, "second answer"))
            .unwrap();
        let first_bot = session
            .handle_responder_event(reply_ok(first.user_id, "first answer"))
            .unwrap();

        let texts: Vec<_> = session
            .feed()
            .messages()
            .iter()
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(
            texts,
            vec![
                "first question",
                "second question",
                "second answer",
                "first answer",
            ]
        );
        assert!(second_bot < first_bot);
    }

    #[test]
    fn feed_tolerates_deletion_while_a_send_is_in_flight() {
        let mut session = session();
        let request = session.send(Some("doomed question")).unwrap();
        session.delete(request.user_id);

        let bot_id = session
            .handle_responder_event(reply_ok(request.user_id, "late answer"))
            .unwrap();
        assert_eq!(session.feed().len(), 1);
        assert_eq!(session.feed().get(bot_id).unwrap().text, "late answer");
    }

    #[test]
    fn feedback_toggles_follow_the_transition_table() {
        let mut session = session();
        let request = session.send(Some("rate this")).unwrap();
        let bot_id = session
            .handle_responder_event(reply_ok(request.user_id, "rated"))
            .unwrap();

        session.toggle_feedback(bot_id, FeedbackKind::Like);
        session.toggle_feedback(bot_id, FeedbackKind::Like);
        let message = session.feed().get(bot_id).unwrap();
        assert_eq!((message.likes, message.feedback), (0, Feedback::None));

        session.toggle_feedback(bot_id, FeedbackKind::Like);
        session.toggle_feedback(bot_id, FeedbackKind::Dislike);
        let message = session.feed().get(bot_id).unwrap();
        assert_eq!(message.likes, 0);
        assert_eq!(message.dislikes, 1);
        assert_eq!(message.feedback, Feedback::Disliked);
    }

    #[test]
    fn capture_toggle_starts_then_stops_rather_than_doubling_up() {
        let mut session = session();
        let started = session.toggle_capture().unwrap();
        assert!(matches!(started, CaptureControl::Start(_)));
        assert!(session.is_listening());

        let stopped = session.toggle_capture().unwrap();
        assert_eq!(stopped, CaptureControl::Stop);
        assert!(!session.is_listening());
    }

    #[test]
    fn capture_transcript_fills_the_input_buffer_and_returns_to_idle() {
        let mut session = session();
        let CaptureControl::Start(id) = session.toggle_capture().unwrap() else {
            panic!("expected capture to start");
        };
        session.handle_capture_event(id, CaptureEvent::Transcript("take me to the moon".into()));
        assert_eq!(session.input(), "take me to the moon");
        assert!(!session.is_listening());
        // The trailing Ended of the same generation changes nothing further.
        session.handle_capture_event(id, CaptureEvent::Ended);
        assert_eq!(session.input(), "take me to the moon");
    }

    #[test]
    fn capture_error_returns_to_idle_with_the_buffer_unchanged() {
        let mut session = session();
        session.set_input("draft");
        let CaptureControl::Start(id) = session.toggle_capture().unwrap() else {
            panic!("expected capture to start");
        };
        session.handle_capture_event(id, CaptureEvent::Error("mic unplugged".into()));
        assert_eq!(session.input(), "draft");
        assert!(!session.is_listening());
    }

    #[test]
    fn stale_capture_events_are_ignored() {
        let mut session = session();
        let CaptureControl::Start(first) = session.toggle_capture().unwrap() else {
            panic!("expected capture to start");
        };
        session.toggle_capture(); // stop; `first` is now stale
        session.toggle_capture(); // start a fresh generation

        session.handle_capture_event(first, CaptureEvent::Transcript("stale words".into()));
        assert_eq!(session.input(), "");
        assert!(session.is_listening());
    }

    #[test]
    fn capture_is_a_no_op_without_the_capability() {
        let mut session = ChatSession::new(SessionInit {
            quick_replies: Vec::new(),
            capture_available: false,
            playback_available: false,
            transcript: TranscriptLog::disabled(),
        });
        assert!(session.toggle_capture().is_none());
        assert!(!session.is_listening());
        assert!(session.speak("nothing to say it with").is_none());
        assert!(!session.is_speaking());
    }

    #[test]
    fn playback_generations_supersede_and_complete() {
        let mut session = session();
        let first = session.speak("first utterance").unwrap();
        assert!(session.is_speaking());

        // Speaking again supersedes; the first generation's end is stale.
        let second = session.speak("second utterance").unwrap();
        assert!(second.playback_id > first.playback_id);
        session.handle_playback_event(first.playback_id, PlaybackEvent::Ended);
        assert!(session.is_speaking());

        session.handle_playback_event(second.playback_id, PlaybackEvent::Ended);
        assert!(!session.is_speaking());
    }

    #[test]
    fn playback_failure_is_swallowed_and_returns_to_idle() {
        let mut session = session();
        let request = session.speak("unlucky utterance").unwrap();
        session.handle_playback_event(request.playback_id, PlaybackEvent::Error("no audio".into()));
        assert!(!session.is_speaking());
    }
}
