use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a message within the active session.
///
/// Ids are allocated by the feed in strictly increasing order, so they double
/// as an arrival-order tiebreaker. They are never reused, even after the
/// message they named has been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    pub fn is_user(self) -> bool {
        self == Sender::User
    }

    pub fn is_bot(self) -> bool {
        self == Sender::Bot
    }
}

impl AsRef<str> for Sender {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// The viewer's own rating of a message. Mutually exclusive by construction;
/// the counters on [`Message`] move together with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    #[default]
    None,
    Liked,
    Disliked,
}

/// Which direction a feedback toggle pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Like,
    Dislike,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub likes: u32,
    pub dislikes: u32,
    pub feedback: Feedback,
}

impl Message {
    pub fn new(id: MessageId, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id,
            sender,
            text: text.into(),
            likes: 0,
            dislikes: 0,
            feedback: Feedback::None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender.is_user()
    }

    pub fn is_bot(&self) -> bool {
        self.sender.is_bot()
    }

    /// Apply one like/dislike toggle.
    ///
    /// Transitions (symmetric in the other kind):
    /// none -> liked (likes+1); liked -> none (likes-1);
    /// disliked -> liked (dislikes-1, likes+1).
    /// Counters cannot underflow: a decrement only ever follows the
    /// transition that performed the matching increment.
    pub fn toggle_feedback(&mut self, kind: FeedbackKind) {
        match (self.feedback, kind) {
            (Feedback::None, FeedbackKind::Like) => {
                self.likes += 1;
                self.feedback = Feedback::Liked;
            }
            (Feedback::Liked, FeedbackKind::Like) => {
                self.likes -= 1;
                self.feedback = Feedback::None;
            }
            (Feedback::Disliked, FeedbackKind::Like) => {
                self.dislikes -= 1;
                self.likes += 1;
                self.feedback = Feedback::Liked;
            }
            (Feedback::None, FeedbackKind::Dislike) => {
                self.dislikes += 1;
                self.feedback = Feedback::Disliked;
            }
            (Feedback::Disliked, FeedbackKind::Dislike) => {
                self.dislikes -= 1;
                self.feedback = Feedback::None;
            }
            (Feedback::Liked, FeedbackKind::Dislike) => {
                self.likes -= 1;
                self.dislikes += 1;
                self.feedback = Feedback::Disliked;
            }
        }
    }
}
