use crate::core::message::{FeedbackKind, Message, MessageId, Sender};

/// Ordered log of the session's exchanged messages.
///
/// Insertion order is display order. The feed is only ever appended to or
/// filtered by deletion; it is never reordered. All mutation goes through the
/// methods here so that every observable state is a consistent one.
#[derive(Debug, Default)]
pub struct MessageFeed {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next message identifier. Strictly increasing for the
    /// lifetime of the feed.
    fn next_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    /// Append a message. The id must be unique within the feed; a duplicate
    /// is a programming error, not a runtime condition to recover from.
    pub fn append(&mut self, message: Message) {
        debug_assert!(
            !self.messages.iter().any(|m| m.id == message.id),
            "duplicate message id {}",
            message.id
        );
        self.messages.push(message);
    }

    /// Allocate an id and append a new message from `sender`, returning the id.
    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> MessageId {
        let id = self.next_id();
        self.append(Message::new(id, sender, text));
        id
    }

    /// Remove the message with `id`. No-op if it is absent.
    pub fn remove(&mut self, id: MessageId) {
        self.messages.retain(|m| m.id != id);
    }

    /// Most recent message from `sender`, scanning from the end.
    pub fn find_last_by_sender(&self, sender: Sender) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.sender == sender)
    }

    /// Toggle like/dislike on the message with `id`. No-op if it is absent.
    pub fn toggle_feedback(&mut self, id: MessageId, kind: FeedbackKind) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.toggle_feedback(kind);
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
