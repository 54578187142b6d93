//! The ordered message log of a session.
//!
//! [`MessageLog`] is the only place message records are created or mutated.
//! Identifiers come from a counter that survives [`MessageLog::reset`], so an
//! identifier is never reused within a session and the log stays sorted by id.
//! Lookups use that ordering.

use chattersphere_proto::message::{Message, MessageDraft, MessageId, MessageStatus, Timestamp};
use chattersphere_proto::reaction::Reactions;

use super::search;

/// Ordered, append-only log of messages.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,
    version: u64,
}

impl MessageLog {
    /// Creates a log holding only the welcome message.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        let mut log = Self {
            messages: Vec::new(),
            next_id: 1,
            version: 0,
        };
        log.append(MessageDraft::welcome(), now);
        log
    }

    /// Appends a message built from `draft` and returns a copy of it.
    ///
    /// User drafts start `Sending`; everything else is appended `Delivered`.
    /// Drafts are not validated here.
    pub fn append(&mut self, draft: MessageDraft, now: Timestamp) -> Message {
        let id = MessageId::from_raw(self.next_id);
        self.next_id += 1;
        let message = Message::from_draft(id, now, draft);
        self.messages.push(message.clone());
        self.version += 1;
        message
    }

    /// Moves a `Sending` message to `Delivered`.
    ///
    /// Returns `true` only if the status changed. Unknown ids and messages
    /// already delivered are left alone.
    pub fn mark_delivered(&mut self, id: MessageId) -> bool {
        let Some(message) = self.get_mut(id) else {
            return false;
        };
        if message.status != MessageStatus::Sending {
            return false;
        }
        message.status = MessageStatus::Delivered;
        self.version += 1;
        true
    }

    /// Toggles `actor`'s `emoji` reaction on message `id`.
    ///
    /// Returns the message's reactions after the change, or `None` if the
    /// message does not exist.
    pub fn toggle_reaction(&mut self, id: MessageId, emoji: &str, actor: &str) -> Option<&Reactions> {
        let index = self.position(id)?;
        self.messages[index].reactions.toggle(emoji, actor);
        self.version += 1;
        Some(&self.messages[index].reactions)
    }

    /// Messages whose text or sender contains `query`, ignoring case.
    ///
    /// An empty query returns the whole log. Order is preserved.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<&Message> {
        search::filter_messages(&self.messages, query)
    }

    /// Replaces the log with a fresh welcome message and returns it.
    ///
    /// The identifier counter keeps counting.
    pub fn reset(&mut self, now: Timestamp) -> Message {
        self.messages.clear();
        self.append(MessageDraft::welcome(), now)
    }

    /// Looks up a message by id.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.position(id).map(|index| &self.messages[index])
    }

    /// All messages in append order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty. Never true outside of a reset in progress.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Counter bumped on every effective mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        let index = self.position(id)?;
        Some(&mut self.messages[index])
    }

    fn position(&self, id: MessageId) -> Option<usize> {
        self.messages.binary_search_by_key(&id, |m| m.id).ok()
    }
}
