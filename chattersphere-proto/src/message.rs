//! Message records exchanged inside a `ChatterSphere` session.
//!
//! A [`Message`] is created from a [`MessageDraft`] by the session's message
//! log, which assigns the identifier, creation time and initial delivery
//! status. Everything here is plain data; the temporal rules live in the
//! engine crate.

use serde::{Deserialize, Serialize};

use crate::reaction::Reactions;

/// Maximum length of a user-authored message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Sender name used for system messages.
pub const SYSTEM_SENDER: &str = "System";

/// Text of the system message that opens every session.
pub const WELCOME_TEXT: &str =
    "Welcome to ChatterSphere! \u{26a1} Where conversations spark and connections thrive! \u{1f31f}";

/// Prefix of the text generated for attachment messages.
pub const ATTACHMENT_TEXT_PREFIX: &str = "\u{1f4ce} Shared a file: ";

/// Session-unique, creation-ordered message identifier.
///
/// Identifiers come from a counter that is never rewound, so ordering by id
/// is ordering by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Creates a `MessageId` from its raw sequence number.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw sequence number.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Millisecond-precision UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Creates a timestamp from milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the UNIX epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[must_use]
    pub const fn millis_since(&self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The real, local participant.
    User,
    /// A simulated participant driven by the reply simulator.
    Simulated,
    /// The session itself (welcome text).
    System,
}

/// Delivery lifecycle of a message. Only ever moves `Sending -> Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Appended locally, delivery not yet confirmed.
    Sending,
    /// Delivery confirmed.
    Delivered,
}

impl MessageStatus {
    /// Display symbol for this status.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Sending => "\u{22ef}",
            Self::Delivered => "\u{2713}\u{2713}",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sending => write!(f, "sending"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}

/// A file shared into the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Display name of the file.
    pub file_name: String,
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    /// Raw file contents.
    pub data: Vec<u8>,
}

/// Error returned when a user draft fails boundary validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Text is empty or whitespace-only.
    #[error("message text is empty")]
    Empty,
    /// Text exceeds the maximum allowed length.
    #[error("message too long ({len} characters, max {max})")]
    TooLong {
        /// Actual length in characters.
        len: usize,
        /// Maximum allowed length in characters.
        max: usize,
    },
}

/// A message that has not been appended to the log yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    /// Message body.
    pub text: String,
    /// Display name of the author.
    pub sender: String,
    /// Who produced the draft.
    pub origin: Origin,
    /// Optional avatar shown next to the message.
    pub avatar: Option<String>,
    /// Optional shared file.
    pub attachment: Option<Attachment>,
}

impl MessageDraft {
    /// A draft authored by the local participant.
    #[must_use]
    pub fn user(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: sender.into(),
            origin: Origin::User,
            avatar: None,
            attachment: None,
        }
    }

    /// A draft authored by a simulated participant.
    #[must_use]
    pub fn simulated(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: sender.into(),
            origin: Origin::Simulated,
            avatar: None,
            attachment: None,
        }
    }

    /// A system draft, sent as [`SYSTEM_SENDER`].
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: SYSTEM_SENDER.to_string(),
            origin: Origin::System,
            avatar: None,
            attachment: None,
        }
    }

    /// The fixed welcome message.
    #[must_use]
    pub fn welcome() -> Self {
        Self::system(WELCOME_TEXT)
    }

    /// A user draft sharing `attachment`; the text names the file.
    #[must_use]
    pub fn user_attachment(sender: impl Into<String>, attachment: Attachment) -> Self {
        let text = format!("{ATTACHMENT_TEXT_PREFIX}{}", attachment.file_name);
        Self {
            attachment: Some(attachment),
            ..Self::user(sender, text)
        }
    }

    /// Sets the avatar shown next to the message.
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Checks the text is non-blank and at most `max_chars` characters.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] for empty or whitespace-only text,
    /// or [`ValidationError::TooLong`] if the text exceeds `max_chars`.
    pub fn validate(&self, max_chars: usize) -> Result<(), ValidationError> {
        if self.text.trim().is_empty() {
            return Err(ValidationError::Empty);
        }
        let len = self.text.chars().count();
        if len > max_chars {
            return Err(ValidationError::TooLong {
                len,
                max: max_chars,
            });
        }
        Ok(())
    }
}

/// A message as stored in the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Message body.
    pub text: String,
    /// Display name of the author.
    pub sender: String,
    /// When the message was appended.
    pub created_at: Timestamp,
    /// Who produced the message.
    pub origin: Origin,
    /// Delivery status.
    pub status: MessageStatus,
    /// Emoji reactions.
    pub reactions: Reactions,
    /// Avatar shown next to the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Shared file, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl Message {
    /// Materializes a draft. User messages start `Sending`; simulated and
    /// system messages are `Delivered` from the start.
    #[must_use]
    pub fn from_draft(id: MessageId, created_at: Timestamp, draft: MessageDraft) -> Self {
        let status = match draft.origin {
            Origin::User => MessageStatus::Sending,
            Origin::Simulated | Origin::System => MessageStatus::Delivered,
        };
        Self {
            id,
            text: draft.text,
            sender: draft.sender,
            created_at,
            origin: draft.origin,
            status,
            reactions: Reactions::default(),
            avatar: draft.avatar,
            attachment: draft.attachment,
        }
    }

    /// Whether this is a system message.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.origin == Origin::System
    }

    /// Whether the local participant authored this message.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }
}
