//! Participant identity and presence status.

use serde::{Deserialize, Serialize};

/// Maximum length of a participant name, in characters.
pub const MAX_NAME_CHARS: usize = 20;

/// Avatars a participant can pick from.
pub const AVATARS: [&str; 10] = [
    "\u{1f60a}",
    "\u{1f60e}",
    "\u{1f916}",
    "\u{1f984}",
    "\u{1f431}",
    "\u{1f436}",
    "\u{1f98a}",
    "\u{1f43b}",
    "\u{1f43c}",
    "\u{1f981}",
];

/// Presence status of the local participant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Actively using the client.
    #[default]
    Online,
    /// Idle.
    Away,
    /// Present but not to be disturbed.
    Busy,
    /// Connected but shown as offline.
    Invisible,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Away => write!(f, "away"),
            Self::Busy => write!(f, "busy"),
            Self::Invisible => write!(f, "invisible"),
        }
    }
}

impl std::str::FromStr for PresenceStatus {
    type Err = ParticipantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "away" => Ok(Self::Away),
            "busy" => Ok(Self::Busy),
            "invisible" => Ok(Self::Invisible),
            other => Err(ParticipantError::UnknownStatus(other.to_string())),
        }
    }
}

/// Errors from building a [`Participant`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParticipantError {
    /// Name is empty or whitespace-only.
    #[error("participant name cannot be empty")]
    EmptyName,
    /// Name exceeds [`MAX_NAME_CHARS`].
    #[error("participant name too long (max {MAX_NAME_CHARS} characters)")]
    NameTooLong,
    /// Status string did not name a known status.
    #[error("unknown presence status: {0}")]
    UnknownStatus(String),
}

/// The real participant of a session.
///
/// Deserializing applies the same name rules as [`Participant::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ParticipantRecord")]
pub struct Participant {
    name: String,
    avatar: String,
    status: PresenceStatus,
}

/// Wire shape of a [`Participant`] before its name is checked.
#[derive(Deserialize)]
struct ParticipantRecord {
    name: String,
    avatar: String,
    status: PresenceStatus,
}

impl TryFrom<ParticipantRecord> for Participant {
    type Error = ParticipantError;

    fn try_from(record: ParticipantRecord) -> Result<Self, Self::Error> {
        let mut participant = Self::new(&record.name)?.with_avatar(record.avatar);
        participant.status = record.status;
        Ok(participant)
    }
}

impl Participant {
    /// Creates a participant with the default avatar, online.
    ///
    /// Surrounding whitespace is trimmed from `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipantError::EmptyName`] if the trimmed name is empty,
    /// or [`ParticipantError::NameTooLong`] if it exceeds [`MAX_NAME_CHARS`].
    pub fn new(name: &str) -> Result<Self, ParticipantError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParticipantError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ParticipantError::NameTooLong);
        }
        Ok(Self {
            name: name.to_string(),
            avatar: AVATARS[0].to_string(),
            status: PresenceStatus::Online,
        })
    }

    /// Replaces the avatar.
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chosen avatar.
    #[must_use]
    pub fn avatar(&self) -> &str {
        &self.avatar
    }

    /// Current presence status.
    #[must_use]
    pub const fn status(&self) -> PresenceStatus {
        self.status
    }

    /// Updates the presence status.
    pub const fn set_status(&mut self, status: PresenceStatus) {
        self.status = status;
    }
}
