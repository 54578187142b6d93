//! Read-only session snapshot written out by "export chat history".

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Message, Timestamp};

/// Identifies one session (from creation until the process exits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new time-ordered session identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `SessionId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exported session document.
///
/// `messages` never contains system messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport {
    /// Session the snapshot was taken from.
    pub session_id: SessionId,
    /// Name of the local participant at export time.
    pub participant_name: String,
    /// Non-system messages in log order.
    pub messages: Vec<Message>,
    /// When the snapshot was taken.
    pub exported_at: Timestamp,
    /// User-authored messages sent since the last reset.
    pub total_user_message_count: u64,
}

impl SessionExport {
    /// Builds a snapshot, dropping system messages from `log`.
    #[must_use]
    pub fn from_log<'a>(
        session_id: SessionId,
        participant_name: &str,
        log: impl IntoIterator<Item = &'a Message>,
        exported_at: Timestamp,
        total_user_message_count: u64,
    ) -> Self {
        Self {
            session_id,
            participant_name: participant_name.to_string(),
            messages: log.into_iter().filter(|m| !m.is_system()).cloned().collect(),
            exported_at,
            total_user_message_count,
        }
    }
}
