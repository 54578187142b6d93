//! Send pipeline methods for [`ChatSession`].
//!
//! Validates user input at the boundary, appends it, arms the delivery timer
//! and hands the new message to the reply simulator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chattersphere_proto::message::{
    Attachment, MAX_MESSAGE_CHARS, Message, MessageDraft, ValidationError,
};

use crate::scheduler::TimerKey;

use super::{ChatEvent, ChatSession};

/// Media type used when a file's extension is not recognised.
const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Errors that can occur when sending a message.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    /// Message text failed validation (empty, too long).
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Attachment exceeds the configured size limit.
    #[error("attachment too large: {size} bytes (max {max} bytes)")]
    AttachmentTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Attachment has no usable file name.
    #[error("attachment has no file name")]
    MissingFileName,
}

/// Errors from sharing a file from disk. Nothing is appended on failure.
#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    /// The file could not be read.
    #[error("could not read {path}: {source}")]
    Unreadable {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file was read but rejected.
    #[error(transparent)]
    Rejected(#[from] SendError),
}

impl ChatSession {
    /// Sends `text` as the local participant.
    ///
    /// Steps:
    /// 1. Validate (non-blank, within `max_message_chars`)
    /// 2. Append as `Sending`
    /// 3. Clear the typing indicator and its idle timer
    /// 4. Arm the delivery timer
    /// 5. Let the reply simulator decide on an answer
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Validation`] if the text is blank or too long;
    /// nothing is appended in that case.
    pub fn send(&self, text: &str) -> Result<Message, SendError> {
        let draft = {
            let state = self.shared.state.lock();
            let participant = &state.participant;
            MessageDraft::user(participant.name(), text).with_avatar(participant.avatar())
        };
        if let Err(e) = draft.validate(self.message_limit()) {
            tracing::warn!(error = %e, "rejected outgoing message");
            return Err(e.into());
        }

        let message = self.dispatch_user(draft);

        let was_typing = self.shared.state.lock().typing.stop();
        self.scheduler.cancel(&TimerKey::TypingIdle);
        if was_typing {
            self.shared.emit(ChatEvent::TypingChanged { is_active: false });
        }
        Ok(message)
    }

    /// Shares a file as the local participant.
    ///
    /// Follows the same delivery and reply rules as [`send`](Self::send).
    ///
    /// # Errors
    ///
    /// Returns [`SendError::MissingFileName`] for a blank name,
    /// [`SendError::AttachmentTooLarge`] above `max_attachment_bytes`, or
    /// [`SendError::Validation`] if the generated text would exceed the
    /// message length limit.
    pub fn send_attachment(
        &self,
        file_name: &str,
        media_type: &str,
        data: Vec<u8>,
    ) -> Result<Message, SendError> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(SendError::MissingFileName);
        }
        let max = self.config.max_attachment_bytes;
        if data.len() > max {
            tracing::warn!(file_name, size = data.len(), max, "rejected oversized attachment");
            return Err(SendError::AttachmentTooLarge {
                size: data.len(),
                max,
            });
        }

        let attachment = Attachment {
            file_name: file_name.to_string(),
            media_type: media_type.to_string(),
            data,
        };
        let draft = {
            let state = self.shared.state.lock();
            let participant = &state.participant;
            MessageDraft::user_attachment(participant.name(), attachment)
                .with_avatar(participant.avatar())
        };
        if let Err(e) = draft.validate(self.message_limit()) {
            tracing::warn!(error = %e, "rejected attachment name");
            return Err(e.into());
        }
        Ok(self.dispatch_user(draft))
    }

    /// Reads `path` and shares it.
    ///
    /// The media type is guessed from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError::Unreadable`] if the file can not be read, or
    /// [`AttachError::Rejected`] if [`send_attachment`](Self::send_attachment)
    /// refuses it.
    pub async fn attach_file(&self, path: &Path) -> Result<Message, AttachError> {
        let data = tokio::fs::read(path).await.map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "attachment read failed");
            AttachError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = guess_media_type(path);
        Ok(self.send_attachment(&file_name, media_type, data)?)
    }

    /// Effective character limit for user text. Configuration can tighten
    /// the limit but never raise it above [`MAX_MESSAGE_CHARS`].
    fn message_limit(&self) -> usize {
        self.config.max_message_chars.min(MAX_MESSAGE_CHARS)
    }

    /// Appends a validated user draft and arms its timers.
    fn dispatch_user(&self, draft: MessageDraft) -> Message {
        let (message, planned, epoch) = {
            let mut state = self.shared.state.lock();
            let now = self.shared.clock.now();
            let message = state.log.append(draft, now);
            state.user_message_count += 1;
            let planned = state.simulator.plan(&message);
            (message, planned, state.epoch)
        };
        let id = message.id;
        tracing::info!(message_id = %id, "message sent");
        self.shared.emit(ChatEvent::MessageAppended(message.clone()));

        let shared = Arc::clone(&self.shared);
        self.scheduler
            .schedule(TimerKey::Delivery(id), self.config.delivery_delay, move || {
                shared.deliver(id);
            });

        if let Some(reply) = planned {
            let shared = Arc::clone(&self.shared);
            self.scheduler
                .schedule(TimerKey::Reply(id), reply.delay, move || {
                    shared.append_reply(epoch, reply.draft);
                });
        }
        message
    }
}

/// Guesses a media type from the file extension.
fn guess_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => FALLBACK_MEDIA_TYPE,
    }
}
