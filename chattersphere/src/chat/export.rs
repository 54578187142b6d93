//! Chat history export.
//!
//! Produces a [`SessionExport`] snapshot and writes it as pretty-printed JSON
//! named `ChatterSphere_<participant>_<YYYY-MM-DD>.json`.

use std::path::{Path, PathBuf};

use chattersphere_proto::export::SessionExport;
use chattersphere_proto::message::Timestamp;

use super::ChatSession;

/// Errors that can occur while exporting a session.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The snapshot could not be serialized.
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The export file could not be written.
    #[error("failed to write export to {path}: {source}")]
    Write {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl ChatSession {
    /// Snapshot of the session without system messages.
    #[must_use]
    pub fn export(&self) -> SessionExport {
        let state = self.shared.state.lock();
        SessionExport::from_log(
            self.id,
            state.participant.name(),
            state.log.messages(),
            self.shared.clock.now(),
            state.user_message_count,
        )
    }

    /// [`export`](Self::export) rendered as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Serialize`] if serialization fails.
    pub fn export_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    /// File name for an export taken now.
    #[must_use]
    pub fn export_file_name(&self) -> String {
        let name = self.participant().name().to_string();
        export_file_name(&name, self.shared.clock.now())
    }

    /// Writes the export into `dir` and returns the file path.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if serialization or the write fails.
    pub async fn write_export(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let json = self.export_json()?;
        let path = dir.join(self.export_file_name());
        tokio::fs::write(&path, json).await.map_err(|source| {
            tracing::warn!(path = %path.display(), error = %source, "export write failed");
            ExportError::Write {
                path: path.clone(),
                source,
            }
        })?;
        tracing::info!(path = %path.display(), "chat history exported");
        Ok(path)
    }
}

/// `ChatterSphere_<name>_<YYYY-MM-DD>.json`, dated in UTC.
///
/// Path separators in `name` are replaced so the result is a single file name.
#[must_use]
pub fn export_file_name(name: &str, at: Timestamp) -> String {
    let date = i64::try_from(at.as_millis())
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map_or_else(|| "unknown-date".to_string(), |dt| dt.format("%Y-%m-%d").to_string());
    let safe: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("ChatterSphere_{safe}_{date}.json")
}
