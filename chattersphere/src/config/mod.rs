//! Configuration system for the `ChatterSphere` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/chattersphere/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use chattersphere_proto::message::MAX_MESSAGE_CHARS;

use crate::chat::SessionConfig;
use crate::chat::reply::ReplyPolicy;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    profile: ProfileFileConfig,
    session: SessionFileConfig,
    replies: RepliesFileConfig,
    ui: UiFileConfig,
}

/// `[profile]` section of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileFileConfig {
    name: Option<String>,
    avatar: Option<String>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    delivery_delay_ms: Option<u64>,
    typing_idle_ms: Option<u64>,
    max_message_chars: Option<usize>,
    max_attachment_bytes: Option<usize>,
    event_buffer: Option<usize>,
}

/// `[replies]` section of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RepliesFileConfig {
    probability: Option<f64>,
    min_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    seed: Option<u64>,
    participants: Option<Vec<String>>,
    phrases: Option<Vec<String>>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UiFileConfig {
    theme: Option<Theme>,
    font_size: Option<FontSize>,
    dark_mode: Option<bool>,
    sound_enabled: Option<bool>,
    sidebar_collapsed: Option<bool>,
    timestamp_format: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Accent colour of the interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Blue accent.
    #[default]
    Blue,
    /// Green accent.
    Green,
    /// Orange accent.
    Orange,
    /// Pink accent.
    Pink,
    /// Purple accent.
    Purple,
}

/// Text size of the interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    /// Small text.
    Small,
    /// Medium text.
    #[default]
    Medium,
    /// Large text.
    Large,
}

/// Presentation preferences. The engine only reads `sound_enabled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiConfig {
    /// Accent colour.
    pub theme: Theme,
    /// Text size.
    pub font_size: FontSize,
    /// Dark colour scheme.
    pub dark_mode: bool,
    /// Whether notification sounds play.
    pub sound_enabled: bool,
    /// Whether the member list starts collapsed.
    pub sidebar_collapsed: bool,
    /// Timestamp display format string (chrono).
    pub timestamp_format: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size: FontSize::default(),
            dark_mode: false,
            sound_enabled: true,
            sidebar_collapsed: false,
            timestamp_format: "%H:%M".to_string(),
        }
    }
}

/// Fully resolved client configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Display name of the local participant, if configured.
    pub name: Option<String>,
    /// Avatar of the local participant, if configured.
    pub avatar: Option<String>,
    /// Engine settings.
    pub session: SessionConfig,
    /// Presentation settings.
    pub ui: UiConfig,
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path
    /// (`~/.config/chattersphere/config.toml`) is tried and silently ignored
    /// if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let session = SessionConfig::default();
        let replies = ReplyPolicy::default();
        let ui = UiConfig::default();

        let sound_enabled = file.ui.sound_enabled.unwrap_or(ui.sound_enabled);

        Self {
            name: cli.name.clone().or_else(|| file.profile.name.clone()),
            avatar: cli.avatar.clone().or_else(|| file.profile.avatar.clone()),
            session: SessionConfig {
                delivery_delay: file
                    .session
                    .delivery_delay_ms
                    .map_or(session.delivery_delay, Duration::from_millis),
                typing_idle: file
                    .session
                    .typing_idle_ms
                    .map_or(session.typing_idle, Duration::from_millis),
                max_message_chars: file
                    .session
                    .max_message_chars
                    .map_or(session.max_message_chars, |n| n.min(MAX_MESSAGE_CHARS)),
                max_attachment_bytes: file
                    .session
                    .max_attachment_bytes
                    .unwrap_or(session.max_attachment_bytes),
                event_buffer: file.session.event_buffer.unwrap_or(session.event_buffer),
                sound_enabled,
                seed: cli.seed.or(file.replies.seed),
                replies: ReplyPolicy {
                    probability: file.replies.probability.unwrap_or(replies.probability),
                    min_delay: file
                        .replies
                        .min_delay_ms
                        .map_or(replies.min_delay, Duration::from_millis),
                    max_delay: file
                        .replies
                        .max_delay_ms
                        .map_or(replies.max_delay, Duration::from_millis),
                    participants: file
                        .replies
                        .participants
                        .clone()
                        .unwrap_or(replies.participants),
                    phrases: file.replies.phrases.clone().unwrap_or(replies.phrases),
                    avatars: replies.avatars,
                },
            },
            ui: UiConfig {
                theme: file.ui.theme.unwrap_or(ui.theme),
                font_size: file.ui.font_size.unwrap_or(ui.font_size),
                dark_mode: file.ui.dark_mode.unwrap_or(ui.dark_mode),
                sound_enabled,
                sidebar_collapsed: file.ui.sidebar_collapsed.unwrap_or(ui.sidebar_collapsed),
                timestamp_format: cli
                    .timestamp_format
                    .clone()
                    .or_else(|| file.ui.timestamp_format.clone())
                    .unwrap_or(ui.timestamp_format),
            },
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Simulated group chat in the terminal")]
pub struct CliArgs {
    /// Your display name (1-20 characters).
    #[arg(long, env = "CHATTERSPHERE_NAME")]
    pub name: Option<String>,

    /// Avatar shown next to your messages.
    #[arg(long)]
    pub avatar: Option<String>,

    /// Seed for simulated replies, for reproducible sessions.
    #[arg(long, env = "CHATTERSPHERE_SEED")]
    pub seed: Option<u64>,

    /// Path to config file (default: `~/.config/chattersphere/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Timestamp display format (chrono format string).
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "CHATTERSPHERE_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/chattersphere.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("chattersphere").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
