//! TOML Configuration File Support
//!
//! Configuration for the quizbot daemon, read from
//! `~/.config/quizbot/quizbot.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - config: `$XDG_CONFIG_HOME/quizbot/quizbot.toml`
//! - default database: `$XDG_DATA_HOME/quizbot/quizbot.db`
//!
//! # Example Configuration
//!
//! ```toml
//! [database]
//! path = "/var/lib/quizbot/quizbot.db"
//! busy_timeout_ms = 5000
//! seed_shared_cards = true
//!
//! [telegram]
//! token = "123456:ABC-DEF"
//!
//! [trainer]
//! channel_capacity = 256
//!
//! [logging]
//! dir = "/var/log/quizbot"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `QUIZBOT_DATABASE` | `database.path` |
//! | `QUIZBOT_BUSY_TIMEOUT_MS` | `database.busy_timeout_ms` |
//! | `QUIZBOT_SEED` | `database.seed_shared_cards` |
//! | `QUIZBOT_BOT_TOKEN` | `telegram.token` |
//! | `TELOXIDE_TOKEN` | `telegram.token` (when `QUIZBOT_BOT_TOKEN` is unset) |
//! | `QUIZBOT_LOG_DIR` | `logging.dir` |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Database section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseToml {
    /// SQLite database file
    pub path: Option<PathBuf>,

    /// How long to wait on a locked database, in milliseconds
    pub busy_timeout_ms: Option<u64>,

    /// Insert the shared vocabulary on startup (once)
    pub seed_shared_cards: Option<bool>,
}

/// Telegram section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramToml {
    /// Bot API token
    pub token: Option<String>,
}

/// Trainer section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerToml {
    /// Capacity of the event and message channels
    pub channel_capacity: Option<usize>,
}

/// Logging section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// Directory for the daily-rotated `quizbot.log`; console only when unset
    pub dir: Option<PathBuf>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizbotToml {
    /// Database configuration section
    pub database: DatabaseToml,

    /// Telegram configuration section
    pub telegram: TelegramToml,

    /// Trainer configuration section
    pub trainer: TrainerToml,

    /// Logging configuration section
    pub logging: LoggingToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved quizbot configuration
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone)]
pub struct QuizbotConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Busy timeout for the database connection
    pub busy_timeout: Duration,

    /// Seed shared cards on startup
    pub seed_shared_cards: bool,

    /// Telegram bot token
    pub bot_token: Option<String>,

    /// Capacity of the trainer's event and message channels
    pub channel_capacity: usize,

    /// Directory for log files (console only when `None`)
    pub log_dir: Option<PathBuf>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl std::fmt::Debug for QuizbotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizbotConfig")
            .field("database_path", &self.database_path)
            .field("busy_timeout", &self.busy_timeout)
            .field("seed_shared_cards", &self.seed_shared_cards)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("channel_capacity", &self.channel_capacity)
            .field("log_dir", &self.log_dir)
            .field("config_file_path", &self.config_file_path)
            .field("source", &self.source)
            .finish()
    }
}

impl Default for QuizbotConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout: Duration::from_millis(5000),
            seed_shared_cards: true,
            bot_token: None,
            channel_capacity: 256,
            log_dir: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl QuizbotConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check values that would fail later at runtime
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero channel capacity or
    /// an empty database path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "trainer.channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The bot token, required to connect to Telegram
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if no non-empty token was
    /// configured anywhere.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        match self.bot_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ConfigError::ValidationError(
                "no bot token configured (set QUIZBOT_BOT_TOKEN, TELOXIDE_TOKEN, \
                 [telegram] token, or pass --token)"
                    .to_string(),
            )),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/quizbot/quizbot.toml` or
/// `~/.config/quizbot/quizbot.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("quizbot").join("quizbot.toml"))
}

/// Default database location (`$XDG_DATA_HOME/quizbot/quizbot.db`)
///
/// Falls back to `quizbot.db` in the working directory when no data
/// directory is known.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("quizbot.db"),
        |p| p.join("quizbot").join("quizbot.db"),
    )
}

/// Load configuration from all sources with proper priority
///
/// Priority order (highest first):
/// 1. CLI arguments (not handled here - caller should apply after)
/// 2. Environment variables
/// 3. TOML configuration file
/// 4. Default values
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<QuizbotConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<QuizbotConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration from a specific path and an explicit environment
///
/// `env` looks up a variable by name. Tests pass a map here instead of
/// mutating the process environment.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or the
/// resulting values are invalid.
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<QuizbotConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Start with defaults
    let mut config = QuizbotConfig::default();

    // Try to load from file
    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: QuizbotToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Apply environment variables (overrides file values)
    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut QuizbotConfig, toml: &QuizbotToml) {
    if let Some(ref path) = toml.database.path {
        config.database_path = path.clone();
    }
    if let Some(ms) = toml.database.busy_timeout_ms {
        config.busy_timeout = Duration::from_millis(ms);
    }
    if let Some(seed) = toml.database.seed_shared_cards {
        config.seed_shared_cards = seed;
    }

    if toml.telegram.token.is_some() {
        config.bot_token = toml.telegram.token.clone();
    }

    if let Some(capacity) = toml.trainer.channel_capacity {
        config.channel_capacity = capacity;
    }

    if toml.logging.dir.is_some() {
        config.log_dir = toml.logging.dir.clone();
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut QuizbotConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = env("QUIZBOT_DATABASE") {
        config.database_path = PathBuf::from(path);
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("QUIZBOT_BUSY_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.busy_timeout = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %timeout, "Ignoring invalid QUIZBOT_BUSY_TIMEOUT_MS");
        }
    }
    if let Some(seed) = env("QUIZBOT_SEED") {
        config.seed_shared_cards = seed != "0" && seed.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
    if let Some(token) = env("QUIZBOT_BOT_TOKEN").or_else(|| env("TELOXIDE_TOKEN")) {
        config.bot_token = Some(token);
        config.source = ConfigSource::Env;
    }
    if let Some(dir) = env("QUIZBOT_LOG_DIR") {
        config.log_dir = Some(PathBuf::from(dir));
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Database path override
    pub database_path: Option<PathBuf>,

    /// Bot token override
    pub bot_token: Option<String>,

    /// Seeding override
    pub seed_shared_cards: Option<bool>,

    /// Log directory override
    pub log_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set database path override
    #[must_use]
    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = Some(path);
        self
    }

    /// Set bot token override
    #[must_use]
    pub fn with_bot_token(mut self, token: String) -> Self {
        self.bot_token = Some(token);
        self
    }

    /// Set seeding override
    #[must_use]
    pub fn with_seed_shared_cards(mut self, seed: bool) -> Self {
        self.seed_shared_cards = Some(seed);
        self
    }

    /// Set log directory override
    #[must_use]
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = Some(dir);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut QuizbotConfig) {
        if self.database_path.is_some()
            || self.bot_token.is_some()
            || self.seed_shared_cards.is_some()
            || self.log_dir.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref path) = self.database_path {
            config.database_path = path.clone();
        }

        if let Some(ref token) = self.bot_token {
            config.bot_token = Some(token.clone());
        }

        if let Some(seed) = self.seed_shared_cards {
            config.seed_shared_cards = seed;
        }

        if let Some(ref dir) = self.log_dir {
            config.log_dir = Some(dir.clone());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = QuizbotConfig::default();

        assert!(config.database_path.ends_with("quizbot.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
        assert!(config.seed_shared_cards);
        assert_eq!(config.bot_token, None);
        assert_eq!(config.channel_capacity, 256);
        assert_eq!(config.log_dir, None);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("quizbot/quizbot.toml"));
        }
    }

    #[test]
    fn test_parse_valid_toml() {
        let file = toml_file(
            r#"
[database]
path = "/tmp/quiz/cards.db"
busy_timeout_ms = 250
seed_shared_cards = false

[telegram]
token = "file-token"

[trainer]
channel_capacity = 8

[logging]
dir = "/tmp/quiz/logs"
"#,
        );

        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/quiz/cards.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.seed_shared_cards);
        assert_eq!(config.bot_token.as_deref(), Some("file-token"));
        assert_eq!(config.channel_capacity, 8);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/quiz/logs")));
        assert_eq!(config.source(), ConfigSource::File);
        assert_eq!(config.config_file_path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_parse_partial_toml() {
        let file = toml_file("[telegram]\ntoken = \"only-token\"\n");
        let config = load_config_with_env(Some(file.path().to_path_buf()), no_env).unwrap();
        assert_eq!(config.bot_token.as_deref(), Some("only-token"));
        assert!(config.seed_shared_cards);
        assert_eq!(config.channel_capacity, 256);
    }

    #[test]
    fn test_missing_file_graceful() {
        let path = PathBuf::from("/nonexistent/path/quizbot.toml");
        let config = load_config_with_env(Some(path), no_env).unwrap();
        assert_eq!(config.source(), ConfigSource::Default);
        assert_eq!(config.config_file_path, None);
    }

    #[test]
    fn test_malformed_toml_error() {
        let file = toml_file("[database\npath = 3\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let file = toml_file("[trainer]\nchannel_capacity = 0\n");
        let result = load_config_with_env(Some(file.path().to_path_buf()), no_env);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = toml_file(
            r#"
[database]
path = "/from/file.db"

[telegram]
token = "file-token"
"#,
        );
        let env = env_from(&[
            ("QUIZBOT_DATABASE", "/from/env.db"),
            ("QUIZBOT_SEED", "false"),
            ("TELOXIDE_TOKEN", "teloxide-token"),
            ("QUIZBOT_LOG_DIR", "/from/env/logs"),
        ]);

        let config = load_config_with_env(Some(file.path().to_path_buf()), env).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/from/env.db"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/from/env/logs")));
        assert!(!config.seed_shared_cards);
        assert_eq!(config.bot_token.as_deref(), Some("teloxide-token"));
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_quizbot_token_beats_teloxide_token() {
        let env = env_from(&[
            ("QUIZBOT_BOT_TOKEN", "quizbot-token"),
            ("TELOXIDE_TOKEN", "teloxide-token"),
        ]);
        let config = load_config_with_env(None, env).unwrap();
        assert_eq!(config.require_token().unwrap(), "quizbot-token");
    }

    #[test]
    fn test_invalid_env_number_is_ignored() {
        let env = env_from(&[("QUIZBOT_BUSY_TIMEOUT_MS", "soon")]);
        let config = load_config_with_env(None, env).unwrap();
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides_env() {
        let env = env_from(&[("QUIZBOT_DATABASE", "/from/env.db")]);
        let mut config = load_config_with_env(None, env).unwrap();

        ConfigOverrides::new()
            .with_database_path(PathBuf::from("/from/cli.db"))
            .with_seed_shared_cards(false)
            .with_log_dir(PathBuf::from("/from/cli/logs"))
            .apply(&mut config);

        assert_eq!(config.database_path, PathBuf::from("/from/cli.db"));
        assert!(!config.seed_shared_cards);
        assert_eq!(config.log_dir, Some(PathBuf::from("/from/cli/logs")));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = QuizbotConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_require_token() {
        let mut config = QuizbotConfig::default();
        assert!(matches!(
            config.require_token(),
            Err(ConfigError::ValidationError(_))
        ));

        config.bot_token = Some("   ".to_string());
        assert!(config.require_token().is_err());

        ConfigOverrides::new()
            .with_bot_token("cli-token".to_string())
            .apply(&mut config);
        assert_eq!(config.require_token().unwrap(), "cli-token");
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = QuizbotConfig::default();
        config.bot_token = Some("secret-token".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::Cli.to_string(), "CLI");
        assert_eq!(ConfigSource::Env.to_string(), "environment");
        assert_eq!(ConfigSource::File.to_string(), "config file");
        assert_eq!(ConfigSource::Default.to_string(), "default");
    }
}
