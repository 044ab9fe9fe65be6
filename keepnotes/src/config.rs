//! Application configuration
//!
//! Central location for configuration constants, resource limits,
//! and the runtime settings read from the environment.

use std::time::Duration;

// ===== Notes Service =====

/// Notes Service origin used when `KEEPNOTES_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// Environment variable selecting the Notes Service origin
pub const API_URL_ENV: &str = "KEEPNOTES_API_URL";

/// Environment variable overriding the autosave debounce window
pub const AUTOSAVE_DELAY_ENV: &str = "KEEPNOTES_AUTOSAVE_DELAY_MS";

/// Environment variable overriding the HTTP request timeout
pub const REQUEST_TIMEOUT_ENV: &str = "KEEPNOTES_REQUEST_TIMEOUT_SECS";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ===== Autosave =====

/// Default autosave debounce window in milliseconds
pub const DEFAULT_AUTO_SAVE_DELAY_MS: u32 = 1_500;

/// Minimum auto-save delay in milliseconds.
/// Values below this flood the Notes Service with a request per keystroke.
pub const MIN_AUTO_SAVE_DELAY_MS: u32 = 100;

/// Maximum auto-save delay in milliseconds (5 minutes).
/// Values above this risk losing edits when the editor is closed.
pub const MAX_AUTO_SAVE_DELAY_MS: u32 = 300_000;

// ===== Notes =====

/// Background colour assigned to notes that carry none
pub const DEFAULT_NOTE_COLOR: &str = "default";

/// Background a drawing is baked onto when none was picked
pub const DEFAULT_DRAWING_BACKGROUND: &str = "#ffffff";

/// Length of the session-local block identifiers
pub const BLOCK_ID_LENGTH: usize = 8;

/// Maximum label name length accepted by the labels service
pub const MAX_LABEL_NAME_LENGTH: usize = 50;

/// Runtime configuration for the client core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Notes Service origin, without a trailing slash
    pub base_url: String,
    pub autosave_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            autosave_delay: Duration::from_millis(u64::from(DEFAULT_AUTO_SAVE_DELAY_MS)),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Create a configuration pointing at the given Notes Service origin
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            ..Self::default()
        }
    }

    /// Build configuration from environment variables.
    ///
    /// Invalid values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        let mut config = match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        };

        if let Ok(raw) = std::env::var(AUTOSAVE_DELAY_ENV) {
            match raw.trim().parse::<u32>() {
                Ok(ms) => config = config.with_autosave_delay_ms(ms),
                Err(_) => tracing::warn!(
                    "Ignoring invalid {}={:?}, using {}ms",
                    AUTOSAVE_DELAY_ENV,
                    raw,
                    DEFAULT_AUTO_SAVE_DELAY_MS
                ),
            }
        }

        if let Ok(raw) = std::env::var(REQUEST_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    "Ignoring invalid {}={:?}, using {}s",
                    REQUEST_TIMEOUT_ENV,
                    raw,
                    DEFAULT_REQUEST_TIMEOUT_SECS
                ),
            }
        }

        config
    }

    /// Set the autosave delay, clamped to the allowed range
    pub fn with_autosave_delay_ms(mut self, ms: u32) -> Self {
        let clamped = ms.clamp(MIN_AUTO_SAVE_DELAY_MS, MAX_AUTO_SAVE_DELAY_MS);
        if clamped != ms {
            tracing::warn!("Autosave delay {}ms clamped to {}ms", ms, clamped);
        }
        self.autosave_delay = Duration::from_millis(u64::from(clamped));
        self
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
