//! Error types for pager-notify.

/// Top-level error type for the daemon.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Configuration-related errors.
///
/// These are the only fatal errors in the system: a settings file that
/// doesn't parse, a pattern that doesn't compile, or a profile missing a
/// required field stops the daemon before any line is processed. Bad log
/// lines at runtime never error — they classify as `Unclassified` and are
/// dropped before routing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Pattern '{name}' failed to compile: {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("Pattern '{name}' must have {expected} capture groups, found {found}")]
    PatternGroups {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid profile '{name}': {reason}")]
    InvalidProfile { name: String, reason: String },

    #[error("Duplicate profile name: {0}")]
    DuplicateProfile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-related errors.
///
/// Reported per profile; a failed dispatch never aborts delivery to the
/// remaining profiles for the same event and never stops line processing.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Log source errors.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the daemon.
pub type Result<T> = std::result::Result<T, Error>;
