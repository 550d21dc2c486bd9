//! Error types for configuration and manifest loading.

/// Errors that can occur while loading plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The parameter manifest is not valid JSON.
    InvalidManifest(String),
    /// The configuration file is not valid TOML or has the wrong shape.
    InvalidToml(String),
    /// A configuration value is out of range.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidManifest(msg) => write!(f, "invalid parameter manifest: {msg}"),
            Self::InvalidToml(msg) => write!(f, "invalid config file: {msg}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
