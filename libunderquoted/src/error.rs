//! Error types for Underquoted

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UnderquotedError>;

#[derive(Error, Debug)]
pub enum UnderquotedError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cursor store error: {0}")]
    Cursor(#[from] CursorError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl UnderquotedError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            UnderquotedError::InvalidInput(_) => 3,
            UnderquotedError::Platform(PlatformError::Authentication(_)) => 2,
            UnderquotedError::Platform(_) => 1,
            UnderquotedError::Config(_) => 1,
            UnderquotedError::Cursor(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("Cursor store operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Unexpected response: {0}")]
    Parse(String),
}
