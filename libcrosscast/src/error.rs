//! Error types for Crosscast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrosscastError>;

#[derive(Error, Debug)]
pub enum CrosscastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CrosscastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CrosscastError::InvalidInput(_) => 3,
            CrosscastError::Validation(_) => 3,
            CrosscastError::Platform(PlatformError::Authentication(_)) => 2,
            CrosscastError::Platform(_) => 1,
            CrosscastError::Config(_) => 1,
            CrosscastError::Database(_) => 1,
            CrosscastError::Account(_) => 1,
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

/// Persistence failures. Recording a post that already went out never
/// revokes its published status; these only surface in logs and events.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised by an external platform API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request rejected: {0}")]
    Validation(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
}

/// Local precondition failures detected before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("account is not connected")]
    NotConnected,

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("unsupported media: {0}")]
    UnsupportedMediaForPlatform(String),

    #[error("media file unavailable: {0}")]
    MediaUnavailable(String),
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Failed to read account file: {0}")]
    StateFile(String),

    #[error("Failed to parse account file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write account file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Account '{0}' not found for platform '{1}'")]
    NotFound(String, String),

    #[error("Invalid account '{0}': {1}")]
    Invalid(String, String),
}
