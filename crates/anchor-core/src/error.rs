//! Core error types for anchor-core.
//!
//! This module defines the error hierarchy using thiserror. Errors are
//! grouped by the collaborator that raised them: identity, the persistence
//! gateway, configuration, and input validation at construction boundaries.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for anchor-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Identity / authentication errors
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session state errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a persistence gateway implementation.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport-level failure talking to the backend
    #[error("Request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Backend answered with a non-success status
    #[error("Backend returned {status} for {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Failed to open the local database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Local query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Local database is locked
    #[error("Database is locked")]
    Locked,

    /// Invalid backend URL
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Identity-provider errors.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// No authenticated user
    #[error("Not signed in")]
    NotSignedIn,

    /// Sign-in / sign-up rejected by the identity provider
    #[error("Authentication rejected: {0}")]
    Rejected(String),

    /// Session could not be stored or loaded from the OS keyring
    #[error("Credential store error: {0}")]
    CredentialStore(String),

    /// Underlying transport failure
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors raised by the session state container.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Another check-in submission has not finished yet
    #[error("A check-in submission is already in progress")]
    SubmissionInProgress,

    /// Operation needs a signed-in user
    #[error("Not signed in")]
    NotSignedIn,

    /// The backend has no profile row for the signed-in user
    #[error("No profile found for user {0}")]
    ProfileMissing(String),

    /// The profile has no display name yet
    #[error("Finish onboarding first: choose a display name")]
    OnboardingRequired,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Rating outside the 1..=5 scale
    #[error("{field} must be between 1 and 5, got {value}")]
    RatingOutOfRange { field: &'static str, value: i64 },

    /// Empty value where text is required
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Unknown identifier for a static catalog
    #[error("Unknown {kind}: {id}")]
    UnknownId { kind: &'static str, id: String },
}

impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    GatewayError::Locked
                } else {
                    GatewayError::QueryFailed(err.to_string())
                }
            }
            _ => GatewayError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Gateway(err.into())
    }
}

impl From<keyring::Error> for IdentityError {
    fn from(err: keyring::Error) -> Self {
        IdentityError::CredentialStore(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
