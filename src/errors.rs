//! Error types for the DTS client
//!
//! Errors are split by who is at fault. Usage and value errors describe caller
//! misuse and are raised before any request leaves the client. Service errors
//! describe everything that can go wrong once a request is on the wire; they are
//! the only recoverable class, and [`crate::app::classify::Recover`] can turn
//! them into empty results.

use std::path::PathBuf;
use thiserror::Error;

/// Caller misuse: wrong shape or kind of argument, or a client in the wrong state
#[derive(Error, Debug)]
pub enum UsageError {
    /// A lifecycle operation was called before `connect`
    #[error("dts client: not connected")]
    NotConnected,

    /// A required string argument was empty
    #[error("{operation}: {field} must be a non-empty string")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    /// Query was neither a string nor a number
    #[error("{operation}: query must be a string or a number, got {found}")]
    InvalidQuery {
        operation: &'static str,
        found: &'static str,
    },

    /// Status filter outside the supported set
    #[error("{operation}: invalid status: {value} (expected \"staged\" or \"unstaged\")")]
    InvalidStatus {
        operation: &'static str,
        value: String,
    },

    /// A pass-through parameter map was not a JSON object
    #[error("{operation}: {field} must be a JSON object, got {found}")]
    NotAnObject {
        operation: &'static str,
        field: &'static str,
        found: &'static str,
    },

    /// No file identifiers were supplied
    #[error("{operation}: missing or empty list of file IDs")]
    EmptyFileIds { operation: &'static str },

    /// Transfer handle is not a UUID
    #[error("invalid transfer handle: {value}")]
    InvalidHandle { value: String },

    /// Server address could not be parsed
    #[error("invalid server address: {address} - {reason}")]
    InvalidServer { address: String, reason: String },
}

/// Caller misuse: right kind of value, out of range
#[derive(Error, Debug)]
pub enum ValueError {
    /// Pagination offset below zero
    #[error("{operation}: offset must be non-negative, got {offset}")]
    NegativeOffset { operation: &'static str, offset: i64 },

    /// Pagination limit below one
    #[error("{operation}: limit must be at least 1, got {limit}")]
    LimitTooSmall { operation: &'static str, limit: i64 },

    /// Request timeout of zero
    #[error("{operation}: timeout must be greater than zero")]
    ZeroTimeout { operation: &'static str },
}

/// Failures reported by, or on the way to, the DTS service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Service answered with a non-success status
    #[error("DTS service error: HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Request never completed (connection refused, timeout, TLS, ...)
    #[error("DTS request failed")]
    Transport(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("Unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// Endpoint URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },
}

/// API key storage and verification errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// No API key available in the environment
    #[error(
        "Missing DTS API key. Set DTS_KBASE_DEV_TOKEN or run 'dts auth setup'"
    )]
    MissingApiKey,

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// API key rejected by the interactive prompt
    #[error("Invalid API key: {reason}")]
    InvalidApiKey { reason: String },

    /// File I/O error during credential storage
    #[error("Failed to save credentials to file")]
    CredentialStorage(#[from] std::io::Error),

    /// Permission error on credential file
    #[error("Permission denied accessing credential file: {path}")]
    PermissionDenied { path: PathBuf },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration could not be rendered
    #[error("Failed to render configuration")]
    Render(#[from] toml::ser::Error),

    /// Missing required configuration field
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Config directory could not be determined or written
    #[error("Configuration I/O error for {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

/// Top-level error that can represent any failure of the client
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller misuse (wrong kind or shape of argument)
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// Caller misuse (value out of range)
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Service or transport failure
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Credential error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (the service, not the caller, is at fault)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Service(_))
    }

    /// Whether the caller passed something the client refuses to send
    pub fn is_caller_misuse(&self) -> bool {
        matches!(self, AppError::Usage(_) | AppError::Value(_))
    }

    /// HTTP status reported by the service, if the failure carried one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::Service(ServiceError::Http { status, .. }) => Some(*status),
            AppError::Service(ServiceError::Transport(e)) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Usage(UsageError::NotConnected) => "connection",
            AppError::Usage(_) => "usage",
            AppError::Value(_) => "value",
            AppError::Service(_) => "service",
            AppError::Auth(_) => "authentication",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Service result type alias
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
