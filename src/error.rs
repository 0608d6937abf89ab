use std::time::Duration;
use thiserror::Error;

/// Main error type for netapp-deleter operations
#[derive(Debug, Error)]
pub enum NetappDeleterError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    /// 429 (or a 5xx carrying `Retry-After`); the server says when to come back
    #[error("Azure API error: {message}")]
    Throttled {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to enumerate {what}: {details}")]
    EnumerationError { what: String, details: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Resource '{resource}' still exists after deletion")]
    ResourceStillExists { resource: String },

    #[error("Invalid resource ID '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("SSL/TLS error: {0}")]
    SslError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("{failed} of {total} NetApp accounts could not be deleted")]
    PartialFailure { failed: usize, total: usize },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl NetappDeleterError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn throttled<S: Into<String>>(message: S, retry_after: Option<Duration>) -> Self {
        Self::Throttled {
            message: message.into(),
            retry_after,
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn enumeration<W: Into<String>, D: std::fmt::Display>(what: W, details: D) -> Self {
        Self::EnumerationError {
            what: what.into(),
            details: details.to_string(),
        }
    }

    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn still_exists<S: Into<String>>(resource: S) -> Self {
        Self::ResourceStillExists {
            resource: resource.into(),
        }
    }

    pub fn invalid_resource_id<S: Into<String>, R: Into<String>>(id: S, reason: R) -> Self {
        Self::InvalidResourceId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn connection_timeout<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionTimeout(msg.into())
    }

    pub fn connection_refused<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionRefused(msg.into())
    }

    pub fn ssl_error<S: Into<String>>(msg: S) -> Self {
        Self::SslError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn unknown<S: Into<String>>(msg: S) -> Self {
        Self::Unknown(msg.into())
    }

    /// True when ARM refused a delete because child resources are still
    /// being torn down behind the parent.
    pub fn is_nested_resource_conflict(&self) -> bool {
        match self {
            Self::AzureApiError(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("nested resources exist") || msg.contains("nestedresourcesexist")
            }
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Server-requested wait before the next attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Throttled { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for netapp-deleter operations
pub type Result<T> = std::result::Result<T, NetappDeleterError>;

/// Convert Azure Core errors to NetappDeleterError
impl From<azure_core::Error> for NetappDeleterError {
    fn from(error: azure_core::Error) -> Self {
        Self::AzureApiError(error.to_string())
    }
}

impl From<toml::de::Error> for NetappDeleterError {
    fn from(error: toml::de::Error) -> Self {
        Self::ConfigError(format!("Invalid configuration file: {error}"))
    }
}
