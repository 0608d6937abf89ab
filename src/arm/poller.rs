//! Long-running operation tracking for ARM deletes
//!
//! A DELETE accepted with 201/202 hands back either an
//! `Azure-AsyncOperation` status URL or a `Location` URL. When neither is
//! present the resource itself is polled until it returns 404.

use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PollingOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(3600),
        }
    }
}

/// Where to look for completion of an accepted operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationMonitor {
    AsyncOperation(String),
    Location(String),
    Resource(String),
}

impl OperationMonitor {
    /// `Azure-AsyncOperation` wins over `Location` per ARM guidance
    pub fn select(
        async_operation: Option<String>,
        location: Option<String>,
        resource_url: &str,
    ) -> Self {
        match (async_operation, location) {
            (Some(url), _) => Self::AsyncOperation(url),
            (None, Some(url)) => Self::Location(url),
            (None, None) => Self::Resource(resource_url.to_string()),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::AsyncOperation(url) | Self::Location(url) | Self::Resource(url) => url,
        }
    }

    /// Interpret one poll response. `body` is only consulted for the
    /// async-operation status document.
    pub fn interpret(&self, status: u16, body: &str) -> PollOutcome {
        match self {
            Self::AsyncOperation(_) => {
                if !(200..300).contains(&status) {
                    return PollOutcome::UnexpectedStatus(status);
                }
                match serde_json::from_str::<Value>(body) {
                    Ok(document) => match OperationStatus::from_body(&document) {
                        OperationStatus::Succeeded => PollOutcome::Done,
                        OperationStatus::InProgress => PollOutcome::Pending,
                        OperationStatus::Failed(message) => PollOutcome::Failed(message),
                        OperationStatus::Canceled => {
                            PollOutcome::Failed("operation was canceled".to_string())
                        }
                    },
                    Err(_) => PollOutcome::Pending,
                }
            }
            Self::Location(_) => match status {
                202 => PollOutcome::Pending,
                200 | 204 | 404 => PollOutcome::Done,
                other => PollOutcome::UnexpectedStatus(other),
            },
            Self::Resource(_) => match status {
                404 => PollOutcome::Done,
                200..=299 => PollOutcome::Pending,
                other => PollOutcome::UnexpectedStatus(other),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Pending,
    Done,
    Failed(String),
    UnexpectedStatus(u16),
}

/// Status field of an `Azure-AsyncOperation` document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed(String),
    Canceled,
}

impl OperationStatus {
    pub fn from_body(body: &Value) -> Self {
        let status = body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_lowercase();

        match status.as_str() {
            "succeeded" => Self::Succeeded,
            "canceled" | "cancelled" => Self::Canceled,
            "failed" => {
                let error = body.get("error");
                let code = error
                    .and_then(|e| e.get("code"))
                    .and_then(|c| c.as_str())
                    .unwrap_or("OperationFailed");
                let message = error
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .unwrap_or("no error details returned");
                Self::Failed(format!("{code}: {message}"))
            }
            _ => Self::InProgress,
        }
    }
}

/// `Retry-After` in whole seconds; HTTP-date values are ignored
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
