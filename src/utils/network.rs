use crate::error::{NetappDeleterError, Result};
use reqwest::Client;
use std::time::Duration;

/// Configuration for HTTP client with proper timeouts
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("netapp-deleter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| NetappDeleterError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Map a transport-level reqwest failure onto a user-facing error
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> NetappDeleterError {
    let host = extract_host_from_url(url);

    if error.is_timeout() {
        return NetappDeleterError::connection_timeout(format!(
            "Request to '{}' timed out. This might be due to network issues or throttling on the Azure side.",
            host
        ));
    }

    if error.is_connect() {
        if error
            .to_string()
            .to_lowercase()
            .contains("connection refused")
        {
            return NetappDeleterError::connection_refused(format!(
                "Connection to '{}' was refused. The service may be temporarily unavailable.",
                host
            ));
        }

        return NetappDeleterError::network(format!(
            "Failed to connect to '{}'. Please check your network connection and proxy settings.",
            host
        ));
    }

    let lowered = error.to_string().to_lowercase();
    if lowered.contains("ssl") || lowered.contains("tls") || lowered.contains("certificate") {
        return NetappDeleterError::ssl_error(format!(
            "SSL/TLS error when contacting '{}'. This may be due to certificate issues or network security policies.",
            host
        ));
    }

    if let Some(status) = error.status() {
        match status.as_u16() {
            503 => {
                return NetappDeleterError::network(format!(
                    "'{}' is temporarily unavailable (503). Please try again later.",
                    host
                ))
            }
            502 | 504 => {
                return NetappDeleterError::network(format!(
                    "Gateway error ({}) when contacting '{}'.",
                    status.as_u16(),
                    host
                ))
            }
            _ => {}
        }
    }

    NetappDeleterError::network(format!("Network error when contacting '{}': {}", host, error))
}

fn extract_host_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "unknown-host".to_string())
}

/// Check if an error is worth retrying
pub fn is_retryable_error(error: &NetappDeleterError) -> bool {
    match error {
        NetappDeleterError::ConnectionTimeout(_) => true,
        NetappDeleterError::Throttled { .. } => true,
        NetappDeleterError::NetworkError(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("timeout")
                || msg_lower.contains("temporar")
                || msg_lower.contains("503")
                || msg_lower.contains("502")
                || msg_lower.contains("504")
        }
        NetappDeleterError::AzureApiError(msg) => {
            let msg_lower = msg.to_lowercase();
            msg_lower.contains("http 429")
                || msg_lower.contains("http 500")
                || msg_lower.contains("http 502")
                || msg_lower.contains("http 503")
                || msg_lower.contains("http 504")
                || msg_lower.contains("throttl")
        }
        NetappDeleterError::ConnectionRefused(_) => false,
        NetappDeleterError::SslError(_) => false,
        _ => false,
    }
}
