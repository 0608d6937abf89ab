//! Azure Resource Manager REST client
//!
//! Thin wrapper over reqwest that adds bearer authentication, error
//! envelope parsing, `nextLink` paging and long-running delete polling.

use reqwest::{header::HeaderMap, Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};
use uuid::Uuid;

use super::poller::{parse_retry_after, OperationMonitor, PollOutcome, PollingOptions};
use crate::auth::provider::AzureAuthProvider;
use crate::error::{NetappDeleterError, Result};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};
use crate::utils::retry::{retry_with_backoff, RetryOptions};

/// One page of an ARM list response
#[derive(Debug, Deserialize)]
pub struct ArmPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "nextLink")]
    pub next_link: Option<String>,
}

/// Status, polling headers and body of a single ARM response
#[derive(Debug)]
struct RawResponse {
    status: u16,
    async_operation: Option<String>,
    location: Option<String>,
    retry_after: Option<Duration>,
    body: String,
}

pub struct ArmClient {
    auth_provider: Arc<dyn AzureAuthProvider>,
    http_client: Client,
    endpoint: String,
    polling: PollingOptions,
    retry: RetryOptions,
}

impl ArmClient {
    pub fn new(
        auth_provider: Arc<dyn AzureAuthProvider>,
        endpoint: &str,
        polling: PollingOptions,
    ) -> Result<Self> {
        let http_client = create_http_client(&NetworkConfig::default())?;

        Ok(Self {
            auth_provider,
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            polling,
            retry: RetryOptions::default(),
        })
    }

    /// Token scope for the configured management endpoint
    fn scope(&self) -> String {
        format!("{}/.default", self.endpoint)
    }

    async fn create_headers(&self) -> Result<HeaderMap> {
        let scope = self.scope();
        let token = self.auth_provider.get_token(&[scope.as_str()]).await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", token.token.secret())
                .parse()
                .map_err(|e| {
                    NetappDeleterError::authentication(format!("Invalid token format: {}", e))
                })?,
        );
        headers.insert(
            "x-ms-client-request-id",
            Uuid::new_v4()
                .to_string()
                .parse()
                .map_err(|e| NetappDeleterError::unknown(format!("Invalid request id: {}", e)))?,
        );
        Ok(headers)
    }

    pub fn build_url(&self, path: &str, api_version: &str) -> String {
        build_arm_url(&self.endpoint, path, api_version)
    }

    /// Send one request. Throttling and server errors come back as `Err` so
    /// the retry wrapper can see them; every other status is returned as-is.
    async fn send(&self, method: Method, url: &str) -> Result<RawResponse> {
        if !same_origin(url, &self.endpoint) {
            return Err(NetappDeleterError::invalid_argument(format!(
                "refusing to send credentials to {}: not the ARM endpoint {}",
                url, self.endpoint
            )));
        }
        let headers = self.create_headers().await?;
        trace!("{} {}", method, url);

        let response = self
            .http_client
            .request(method, url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url))?;

        let status = response.status().as_u16();
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        let async_operation = header("azure-asyncoperation");
        let location = header("location");
        let retry_after = parse_retry_after(header("retry-after").as_deref());
        let body = response.text().await.unwrap_or_default();

        if status == 429 || (status >= 500 && retry_after.is_some()) {
            return Err(NetappDeleterError::throttled(
                azure_error_message(status, &body),
                retry_after,
            ));
        }
        if status >= 500 {
            return Err(parse_azure_error(status, &body));
        }

        Ok(RawResponse {
            status,
            async_operation,
            location,
            retry_after,
            body,
        })
    }

    async fn send_with_retry(&self, method: Method, url: &str) -> Result<RawResponse> {
        retry_with_backoff(|| self.send(method.clone(), url), self.retry.clone()).await
    }

    /// GET a resource as JSON; 404 maps to `NotFound`
    pub async fn get_json(&self, path: &str, api_version: &str) -> Result<Value> {
        let url = self.build_url(path, api_version);
        let response = self.send_with_retry(Method::GET, &url).await?;

        match response.status {
            404 => Err(NetappDeleterError::not_found(path)),
            200..=299 => serde_json::from_str(&response.body).map_err(|e| {
                NetappDeleterError::serialization(format!("Failed to parse response from {}: {}", path, e))
            }),
            status => Err(parse_azure_error(status, &response.body)),
        }
    }

    /// List every item of a collection, following `nextLink`
    pub async fn list<T: DeserializeOwned>(&self, path: &str, api_version: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(self.build_url(path, api_version));

        while let Some(url) = next {
            let response = self.send_with_retry(Method::GET, &url).await?;
            match response.status {
                404 => return Err(NetappDeleterError::not_found(path)),
                200..=299 => {}
                status => return Err(parse_azure_error(status, &response.body)),
            }

            let page: ArmPage<T> = serde_json::from_str(&response.body).map_err(|e| {
                NetappDeleterError::serialization(format!("Failed to parse page of {}: {}", path, e))
            })?;
            items.extend(page.value);
            next = page.next_link.filter(|link| !link.is_empty());
        }

        Ok(items)
    }

    pub async fn exists(&self, path: &str, api_version: &str) -> Result<bool> {
        match self.get_json(path, api_version).await {
            Ok(_) => Ok(true),
            Err(NetappDeleterError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Issue a DELETE and block until ARM reports the operation finished.
    /// A resource that is already gone counts as deleted.
    pub async fn delete_and_wait(&self, path: &str, api_version: &str) -> Result<()> {
        let url = self.build_url(path, api_version);
        let response = self.send_with_retry(Method::DELETE, &url).await?;

        match response.status {
            200 | 204 => Ok(()),
            404 => {
                debug!("{} was already deleted", path);
                Ok(())
            }
            201 | 202 => {
                let monitor =
                    OperationMonitor::select(response.async_operation, response.location, &url);
                self.wait_for_operation(path, monitor, response.retry_after)
                    .await
            }
            status => Err(parse_azure_error(status, &response.body)),
        }
    }

    async fn wait_for_operation(
        &self,
        path: &str,
        monitor: OperationMonitor,
        retry_after: Option<Duration>,
    ) -> Result<()> {
        let deadline = Instant::now() + self.polling.timeout;
        let mut delay = retry_after.unwrap_or(self.polling.interval);

        loop {
            if Instant::now() + delay > deadline {
                return Err(NetappDeleterError::timeout(format!(
                    "deletion of {} did not finish within {:?}",
                    path, self.polling.timeout
                )));
            }
            sleep(delay).await;

            let response = self.send_with_retry(Method::GET, monitor.url()).await?;
            match monitor.interpret(response.status, &response.body) {
                PollOutcome::Done => {
                    debug!("Deletion of {} completed", path);
                    return Ok(());
                }
                PollOutcome::Pending => {
                    trace!("Deletion of {} still in progress", path);
                }
                PollOutcome::Failed(message) => {
                    return Err(NetappDeleterError::azure_api(format!(
                        "Deletion of {} failed: {}",
                        path, message
                    )));
                }
                PollOutcome::UnexpectedStatus(status) => {
                    return Err(parse_azure_error(status, &response.body));
                }
            }

            delay = response.retry_after.unwrap_or(self.polling.interval);
        }
    }
}

/// Absolute URLs (e.g. `nextLink`) pass through untouched
pub fn build_arm_url(endpoint: &str, path: &str, api_version: &str) -> String {
    if path.starts_with("https://") || path.starts_with("http://") {
        return path.to_string();
    }
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}api-version={}", endpoint, path, separator, api_version)
}

/// Scheme, host and port must match the endpoint before a bearer token is
/// attached; `nextLink` and polling URLs come from the server.
pub fn same_origin(url: &str, endpoint: &str) -> bool {
    match (url::Url::parse(url), url::Url::parse(endpoint)) {
        (Ok(target), Ok(endpoint)) => {
            target.scheme() == endpoint.scheme()
                && target.host_str() == endpoint.host_str()
                && target.port_or_known_default() == endpoint.port_or_known_default()
        }
        _ => false,
    }
}

/// Parse the ARM error envelope `{"error": {"code", "message"}}`
pub fn parse_azure_error(status: u16, body: &str) -> NetappDeleterError {
    NetappDeleterError::azure_api(azure_error_message(status, body))
}

fn azure_error_message(status: u16, body: &str) -> String {
    if let Ok(error_json) = serde_json::from_str::<Value>(body) {
        if let Some(error) = error_json.get("error") {
            let code = error.get("code").and_then(|c| c.as_str());
            if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
                return match code {
                    Some(code) => format!("HTTP {} {}: {}", status, code, message),
                    None => format!("HTTP {}: {}", status, message),
                };
            }
        }
    }
    format!("HTTP {}: {}", status, body)
}
