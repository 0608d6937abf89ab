//! Subscription-scoped session bootstrap
//!
//! Builds the credential and ARM client, then settles on the subscription
//! to operate on.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::provider::AuthProviderFactory;
use crate::arm::client::ArmClient;
use crate::arm::poller::PollingOptions;
use crate::config::Config;
use crate::error::{NetappDeleterError, Result};
use crate::netapp::models::SUBSCRIPTIONS_API_VERSION;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub subscription_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub state: String,
}

impl SubscriptionInfo {
    fn is_enabled(&self) -> bool {
        self.state.eq_ignore_ascii_case("enabled")
    }
}

/// Authenticated ARM client bound to one subscription
pub struct AzureSession {
    pub subscription_id: String,
    pub client: Arc<ArmClient>,
}

impl AzureSession {
    pub async fn establish(config: &Config) -> Result<Self> {
        let auth_provider = AuthProviderFactory::create_provider(config)?;
        let polling = PollingOptions {
            interval: config.poll_interval(),
            timeout: config.operation_timeout(),
        };
        let client = Arc::new(ArmClient::new(auth_provider, &config.arm_endpoint, polling)?);

        let subscription_id = if config.subscription_id.is_empty() {
            let subscriptions: Vec<SubscriptionInfo> = client
                .list("/subscriptions", SUBSCRIPTIONS_API_VERSION)
                .await
                .map_err(|e| match e {
                    NetappDeleterError::AuthenticationError(_) => e,
                    other => NetappDeleterError::authentication(format!(
                        "Failed to list subscriptions: {other}"
                    )),
                })?;
            choose_subscription(&subscriptions)?.subscription_id.clone()
        } else {
            config.subscription_id.clone()
        };

        info!("Using subscription {}", subscription_id);
        Ok(Self {
            subscription_id,
            client,
        })
    }
}

/// The only subscription, else the first enabled one, else the first one
pub fn choose_subscription(subscriptions: &[SubscriptionInfo]) -> Result<&SubscriptionInfo> {
    let first = subscriptions.first().ok_or_else(|| {
        NetappDeleterError::authentication(
            "No subscriptions found. Please ensure you have access to at least one subscription.",
        )
    })?;

    if subscriptions.len() == 1 {
        return Ok(first);
    }

    let chosen = subscriptions
        .iter()
        .find(|s| s.is_enabled())
        .unwrap_or(first);
    warn!(
        "{} subscriptions are visible; using '{}' ({}). Pass --subscription to pick another.",
        subscriptions.len(),
        chosen.display_name,
        chosen.subscription_id
    );
    Ok(chosen)
}
