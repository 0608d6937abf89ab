//! Authentication provider trait and implementations
//!
//! Token acquisition for Azure Resource Manager through azure_identity.

use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_identity::{ClientSecretCredential, DefaultAzureCredential, TokenCredentialOptions};
use std::sync::Arc;
use tracing::debug;

use crate::config::{AzureCredentialType, Config};
use crate::error::{NetappDeleterError, Result};

const AZURE_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Trait for Azure authentication providers
#[async_trait]
pub trait AzureAuthProvider: Send + Sync {
    /// Get an access token for the specified scopes
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;
}

/// Default Azure Credential Provider using DefaultAzureCredential
pub struct DefaultAzureCredentialProvider {
    credential: Arc<DefaultAzureCredential>,
}

impl DefaultAzureCredentialProvider {
    pub fn new() -> Result<Self> {
        let credential = Arc::new(
            DefaultAzureCredential::create(TokenCredentialOptions::default()).map_err(|e| {
                NetappDeleterError::authentication(format!(
                    "Failed to create DefaultAzureCredential: {}",
                    e
                ))
            })?,
        );

        Ok(Self { credential })
    }
}

#[async_trait]
impl AzureAuthProvider for DefaultAzureCredentialProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| NetappDeleterError::authentication(format!("Failed to get token: {}", e)))
    }
}

/// Client Secret Authentication Provider
pub struct ClientSecretProvider {
    credential: Arc<ClientSecretCredential>,
}

impl ClientSecretProvider {
    pub fn new(tenant_id: String, client_id: String, client_secret: String) -> Result<Self> {
        let authority_url = url::Url::parse(AZURE_AUTHORITY_HOST)
            .map_err(|e| NetappDeleterError::config(format!("Invalid authority URL: {}", e)))?;

        let credential = Arc::new(ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority_url,
            tenant_id,
            client_id,
            client_secret,
        ));

        Ok(Self { credential })
    }
}

#[async_trait]
impl AzureAuthProvider for ClientSecretProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        self.credential
            .get_token(scopes)
            .await
            .map_err(|e| NetappDeleterError::authentication(format!("Failed to get token: {}", e)))
    }
}

/// Authentication provider factory
pub struct AuthProviderFactory;

impl AuthProviderFactory {
    /// Create an authentication provider based on configuration
    pub fn create_provider(config: &Config) -> Result<Arc<dyn AzureAuthProvider>> {
        match config.credential_type {
            AzureCredentialType::Default => {
                debug!("Using DefaultAzureCredential");
                Ok(Arc::new(DefaultAzureCredentialProvider::new()?))
            }
            AzureCredentialType::ClientSecret => {
                debug!("Using client secret credential for client {}", config.client_id);
                Ok(Arc::new(ClientSecretProvider::new(
                    config.tenant_id.clone(),
                    config.client_id.clone(),
                    config.client_secret.clone(),
                )?))
            }
        }
    }
}
