//! NetApp operations implementation
//!
//! The narrow ARM surface the deleter needs: list the account hierarchy,
//! inspect a resource group, delete by id and check existence.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::models::{
    ArmResource, Backup, BackupVault, CapacityPool, NetAppAccount, ResourceId, Volume,
    NETAPP_API_VERSION, RESOURCES_API_VERSION,
};
use crate::arm::client::ArmClient;
use crate::error::Result;

/// Trait for NetApp and resource group operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetAppOperations: Send + Sync {
    /// List every NetApp account in the subscription (children not populated)
    async fn list_accounts(&self) -> Result<Vec<NetAppAccount>>;

    async fn list_capacity_pools(&self, account: &ResourceId) -> Result<Vec<CapacityPool>>;

    async fn list_volumes(&self, pool: &ResourceId) -> Result<Vec<Volume>>;

    async fn list_backup_vaults(&self, account: &ResourceId) -> Result<Vec<BackupVault>>;

    async fn list_backups(&self, vault: &ResourceId) -> Result<Vec<Backup>>;

    /// Ids of every resource still inside a resource group
    async fn list_resource_group_resources(
        &self,
        resource_group: &ResourceId,
    ) -> Result<Vec<ResourceId>>;

    /// Delete a resource and wait for ARM to acknowledge completion
    async fn delete_by_id(&self, id: &ResourceId) -> Result<()>;

    async fn exists(&self, id: &ResourceId) -> Result<bool>;
}

/// Azure NetApp operations backed by the ARM REST API
pub struct AzureNetAppOperations {
    client: Arc<ArmClient>,
    subscription_id: String,
}

impl AzureNetAppOperations {
    pub fn new(client: Arc<ArmClient>, subscription_id: String) -> Self {
        Self {
            client,
            subscription_id,
        }
    }

    async fn list_children<T, F>(&self, parent: &ResourceId, collection: &str, build: F) -> Result<Vec<T>>
    where
        F: Fn(ResourceId) -> Result<T>,
    {
        let path = parent.child_collection(collection);
        let resources: Vec<ArmResource> = self.client.list(&path, NETAPP_API_VERSION).await?;
        debug!("Found {} {} under {}", resources.len(), collection, parent.name());

        resources
            .iter()
            .map(|resource| resource.resource_id().and_then(&build))
            .collect()
    }
}

#[async_trait]
impl NetAppOperations for AzureNetAppOperations {
    async fn list_accounts(&self) -> Result<Vec<NetAppAccount>> {
        let path = format!(
            "/subscriptions/{}/providers/Microsoft.NetApp/netAppAccounts",
            self.subscription_id
        );
        let resources: Vec<ArmResource> = self.client.list(&path, NETAPP_API_VERSION).await?;

        resources
            .into_iter()
            .map(|resource| {
                let id = resource.resource_id()?;
                NetAppAccount::from_id(id, resource.location)
            })
            .collect()
    }

    async fn list_capacity_pools(&self, account: &ResourceId) -> Result<Vec<CapacityPool>> {
        self.list_children(account, "capacityPools", CapacityPool::from_id)
            .await
    }

    async fn list_volumes(&self, pool: &ResourceId) -> Result<Vec<Volume>> {
        self.list_children(pool, "volumes", Volume::from_id).await
    }

    async fn list_backup_vaults(&self, account: &ResourceId) -> Result<Vec<BackupVault>> {
        self.list_children(account, "backupVaults", BackupVault::from_id)
            .await
    }

    async fn list_backups(&self, vault: &ResourceId) -> Result<Vec<Backup>> {
        self.list_children(vault, "backups", Backup::from_id).await
    }

    async fn list_resource_group_resources(
        &self,
        resource_group: &ResourceId,
    ) -> Result<Vec<ResourceId>> {
        let path = resource_group.child_collection("resources");
        let resources: Vec<ArmResource> = self.client.list(&path, RESOURCES_API_VERSION).await?;

        Ok(resources
            .iter()
            .filter_map(|resource| match resource.resource_id() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Skipping unrecognised resource in {}: {}", resource_group.name(), e);
                    None
                }
            })
            .collect())
    }

    async fn delete_by_id(&self, id: &ResourceId) -> Result<()> {
        debug!("Deleting {} {}", id.kind(), id);
        self.client
            .delete_and_wait(id.as_str(), id.kind().api_version())
            .await
    }

    async fn exists(&self, id: &ResourceId) -> Result<bool> {
        self.client.exists(id.as_str(), id.kind().api_version()).await
    }
}
