//! Resource enumeration
//!
//! Builds the full account tree before anything is deleted. Any listing
//! failure aborts the run.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{NetappDeleterError, Result};
use crate::netapp::models::NetAppAccount;
use crate::netapp::operations::NetAppOperations;

pub struct ResourceEnumerator {
    ops: Arc<dyn NetAppOperations>,
    concurrency: usize,
}

impl ResourceEnumerator {
    /// `concurrency` bounds how many accounts are listed at once
    pub fn new(ops: Arc<dyn NetAppOperations>, concurrency: usize) -> Self {
        Self {
            ops,
            concurrency: concurrency.max(1),
        }
    }

    /// Accounts sorted by name, each with pools, volumes, vaults and backups
    pub async fn enumerate(&self) -> Result<Vec<NetAppAccount>> {
        info!("Listing all NetApp accounts in subscription...");
        let accounts = self
            .ops
            .list_accounts()
            .await
            .map_err(|e| NetappDeleterError::enumeration("NetApp accounts", e))?;

        let mut accounts: Vec<NetAppAccount> = stream::iter(accounts)
            .map(|account| self.populate(account))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    async fn populate(&self, mut account: NetAppAccount) -> Result<NetAppAccount> {
        let mut pools = self
            .ops
            .list_capacity_pools(&account.id)
            .await
            .map_err(|e| {
                NetappDeleterError::enumeration(
                    format!("capacity pools of '{}'", account.name),
                    e,
                )
            })?;

        for pool in pools.iter_mut() {
            pool.volumes = self.ops.list_volumes(&pool.id).await.map_err(|e| {
                NetappDeleterError::enumeration(format!("volumes in pool '{}'", pool.name), e)
            })?;
        }

        let mut vaults = self
            .ops
            .list_backup_vaults(&account.id)
            .await
            .map_err(|e| {
                NetappDeleterError::enumeration(format!("backup vaults of '{}'", account.name), e)
            })?;

        for vault in vaults.iter_mut() {
            vault.backups = self.ops.list_backups(&vault.id).await.map_err(|e| {
                NetappDeleterError::enumeration(format!("backups in vault '{}'", vault.name), e)
            })?;
        }

        account.capacity_pools = pools;
        account.backup_vaults = vaults;

        debug!(
            "Account '{}': {} pools, {} volumes, {} vaults, {} backups",
            account.name,
            account.capacity_pools.len(),
            account.volume_count(),
            account.backup_vaults.len(),
            account.backup_count()
        );

        Ok(account)
    }
}
