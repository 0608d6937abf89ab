//! Dependency-ordered teardown of a single NetApp account
//!
//! Stages run strictly one after another and each waits for every ARM
//! delete it issued. Deletes inside a stage are siblings and run together.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info};

use super::report::{AccountOutcome, AccountStatus, DeletionStage, ResourceGroupDisposition};
use crate::error::{NetappDeleterError, Result};
use crate::netapp::models::{NetAppAccount, ResourceId};
use crate::netapp::operations::NetAppOperations;

#[derive(Debug, Clone)]
pub struct SequencerPolicy {
    /// Total attempts for the account delete when ARM still sees children
    pub account_delete_attempts: u32,
    pub account_retry_delay: Duration,
    pub delete_resource_groups: bool,
}

impl Default for SequencerPolicy {
    fn default() -> Self {
        Self {
            account_delete_attempts: 3,
            account_retry_delay: Duration::from_secs(30),
            delete_resource_groups: true,
        }
    }
}

struct StageFailure {
    stage: DeletionStage,
    error: NetappDeleterError,
}

trait AtStage<T> {
    fn at(self, stage: DeletionStage) -> std::result::Result<T, StageFailure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: DeletionStage) -> std::result::Result<T, StageFailure> {
        self.map_err(|error| StageFailure { stage, error })
    }
}

pub struct DeletionSequencer {
    ops: Arc<dyn NetAppOperations>,
    policy: SequencerPolicy,
}

impl DeletionSequencer {
    pub fn new(ops: Arc<dyn NetAppOperations>, policy: SequencerPolicy) -> Self {
        Self { ops, policy }
    }

    /// Tear down one account. Never fails as a whole; the outcome says how
    /// far it got.
    pub async fn run(&self, account: &NetAppAccount) -> AccountOutcome {
        let started = Instant::now();
        let mut deleted = 0;

        info!("Deleting NetApp account '{}'...", account.name);
        let status = match self.execute(account, &mut deleted).await {
            Ok(resource_group) => {
                info!(
                    "Successfully deleted NetApp account '{}' ({})",
                    account.name, resource_group
                );
                AccountStatus::Deleted { resource_group }
            }
            Err(StageFailure { stage, error }) => {
                error!(
                    "Error processing NetApp account '{}' at stage '{}': {}",
                    account.name, stage, error
                );
                AccountStatus::Failed {
                    stage,
                    error: error.to_string(),
                }
            }
        };

        AccountOutcome {
            account: account.name.clone(),
            resource_group: account.resource_group.clone(),
            deleted_resources: deleted,
            status,
            elapsed: started.elapsed(),
        }
    }

    async fn execute(
        &self,
        account: &NetAppAccount,
        deleted: &mut usize,
    ) -> std::result::Result<ResourceGroupDisposition, StageFailure> {
        let backups: Vec<&ResourceId> = account
            .backup_vaults
            .iter()
            .flat_map(|vault| vault.backups.iter().map(|b| &b.id))
            .collect();
        self.delete_all(DeletionStage::Backups, &backups, deleted)
            .await?;

        let volumes: Vec<&ResourceId> = account
            .capacity_pools
            .iter()
            .flat_map(|pool| pool.volumes.iter().map(|v| &v.id))
            .collect();
        self.delete_all(DeletionStage::Volumes, &volumes, deleted)
            .await?;

        let containers: Vec<&ResourceId> = account
            .capacity_pools
            .iter()
            .map(|p| &p.id)
            .chain(account.backup_vaults.iter().map(|v| &v.id))
            .collect();
        self.delete_all(DeletionStage::PoolsAndVaults, &containers, deleted)
            .await?;

        for vault in &account.backup_vaults {
            self.verify_gone(&vault.id)
                .await
                .at(DeletionStage::PoolsAndVaults)?;
        }

        self.delete_account(&account.id)
            .await
            .at(DeletionStage::Account)?;
        *deleted += 1;

        self.cleanup_resource_group(account)
            .await
            .at(DeletionStage::ResourceGroup)
    }

    /// Delete siblings together and wait for all of them, even after one
    /// fails, so nothing is left mid-flight when the stage reports.
    async fn delete_all(
        &self,
        stage: DeletionStage,
        ids: &[&ResourceId],
        deleted: &mut usize,
    ) -> std::result::Result<(), StageFailure> {
        if ids.is_empty() {
            debug!("No {} to delete", stage);
            return Ok(());
        }

        info!("Deleting {} {}...", ids.len(), stage);
        let results = join_all(ids.iter().map(|id| async move {
            let result = self.ops.delete_by_id(id).await;
            (*id, result)
        }))
        .await;

        let mut first_error = None;
        for (id, result) in results {
            match result {
                Ok(()) => {
                    info!("Successfully deleted {} '{}'", id.kind(), id.name());
                    *deleted += 1;
                }
                Err(e) => {
                    error!("Error deleting {} '{}': {}", id.kind(), id.name(), e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(error) => Err(StageFailure { stage, error }),
            None => Ok(()),
        }
    }

    /// Vault deletes can report success while the account still references
    /// the vault; re-read it to be sure.
    async fn verify_gone(&self, id: &ResourceId) -> Result<()> {
        debug!("Verifying {} '{}' is gone", id.kind(), id.name());
        if self.ops.exists(id).await? {
            error!("{} '{}' still exists after deletion", id.kind(), id.name());
            return Err(NetappDeleterError::still_exists(id.as_str()));
        }
        Ok(())
    }

    async fn delete_account(&self, id: &ResourceId) -> Result<()> {
        let attempts = self.policy.account_delete_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.ops.delete_by_id(id).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_nested_resource_conflict() && attempt < attempts => {
                    info!(
                        "Account deletion failed due to nested resources, waiting {:?} before retry {}/{}...",
                        self.policy.account_retry_delay,
                        attempt,
                        attempts
                    );
                    sleep(self.policy.account_retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn cleanup_resource_group(
        &self,
        account: &NetAppAccount,
    ) -> Result<ResourceGroupDisposition> {
        if !self.policy.delete_resource_groups {
            return Ok(ResourceGroupDisposition::Skipped);
        }

        let group = account.id.resource_group_id();
        let resources = match self.ops.list_resource_group_resources(&group).await {
            Ok(resources) => resources,
            Err(e) if e.is_not_found() => {
                debug!("Resource group '{}' is already gone", group.name());
                return Ok(ResourceGroupDisposition::AlreadyGone);
            }
            Err(e) => return Err(e),
        };

        // ARM listings lag behind deletes; ignore what this account owned.
        let remaining = resources
            .iter()
            .filter(|id| !id.is_within(&account.id))
            .count();

        if remaining > 0 {
            info!(
                "Keeping resource group '{}': {} other resources remain",
                group.name(),
                remaining
            );
            return Ok(ResourceGroupDisposition::Kept { remaining });
        }

        info!("Deleting resource group '{}'...", group.name());
        self.ops.delete_by_id(&group).await?;
        info!("Successfully deleted resource group '{}'", group.name());
        Ok(ResourceGroupDisposition::Deleted)
    }
}
