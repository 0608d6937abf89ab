//! Bulk NetApp account deletion
//!
//! Enumerate everything first, ask once, then hand each account to the
//! worker pool.

pub mod coordinator;
pub mod enumerator;
pub mod report;
pub mod sequencer;

pub use coordinator::WorkerPoolCoordinator;
pub use enumerator::ResourceEnumerator;
pub use report::*;
pub use sequencer::{DeletionSequencer, SequencerPolicy};

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::netapp::models::NetAppAccount;
use crate::netapp::operations::NetAppOperations;
use crate::utils::interactive::ConfirmationPrompt;

#[derive(Debug, Clone)]
pub struct DeletionOptions {
    pub workers: usize,
    pub skip_confirmation: bool,
    pub dry_run: bool,
    pub policy: SequencerPolicy,
}

impl DeletionOptions {
    pub fn from_config(config: &Config, skip_confirmation: bool, dry_run: bool) -> Self {
        Self {
            workers: config.workers,
            skip_confirmation,
            dry_run,
            policy: SequencerPolicy {
                account_delete_attempts: config.account_delete_attempts,
                account_retry_delay: config.account_retry_delay(),
                delete_resource_groups: config.delete_resource_groups,
            },
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    NothingToDelete,
    DryRun(Vec<NetAppAccount>),
    Cancelled,
    Completed(DeletionReport),
}

pub struct DeletionRun {
    ops: Arc<dyn NetAppOperations>,
    options: DeletionOptions,
}

impl DeletionRun {
    pub fn new(ops: Arc<dyn NetAppOperations>, options: DeletionOptions) -> Self {
        Self { ops, options }
    }

    /// `preview` sees the enumerated accounts before the prompt is shown
    pub async fn run<P>(&self, prompt: &dyn ConfirmationPrompt, preview: P) -> Result<RunOutcome>
    where
        P: FnOnce(&[NetAppAccount]) -> Result<()>,
    {
        let coordinator = WorkerPoolCoordinator::new(
            Arc::new(DeletionSequencer::new(
                self.ops.clone(),
                self.options.policy.clone(),
            )),
            self.options.workers,
        )?;

        let accounts = ResourceEnumerator::new(self.ops.clone(), self.options.workers)
            .enumerate()
            .await?;

        if accounts.is_empty() {
            info!("No NetApp accounts found in subscription");
            return Ok(RunOutcome::NothingToDelete);
        }

        info!("Found {} NetApp accounts", accounts.len());
        preview(&accounts)?;

        if self.options.dry_run {
            info!("Dry run: nothing was deleted");
            return Ok(RunOutcome::DryRun(accounts));
        }

        if !self.options.skip_confirmation {
            let message = format!(
                "This will delete all {} NetApp accounts in your subscription. Are you sure you want to proceed?",
                accounts.len()
            );
            if !prompt.confirm(&message)? {
                info!("Operation cancelled by user");
                return Ok(RunOutcome::Cancelled);
            }
        }

        Ok(RunOutcome::Completed(coordinator.run(accounts).await))
    }
}
