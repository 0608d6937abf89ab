//! Worker pool that runs one sequencer per account
//!
//! At most `workers` accounts are in flight at once. A failed or panicked
//! account never stops the others.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, info_span, warn, Instrument};

use super::report::{AccountOutcome, DeletionReport};
use super::sequencer::DeletionSequencer;
use crate::error::{NetappDeleterError, Result};
use crate::netapp::models::NetAppAccount;

pub struct WorkerPoolCoordinator {
    sequencer: Arc<DeletionSequencer>,
    workers: usize,
}

impl WorkerPoolCoordinator {
    pub fn new(sequencer: Arc<DeletionSequencer>, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(NetappDeleterError::invalid_argument(
                "worker count must be at least 1",
            ));
        }
        Ok(Self { sequencer, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn run(&self, accounts: Vec<NetAppAccount>) -> DeletionReport {
        let started_at = Utc::now();
        info!(
            "Starting deletion of {} NetApp accounts with {} workers",
            accounts.len(),
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(accounts.len());

        for account in accounts {
            let sequencer = self.sequencer.clone();
            let semaphore = semaphore.clone();
            let name = account.name.clone();
            let resource_group = account.resource_group.clone();
            let span = info_span!("account", name = %account.name);

            let handle = tokio::spawn(
                async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return AccountOutcome::aborted(
                                account.name.clone(),
                                account.resource_group.clone(),
                                format!("worker pool closed: {e}"),
                            )
                        }
                    };
                    sequencer.run(&account).await
                }
                .instrument(span),
            );
            handles.push((name, resource_group, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, resource_group, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!("Worker for NetApp account '{}' aborted: {}", name, e);
                    outcomes.push(AccountOutcome::aborted(
                        name,
                        resource_group,
                        format!("worker task failed: {e}"),
                    ));
                }
            }
        }
        outcomes.sort_by(|a, b| a.account.cmp(&b.account));

        let report = DeletionReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            "Deletion finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }
}
