//! Per-account outcomes and the aggregate run report

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tabled::Tabled;

/// Ordered stages of one account's teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum DeletionStage {
    Backups,
    Volumes,
    PoolsAndVaults,
    Account,
    ResourceGroup,
}

impl fmt::Display for DeletionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Backups => "backups",
            Self::Volumes => "volumes",
            Self::PoolsAndVaults => "capacity pools and backup vaults",
            Self::Account => "account",
            Self::ResourceGroup => "resource group",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum ResourceGroupDisposition {
    Deleted,
    AlreadyGone,
    Kept { remaining: usize },
    Skipped,
}

impl fmt::Display for ResourceGroupDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => f.write_str("resource group deleted"),
            Self::AlreadyGone => f.write_str("resource group already gone"),
            Self::Kept { remaining } => {
                write!(f, "resource group kept ({remaining} resources remain)")
            }
            Self::Skipped => f.write_str("resource group left in place"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AccountStatus {
    Deleted {
        resource_group: ResourceGroupDisposition,
    },
    Failed {
        stage: DeletionStage,
        error: String,
    },
    /// The worker died before producing an outcome
    Aborted { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountOutcome {
    pub account: String,
    pub resource_group: String,
    pub deleted_resources: usize,
    pub status: AccountStatus,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl AccountOutcome {
    pub fn aborted(account: String, resource_group: String, error: String) -> Self {
        Self {
            account,
            resource_group,
            deleted_resources: 0,
            status: AccountStatus::Aborted { error },
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, AccountStatus::Deleted { .. })
    }

    pub fn failed_stage(&self) -> Option<DeletionStage> {
        match &self.status {
            AccountStatus::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn to_row(&self) -> OutcomeRow {
        let (status, detail) = match &self.status {
            AccountStatus::Deleted { resource_group } => {
                ("Deleted".to_string(), resource_group.to_string())
            }
            AccountStatus::Failed { stage, error } => {
                (format!("Failed ({stage})"), error.clone())
            }
            AccountStatus::Aborted { error } => ("Aborted".to_string(), error.clone()),
        };

        OutcomeRow {
            account: self.account.clone(),
            resource_group: self.resource_group.clone(),
            deleted: self.deleted_resources,
            status,
            detail,
            elapsed: format!("{:.0}s", self.elapsed.as_secs_f64()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct OutcomeRow {
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Resource Group")]
    pub resource_group: String,
    #[tabled(rename = "Deleted")]
    pub deleted: usize,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Detail")]
    pub detail: String,
    #[tabled(rename = "Elapsed")]
    pub elapsed: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<AccountOutcome>,
}

impl DeletionReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome(&self, account: &str) -> Option<&AccountOutcome> {
        self.outcomes.iter().find(|o| o.account == account)
    }

    pub fn rows(&self) -> Vec<OutcomeRow> {
        self.outcomes.iter().map(AccountOutcome::to_row).collect()
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
