//! In-memory NetApp fake shared by the integration tests

#![allow(dead_code)]

pub mod arm_server;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use netapp_deleter::netapp::{
    Backup, BackupVault, CapacityPool, NetAppAccount, NetAppOperations, ResourceId, Volume,
};
use netapp_deleter::{NetappDeleterError, Result};

pub const SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000001";

pub fn account_id(resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{SUBSCRIPTION}/resourceGroups/{resource_group}/providers/Microsoft.NetApp/netAppAccounts/{name}"
    )
}

pub fn id(raw: &str) -> ResourceId {
    ResourceId::parse(raw).unwrap()
}

/// Build a populated account: `pools` maps pool name to volume names and
/// `vaults` maps vault name to backup names.
pub fn account(
    resource_group: &str,
    name: &str,
    pools: &[(&str, &[&str])],
    vaults: &[(&str, &[&str])],
) -> NetAppAccount {
    let account_raw = account_id(resource_group, name);
    let mut account = NetAppAccount::from_id(id(&account_raw), Some("eastus".to_string())).unwrap();

    for (pool, volumes) in pools {
        let pool_raw = format!("{account_raw}/capacityPools/{pool}");
        let mut pool = CapacityPool::from_id(id(&pool_raw)).unwrap();
        for volume in volumes.iter() {
            pool.volumes
                .push(Volume::from_id(id(&format!("{pool_raw}/volumes/{volume}"))).unwrap());
        }
        account.capacity_pools.push(pool);
    }

    for (vault, backups) in vaults {
        let vault_raw = format!("{account_raw}/backupVaults/{vault}");
        let mut vault = BackupVault::from_id(id(&vault_raw)).unwrap();
        for backup in backups.iter() {
            vault
                .backups
                .push(Backup::from_id(id(&format!("{vault_raw}/backups/{backup}"))).unwrap());
        }
        account.backup_vaults.push(vault);
    }

    account
}

#[derive(Default)]
struct FakeState {
    /// Every delete call, in the order it was issued
    calls: Vec<String>,
    /// Successful deletes, in completion order
    deleted: Vec<String>,
    failing: HashSet<String>,
    nested_conflicts: HashMap<String, u32>,
    surviving: HashSet<String>,
    group_extras: HashMap<String, Vec<ResourceId>>,
}

pub struct FakeNetApp {
    accounts: Vec<NetAppAccount>,
    delay: Duration,
    state: Mutex<FakeState>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeNetApp {
    pub fn new(accounts: Vec<NetAppAccount>) -> Self {
        Self {
            accounts,
            delay: Duration::ZERO,
            state: Mutex::new(FakeState::default()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Every delete sleeps this long, so overlapping calls are observable
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_delete(self, raw: &str) -> Self {
        self.state.lock().unwrap().failing.insert(raw.to_string());
        self
    }

    /// The first `times` deletes of `raw` report nested resources
    pub fn nested_conflicts(self, raw: &str, times: u32) -> Self {
        self.state
            .lock()
            .unwrap()
            .nested_conflicts
            .insert(raw.to_string(), times);
        self
    }

    /// Delete of `raw` succeeds but the resource is still there afterwards
    pub fn survive_delete(self, raw: &str) -> Self {
        self.state.lock().unwrap().surviving.insert(raw.to_string());
        self
    }

    /// An unrelated resource living in `resource_group`
    pub fn extra_resource(self, resource_group: &str, raw: &str) -> Self {
        let group = ResourceId::resource_group(SUBSCRIPTION, resource_group);
        self.state
            .lock()
            .unwrap()
            .group_extras
            .entry(group.as_str().to_string())
            .or_default()
            .push(id(raw));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn was_deleted(&self, raw: &str) -> bool {
        self.state.lock().unwrap().deleted.iter().any(|d| d == raw)
    }

    /// Completion position of a successful delete
    pub fn position(&self, raw: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .deleted
            .iter()
            .position(|d| d == raw)
            .unwrap_or_else(|| panic!("{raw} was never deleted"))
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn find_account(&self, raw: &str) -> Result<&NetAppAccount> {
        self.accounts
            .iter()
            .find(|a| a.id.as_str() == raw)
            .ok_or_else(|| NetappDeleterError::not_found(raw))
    }

    fn is_gone(&self, raw: &str) -> bool {
        let state = self.state.lock().unwrap();
        !state.surviving.contains(raw) && state.deleted.iter().any(|d| d == raw)
    }

    fn all_ids(account: &NetAppAccount) -> Vec<ResourceId> {
        let mut ids = vec![account.id.clone()];
        for pool in &account.capacity_pools {
            ids.push(pool.id.clone());
            ids.extend(pool.volumes.iter().map(|v| v.id.clone()));
        }
        for vault in &account.backup_vaults {
            ids.push(vault.id.clone());
            ids.extend(vault.backups.iter().map(|b| b.id.clone()));
        }
        ids
    }
}

#[async_trait]
impl NetAppOperations for FakeNetApp {
    async fn list_accounts(&self) -> Result<Vec<NetAppAccount>> {
        Ok(self
            .accounts
            .iter()
            .map(|a| {
                let mut bare = a.clone();
                bare.capacity_pools.clear();
                bare.backup_vaults.clear();
                bare
            })
            .collect())
    }

    async fn list_capacity_pools(&self, account: &ResourceId) -> Result<Vec<CapacityPool>> {
        let account = self.find_account(account.as_str())?;
        Ok(account
            .capacity_pools
            .iter()
            .map(|p| {
                let mut bare = p.clone();
                bare.volumes.clear();
                bare
            })
            .collect())
    }

    async fn list_volumes(&self, pool: &ResourceId) -> Result<Vec<Volume>> {
        self.accounts
            .iter()
            .flat_map(|a| a.capacity_pools.iter())
            .find(|p| &p.id == pool)
            .map(|p| p.volumes.clone())
            .ok_or_else(|| NetappDeleterError::not_found(pool.as_str()))
    }

    async fn list_backup_vaults(&self, account: &ResourceId) -> Result<Vec<BackupVault>> {
        let account = self.find_account(account.as_str())?;
        Ok(account
            .backup_vaults
            .iter()
            .map(|v| {
                let mut bare = v.clone();
                bare.backups.clear();
                bare
            })
            .collect())
    }

    async fn list_backups(&self, vault: &ResourceId) -> Result<Vec<Backup>> {
        self.accounts
            .iter()
            .flat_map(|a| a.backup_vaults.iter())
            .find(|v| &v.id == vault)
            .map(|v| v.backups.clone())
            .ok_or_else(|| NetappDeleterError::not_found(vault.as_str()))
    }

    async fn list_resource_group_resources(
        &self,
        resource_group: &ResourceId,
    ) -> Result<Vec<ResourceId>> {
        if self.is_gone(resource_group.as_str()) {
            return Err(NetappDeleterError::not_found(resource_group.as_str()));
        }

        let mut remaining: Vec<ResourceId> = self
            .accounts
            .iter()
            .filter(|a| a.id.resource_group_id() == *resource_group)
            .flat_map(Self::all_ids)
            .filter(|id| !self.is_gone(id.as_str()))
            .collect();

        if let Some(extras) = self
            .state
            .lock()
            .unwrap()
            .group_extras
            .get(resource_group.as_str())
        {
            remaining.extend(extras.iter().cloned());
        }
        Ok(remaining)
    }

    async fn delete_by_id(&self, id: &ResourceId) -> Result<()> {
        let raw = id.as_str().to_string();
        self.state.lock().unwrap().calls.push(raw.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        if state.failing.contains(&raw) {
            return Err(NetappDeleterError::azure_api(format!(
                "HTTP 409 Conflict: cannot delete {raw}"
            )));
        }
        if let Some(left) = state.nested_conflicts.get_mut(&raw) {
            if *left > 0 {
                *left -= 1;
                return Err(NetappDeleterError::azure_api(
                    "HTTP 409 CannotDeleteResource: Cannot delete resource while nested resources exist.",
                ));
            }
        }
        state.deleted.push(raw);
        Ok(())
    }

    async fn exists(&self, id: &ResourceId) -> Result<bool> {
        Ok(!self.is_gone(id.as_str()))
    }
}
