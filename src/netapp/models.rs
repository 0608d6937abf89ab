//! NetApp data models and types
//!
//! ARM resource identifiers plus the account hierarchy discovered at
//! enumeration time: accounts own capacity pools (which own volumes) and
//! backup vaults (which own backups).

use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

use crate::error::{NetappDeleterError, Result};

pub const NETAPP_API_VERSION: &str = "2024-07-01";
pub const RESOURCES_API_VERSION: &str = "2021-04-01";
pub const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";

const NETAPP_NAMESPACE: &str = "Microsoft.NetApp";

/// What an ARM id points at, as far as this tool cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    ResourceGroup,
    NetAppAccount,
    CapacityPool,
    Volume,
    BackupVault,
    Backup,
    Other,
}

impl ResourceKind {
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::ResourceGroup | Self::Other => RESOURCES_API_VERSION,
            _ => NETAPP_API_VERSION,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ResourceGroup => "resource group",
            Self::NetAppAccount => "NetApp account",
            Self::CapacityPool => "capacity pool",
            Self::Volume => "volume",
            Self::BackupVault => "backup vault",
            Self::Backup => "backup",
            Self::Other => "resource",
        };
        f.write_str(label)
    }
}

/// Parsed ARM resource id, e.g.
/// `/subscriptions/{s}/resourceGroups/{rg}/providers/Microsoft.NetApp/netAppAccounts/{a}/backupVaults/{v}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    raw: String,
    subscription_id: String,
    resource_group: String,
    namespace: Option<String>,
    /// (type, name) pairs below the provider namespace
    types: Vec<(String, String)>,
}

impl ResourceId {
    pub fn parse(id: &str) -> Result<Self> {
        let trimmed = id.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').collect();

        if segments.len() < 5 || !segments[0].is_empty() {
            return Err(NetappDeleterError::invalid_resource_id(
                id,
                "expected /subscriptions/{id}/resourceGroups/{name}/...",
            ));
        }
        if !segments[1].eq_ignore_ascii_case("subscriptions") || segments[2].is_empty() {
            return Err(NetappDeleterError::invalid_resource_id(id, "missing subscription"));
        }
        if !segments[3].eq_ignore_ascii_case("resourceGroups") || segments[4].is_empty() {
            return Err(NetappDeleterError::invalid_resource_id(id, "missing resource group"));
        }

        let mut namespace = None;
        let mut types = Vec::new();

        if segments.len() > 5 {
            if segments.len() < 8 || !segments[5].eq_ignore_ascii_case("providers") {
                return Err(NetappDeleterError::invalid_resource_id(
                    id,
                    "expected providers/{namespace}/{type}/{name}",
                ));
            }
            namespace = Some(segments[6].to_string());

            let rest = &segments[7..];
            if rest.len() % 2 != 0 || rest.iter().any(|s| s.is_empty()) {
                return Err(NetappDeleterError::invalid_resource_id(
                    id,
                    "resource types and names must come in pairs",
                ));
            }
            types = rest
                .chunks(2)
                .map(|pair| (pair[0].to_string(), pair[1].to_string()))
                .collect();
        }

        Ok(Self {
            raw: trimmed.to_string(),
            subscription_id: segments[2].to_string(),
            resource_group: segments[4].to_string(),
            namespace,
            types,
        })
    }

    pub fn resource_group(subscription_id: &str, resource_group: &str) -> Self {
        Self {
            raw: format!("/subscriptions/{subscription_id}/resourceGroups/{resource_group}"),
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            namespace: None,
            types: Vec::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    /// Id of the group that contains this resource
    pub fn resource_group_id(&self) -> ResourceId {
        Self::resource_group(&self.subscription_id, &self.resource_group)
    }

    /// Leaf name; nested ARM names such as `account/vault` are never
    /// returned whole because the id carries one name per segment.
    pub fn name(&self) -> &str {
        self.types
            .last()
            .map(|(_, name)| name.as_str())
            .unwrap_or(&self.resource_group)
    }

    pub fn kind(&self) -> ResourceKind {
        let Some(namespace) = &self.namespace else {
            return ResourceKind::ResourceGroup;
        };
        if !namespace.eq_ignore_ascii_case(NETAPP_NAMESPACE) {
            return ResourceKind::Other;
        }

        let chain: Vec<String> = self.types.iter().map(|(t, _)| t.to_lowercase()).collect();
        let chain: Vec<&str> = chain.iter().map(String::as_str).collect();
        match chain.as_slice() {
            ["netappaccounts"] => ResourceKind::NetAppAccount,
            ["netappaccounts", "capacitypools"] => ResourceKind::CapacityPool,
            ["netappaccounts", "capacitypools", "volumes"] => ResourceKind::Volume,
            ["netappaccounts", "backupvaults"] => ResourceKind::BackupVault,
            ["netappaccounts", "backupvaults", "backups"] => ResourceKind::Backup,
            _ => ResourceKind::Other,
        }
    }

    /// True for `ancestor` itself and anything nested below it. Segment
    /// boundaries matter: `.../netAppAccounts/anf2` is not within `.../anf`.
    pub fn is_within(&self, ancestor: &ResourceId) -> bool {
        let own = self.raw.to_lowercase();
        let parent = ancestor.raw.to_lowercase();
        match own.strip_prefix(&parent) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Path of a child collection, e.g. `{account}/capacityPools`
    pub fn child_collection(&self, collection: &str) -> String {
        format!("{}/{}", self.raw, collection)
    }

    fn expect_kind(self, expected: ResourceKind) -> Result<Self> {
        let actual = self.kind();
        if actual == expected {
            Ok(self)
        } else {
            Err(NetappDeleterError::invalid_resource_id(
                self.raw,
                format!("expected a {expected}, found a {actual}"),
            ))
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Generic ARM resource as returned by list calls
#[derive(Debug, Clone, Deserialize)]
pub struct ArmResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub resource_type: Option<String>,
}

impl ArmResource {
    pub fn resource_id(&self) -> Result<ResourceId> {
        ResourceId::parse(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Backup {
    pub id: ResourceId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Volume {
    pub id: ResourceId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityPool {
    pub id: ResourceId,
    pub name: String,
    pub volumes: Vec<Volume>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupVault {
    pub id: ResourceId,
    pub name: String,
    pub backups: Vec<Backup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetAppAccount {
    pub id: ResourceId,
    pub name: String,
    pub location: String,
    pub resource_group: String,
    pub capacity_pools: Vec<CapacityPool>,
    pub backup_vaults: Vec<BackupVault>,
}

impl Backup {
    pub fn from_id(id: ResourceId) -> Result<Self> {
        let id = id.expect_kind(ResourceKind::Backup)?;
        Ok(Self {
            name: id.name().to_string(),
            id,
        })
    }
}

impl Volume {
    pub fn from_id(id: ResourceId) -> Result<Self> {
        let id = id.expect_kind(ResourceKind::Volume)?;
        Ok(Self {
            name: id.name().to_string(),
            id,
        })
    }
}

impl CapacityPool {
    pub fn from_id(id: ResourceId) -> Result<Self> {
        let id = id.expect_kind(ResourceKind::CapacityPool)?;
        Ok(Self {
            name: id.name().to_string(),
            id,
            volumes: Vec::new(),
        })
    }
}

impl BackupVault {
    pub fn from_id(id: ResourceId) -> Result<Self> {
        let id = id.expect_kind(ResourceKind::BackupVault)?;
        Ok(Self {
            name: id.name().to_string(),
            id,
            backups: Vec::new(),
        })
    }
}

impl NetAppAccount {
    pub fn from_id(id: ResourceId, location: Option<String>) -> Result<Self> {
        let id = id.expect_kind(ResourceKind::NetAppAccount)?;
        Ok(Self {
            name: id.name().to_string(),
            resource_group: id.resource_group_name().to_string(),
            location: location.unwrap_or_default(),
            id,
            capacity_pools: Vec::new(),
            backup_vaults: Vec::new(),
        })
    }

    pub fn backup_count(&self) -> usize {
        self.backup_vaults.iter().map(|v| v.backups.len()).sum()
    }

    pub fn volume_count(&self) -> usize {
        self.capacity_pools.iter().map(|p| p.volumes.len()).sum()
    }

    /// Everything the sequencer will delete for this account, account included
    pub fn resource_count(&self) -> usize {
        1 + self.backup_count()
            + self.volume_count()
            + self.capacity_pools.len()
            + self.backup_vaults.len()
    }

    pub fn to_summary(&self) -> AccountSummary {
        AccountSummary {
            name: self.name.clone(),
            resource_group: self.resource_group.clone(),
            location: if self.location.is_empty() {
                "-".to_string()
            } else {
                self.location.clone()
            },
            capacity_pools: self.capacity_pools.len(),
            volumes: self.volume_count(),
            backup_vaults: self.backup_vaults.len(),
            backups: self.backup_count(),
        }
    }
}

/// Preview row shown before confirmation
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct AccountSummary {
    #[tabled(rename = "Account")]
    pub name: String,
    #[tabled(rename = "Resource Group")]
    pub resource_group: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Pools")]
    pub capacity_pools: usize,
    #[tabled(rename = "Volumes")]
    pub volumes: usize,
    #[tabled(rename = "Vaults")]
    pub backup_vaults: usize,
    #[tabled(rename = "Backups")]
    pub backups: usize,
}
