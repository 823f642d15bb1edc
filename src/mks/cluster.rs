//! Cluster view, status classification and the remote-control seam.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::watch::StateClass;

/// MKS cluster status as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ClusterStatus {
    Active,
    PendingCreate,
    PendingUpdate,
    PendingUpgradePatchVersion,
    PendingUpgradeMinorVersion,
    PendingResize,
    PendingRotateCerts,
    PendingDelete,
    Maintenance,
    Error,
    /// Status string this build does not know about.
    Unknown(String),
}

impl ClusterStatus {
    /// The wire form of the status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::PendingCreate => "PENDING_CREATE",
            Self::PendingUpdate => "PENDING_UPDATE",
            Self::PendingUpgradePatchVersion => "PENDING_UPGRADE_PATCH_VERSION",
            Self::PendingUpgradeMinorVersion => "PENDING_UPGRADE_MINOR_VERSION",
            Self::PendingResize => "PENDING_RESIZE",
            Self::PendingRotateCerts => "PENDING_ROTATE_CERTS",
            Self::PendingDelete => "PENDING_DELETE",
            Self::Maintenance => "MAINTENANCE",
            Self::Error => "ERROR",
            Self::Unknown(status) => status,
        }
    }

    /// Classify this status for a watch that waits for the cluster to
    /// return to `ACTIVE`.
    ///
    /// Only the transient statuses a create, update, patch upgrade or
    /// resize moves through count as pending. Everything else, including
    /// `ERROR`, maintenance and deletions, fails the watch instead of
    /// being waited out.
    pub const fn activation_class(&self) -> StateClass {
        match self {
            Self::Active => StateClass::Target,
            Self::PendingCreate
            | Self::PendingUpdate
            | Self::PendingUpgradePatchVersion
            | Self::PendingResize => StateClass::Pending,
            _ => StateClass::Unclassified,
        }
    }
}

impl From<String> for ClusterStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ACTIVE" => Self::Active,
            "PENDING_CREATE" => Self::PendingCreate,
            "PENDING_UPDATE" => Self::PendingUpdate,
            "PENDING_UPGRADE_PATCH_VERSION" => Self::PendingUpgradePatchVersion,
            "PENDING_UPGRADE_MINOR_VERSION" => Self::PendingUpgradeMinorVersion,
            "PENDING_RESIZE" => Self::PendingResize,
            "PENDING_ROTATE_CERTS" => Self::PendingRotateCerts,
            "PENDING_DELETE" => Self::PendingDelete,
            "MAINTENANCE" => Self::Maintenance,
            "ERROR" => Self::Error,
            _ => Self::Unknown(value),
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cluster view returned by the MKS v1 API.
#[derive(Debug, Clone, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub status: ClusterStatus,
    pub project_id: String,
    pub network_id: String,
    pub subnet_id: String,
    #[serde(default)]
    pub kube_api_ip: String,
    pub kube_version: String,
    pub region: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub maintenance_window_start: String,
    #[serde(default)]
    pub maintenance_window_end: String,
    #[serde(default)]
    pub enable_autorepair: bool,
    #[serde(default)]
    pub enable_patch_version_auto_upgrade: bool,
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.name, self.kube_version, self.region)
    }
}

/// Remote operations the upgrade flow depends on.
///
/// Implementations talk to the cluster control plane. Failures propagate
/// unchanged; retry policy, if any, lives behind this seam rather than in
/// the callers.
#[async_trait]
pub trait ClusterControl {
    /// All kube versions the platform currently supports.
    async fn supported_versions(&self) -> Result<Vec<String>>;

    /// Start an asynchronous upgrade of the cluster to the latest patch
    /// version of its current minor.
    async fn trigger_patch_upgrade(&self, cluster_id: &str) -> Result<()>;

    /// Fetch the cluster and its current status.
    async fn refresh_cluster(&self, cluster_id: &str) -> Result<(Cluster, ClusterStatus)>;
}
