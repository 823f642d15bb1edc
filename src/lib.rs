//! mku - patch-version upgrade engine for Selectel MKS managed Kubernetes
//! clusters.
//!
//! Validates that a requested kube version change is a legal patch-level
//! move, confirms it targets the newest patch the platform offers for the
//! cluster's minor, triggers the upgrade through the MKS v1 API, and waits
//! for the cluster to converge back to `ACTIVE`.

pub mod error;
pub mod mks;
pub mod upgrade;
pub mod version;
pub mod watch;

pub use error::MkuError;
pub use mks::client::MksClient;
pub use mks::cluster::{Cluster, ClusterControl, ClusterStatus};
pub use upgrade::{
    RejectReason, UpgradeDecision, plan_patch_upgrade, upgrade_patch_version,
    wait_for_cluster_active,
};
pub use watch::{StateClass, WatchConfig, WatchError, wait_for_state};
