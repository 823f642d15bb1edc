//! Patch upgrade planning and orchestration.
//!
//! The remote upgrade action always moves a cluster to the newest patch of
//! its current minor, so planning rejects any request that would not match
//! what the platform is actually going to produce. Validation happens
//! before any remote mutation; once the upgrade is triggered, failures no
//! longer imply the platform rolled anything back.

use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::MkuError;
use crate::mks::cluster::{Cluster, ClusterControl, ClusterStatus};
use crate::version::{kube_version_to_minor, kube_version_to_patch, latest_by_patch};
use crate::watch::{self, WatchConfig};

/// Wait before the first status poll after triggering an upgrade.
pub const ACTIVE_WAIT_DELAY: Duration = Duration::from_secs(10);
/// Minimum pause between status polls.
pub const ACTIVE_WAIT_MIN_INTERVAL: Duration = Duration::from_secs(3);

/// Why a requested patch upgrade was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("current version {current} can't be upgraded to {desired}: minor versions differ")]
    MinorVersionMismatch { current: String, desired: String },

    #[error("current version {current} can't be downgraded to {desired}")]
    PatchDowngrade { current: String, desired: String },

    #[error("no supported kube version matches the minor part of {current}")]
    NoMatchingMinor { current: String },

    #[error("version {desired} is not the latest available patch version, the latest is {latest}")]
    NotLatestPatch { desired: String, latest: String },
}

/// Outcome of planning a patch upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeDecision {
    /// The requested version is exactly the newest patch the platform
    /// offers for the cluster's minor; the upgrade may be triggered.
    Allowed { target: String },
    /// The request was refused; nothing may be triggered.
    Rejected(RejectReason),
}

/// Decide whether `current` may be patch-upgraded to `desired` given the
/// versions the platform currently supports.
///
/// Pure and side-effect free, so it is safe to call speculatively. Callers
/// fetch `available` fresh for every decision; caching it across a
/// long-running attempt would let the plan drift from what the platform
/// will do.
pub fn plan_patch_upgrade(
    current: &str,
    desired: &str,
    available: &[String],
) -> Result<UpgradeDecision, MkuError> {
    let current_minor = kube_version_to_minor(current)?;
    let desired_minor = kube_version_to_minor(desired)?;
    if desired_minor != current_minor {
        return Ok(UpgradeDecision::Rejected(
            RejectReason::MinorVersionMismatch {
                current: current.to_string(),
                desired: desired.to_string(),
            },
        ));
    }

    let current_patch = kube_version_to_patch(current)?;
    let desired_patch = kube_version_to_patch(desired)?;
    if desired_patch < current_patch {
        return Ok(UpgradeDecision::Rejected(RejectReason::PatchDowngrade {
            current: current.to_string(),
            desired: desired.to_string(),
        }));
    }

    // Newest patch the platform offers for the current minor.
    let mut latest: Option<&str> = None;
    for version in available {
        if kube_version_to_minor(version)? != current_minor {
            continue;
        }
        latest = Some(match latest {
            None => version,
            Some(seen) => latest_by_patch(seen, version)?,
        });
    }

    let Some(latest) = latest else {
        return Ok(UpgradeDecision::Rejected(RejectReason::NoMatchingMinor {
            current: current.to_string(),
        }));
    };

    debug!(latest, "latest kube version for the current minor");

    if desired != latest {
        return Ok(UpgradeDecision::Rejected(RejectReason::NotLatestPatch {
            desired: desired.to_string(),
            latest: latest.to_string(),
        }));
    }

    Ok(UpgradeDecision::Allowed {
        target: desired.to_string(),
    })
}

/// Wait until the cluster reports `ACTIVE` again.
///
/// Pending set and timing mirror the platform's upgrade lifecycle: 10s
/// before the first poll, then at least 3s between polls, within the
/// caller's overall timeout.
pub async fn wait_for_cluster_active<C>(
    control: &C,
    cluster_id: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Cluster>
where
    C: ClusterControl + Sync,
{
    let config = WatchConfig {
        delay: ACTIVE_WAIT_DELAY,
        min_interval: ACTIVE_WAIT_MIN_INTERVAL,
        timeout,
    };

    let (cluster, _status) = watch::wait_for_state(
        async || control.refresh_cluster(cluster_id).await,
        ClusterStatus::activation_class,
        &config,
        cancel,
    )
    .await
    .with_context(|| format!("error waiting for the cluster {cluster_id} to become 'ACTIVE'"))?;

    Ok(cluster)
}

/// Validate, trigger and await a patch version upgrade for `cluster_id`.
///
/// Planning failures are reported before any remote mutation. Once the
/// upgrade has been triggered, a timeout, an unexpected status or a failed
/// status read does not mean the platform rolled the action back; the
/// cluster may still be pending or errored remotely and callers should
/// re-observe it. Nothing here serializes concurrent attempts on the same
/// cluster; two racing requests can both pass planning.
pub async fn upgrade_patch_version<C>(
    control: &C,
    cluster_id: &str,
    current: &str,
    desired: &str,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<()>
where
    C: ClusterControl + Sync,
{
    debug!(current, desired, "planning kube patch version upgrade");

    let available = control
        .supported_versions()
        .await
        .context("error getting all supported kube versions")?;

    match plan_patch_upgrade(current, desired, &available)? {
        UpgradeDecision::Rejected(reason) => return Err(reason.into()),
        UpgradeDecision::Allowed { target } => {
            debug!(target = %target, cluster_id, "patch version upgrade allowed");
        }
    }

    control
        .trigger_patch_upgrade(cluster_id)
        .await
        .context("error updating patch version")?;

    debug!(cluster_id, "waiting for cluster to become 'ACTIVE'");
    wait_for_cluster_active(control, cluster_id, timeout, cancel)
        .await
        .with_context(|| format!("upgrade of cluster {cluster_id} failed"))?;

    Ok(())
}
