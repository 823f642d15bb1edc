//! Generic state-convergence watcher.
//!
//! Remote mutations on MKS are asynchronous: the API acknowledges the
//! request and the resource then moves through transient statuses until it
//! settles. The watcher polls a refresh operation until the observed state
//! reaches a target, diverges, or the timeout budget runs out. Refreshes
//! are strictly sequential and the loop only suspends on its own timers,
//! so a cancellation token is honored at every suspension point.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Three-way partition of the states a watched resource can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    /// The remote operation is still in progress; keep polling.
    Pending,
    /// The desired terminal state.
    Target,
    /// Any other state; treated as a fatal divergence, not retried.
    Unclassified,
}

/// Timing parameters for a watch.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Wait before the first refresh call.
    pub delay: Duration,
    /// Minimum pause between refresh calls.
    pub min_interval: Duration,
    /// Overall budget for the watch.
    pub timeout: Duration,
}

/// Terminal failures of a watch.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("timed out after {waited:?} waiting for target state")]
    TimedOut { waited: Duration },

    #[error("resource reported unexpected state: {0}")]
    UnexpectedState(String),

    #[error("watch cancelled before reaching target state")]
    Cancelled,

    #[error(transparent)]
    Refresh(anyhow::Error),
}

/// Poll `refresh` until `classify` reports a target state.
///
/// Returns the last refreshed resource together with its final state. A
/// failed refresh call is propagated as [`WatchError::Refresh`] without
/// retry; an unclassified state fails the watch immediately with no
/// further refreshes. While pending, the loop pauses for `min_interval`,
/// bounded above by the remaining timeout budget, then refreshes again.
/// Cancellation wins over every timer; a cancelled watch never reports
/// convergence.
pub async fn wait_for_state<R, S, F, C>(
    mut refresh: F,
    classify: C,
    config: &WatchConfig,
    cancel: &CancellationToken,
) -> Result<(R, S), WatchError>
where
    F: AsyncFnMut() -> Result<(R, S)>,
    C: Fn(&S) -> StateClass,
    S: fmt::Display,
{
    let started = Instant::now();
    let deadline = started + config.timeout;

    pause(config.delay, cancel).await?;

    loop {
        let (resource, state) = refresh().await.map_err(WatchError::Refresh)?;

        match classify(&state) {
            StateClass::Target => {
                debug!(state = %state, "watched resource reached target state");
                return Ok((resource, state));
            }
            StateClass::Unclassified => {
                return Err(WatchError::UnexpectedState(state.to_string()));
            }
            StateClass::Pending => {
                debug!(state = %state, "watched resource still pending");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WatchError::TimedOut {
                waited: now - started,
            });
        }

        pause(config.min_interval.min(deadline - now), cancel).await?;
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), WatchError> {
    tokio::select! {
        () = cancel.cancelled() => Err(WatchError::Cancelled),
        () = sleep(duration) => Ok(()),
    }
}
