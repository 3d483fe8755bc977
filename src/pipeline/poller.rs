//! Bounded-retry polling for asynchronous generation jobs.
//!
//! [`poll_until`] is the single polling loop in the codebase: wait, probe,
//! classify, repeat, up to a configured number of attempts. The caller maps
//! its domain status onto [`Probe`]; transient probe errors consume an
//! attempt without aborting the loop.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PollerConfig;

/// Spacing and bound for one polling loop.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Pause between status checks
    pub interval: Duration,
    /// Status checks before the job counts as timed out
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 30,
        }
    }
}

impl From<&PollerConfig> for PollConfig {
    fn from(config: &PollerConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            max_attempts: config.max_attempts,
        }
    }
}

/// Cooperative cancellation flag shared between a pipeline run and the store
/// entry that issued it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the holder to stop at its next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How one status probe classified the job.
#[derive(Debug)]
pub enum Probe<T> {
    /// Terminal success with the retrievable output
    Ready(T),
    /// Not finished yet, keep polling
    Pending,
    /// The job finished but its output is missing or unusable
    Incomplete,
    /// The job reported a terminal failure
    Failed { reason: String },
}

/// Terminal outcomes of [`poll_until`] other than success.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("job reported failure: {reason}")]
    JobFailed { reason: String },

    #[error("job completed without a retrievable result")]
    Incomplete,

    #[error("job not finished after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("polling cancelled")]
    Cancelled,
}

/// Wait `interval`, probe, and classify until a terminal outcome or the
/// attempt budget runs out.
///
/// The cancellation flag is checked between attempts so a superseded run
/// stops promptly instead of draining its full budget. Probe errors are
/// treated as transient: logged, counted against the budget, retried.
pub async fn poll_until<T, E, F, Fut>(
    config: PollConfig,
    cancel: &CancelFlag,
    mut probe: F,
) -> Result<T, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>, E>>,
    E: std::fmt::Display,
{
    for attempt in 1..=config.max_attempts {
        if cancel.is_cancelled() {
            return Err(PollError::Cancelled);
        }

        tokio::time::sleep(config.interval).await;

        if cancel.is_cancelled() {
            return Err(PollError::Cancelled);
        }

        match probe().await {
            Ok(Probe::Ready(value)) => {
                debug!(attempt, "Job finished");
                return Ok(value);
            }
            Ok(Probe::Pending) => {
                debug!(attempt, max_attempts = config.max_attempts, "Job still pending");
            }
            Ok(Probe::Incomplete) => return Err(PollError::Incomplete),
            Ok(Probe::Failed { reason }) => return Err(PollError::JobFailed { reason }),
            Err(err) => {
                warn!(attempt, error = %err, "Status check failed, retrying");
            }
        }
    }

    Err(PollError::Timeout {
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn fast(max_attempts: u32) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(2),
            max_attempts,
        }
    }

    #[tokio::test]
    async fn pending_forever_times_out_after_exact_budget() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = poll_until(fast(4), &CancelFlag::new(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(Probe::Pending) }
        })
        .await;

        assert_eq!(result.unwrap_err(), PollError::Timeout { attempts: 4 });
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn ready_short_circuits_remaining_attempts() {
        let calls = AtomicU32::new(0);

        let result = poll_until(fast(10), &CancelFlag::new(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                Ok::<_, String>(if n < 3 {
                    Probe::Pending
                } else {
                    Probe::Ready(n)
                })
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn job_failure_aborts_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = poll_until(fast(5), &CancelFlag::new(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Ok::<_, String>(Probe::Failed {
                    reason: "render crashed".to_string(),
                })
            }
        })
        .await;

        assert_eq!(
            result.unwrap_err(),
            PollError::JobFailed {
                reason: "render crashed".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn incomplete_result_aborts_immediately() {
        let result: Result<(), _> = poll_until(fast(5), &CancelFlag::new(), || async {
            Ok::<_, String>(Probe::Incomplete)
        })
        .await;

        assert_eq!(result.unwrap_err(), PollError::Incomplete);
    }

    #[tokio::test]
    async fn transient_errors_consume_attempts_without_aborting() {
        let calls = AtomicU32::new(0);

        let result = poll_until(fast(10), &CancelFlag::new(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err("connection reset".to_string())
                } else {
                    Ok(Probe::Ready("done"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_errors_still_count_toward_timeout() {
        let result: Result<(), _> = poll_until(fast(3), &CancelFlag::new(), || async {
            Err::<Probe<()>, _>("connection reset".to_string())
        })
        .await;

        assert_eq!(result.unwrap_err(), PollError::Timeout { attempts: 3 });
    }

    #[tokio::test]
    async fn pre_cancelled_flag_stops_before_first_probe() {
        let flag = CancelFlag::new();
        flag.cancel();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = poll_until(fast(5), &flag, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(Probe::Pending) }
        })
        .await;

        assert_eq!(result.unwrap_err(), PollError::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancellation_mid_loop_stops_at_next_boundary() {
        let flag = CancelFlag::new();
        let inner = flag.clone();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = poll_until(fast(10), &flag, || {
            calls.fetch_add(1, Ordering::SeqCst);
            inner.cancel();
            async { Ok::<_, String>(Probe::Pending) }
        })
        .await;

        assert_eq!(result.unwrap_err(), PollError::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
