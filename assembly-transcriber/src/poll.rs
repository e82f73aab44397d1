//! Status polling with capped exponential backoff.
//!
//! [`poll_until_complete`] calls a fetch operation until the remote job reaches
//! a terminal state. Between non-terminal observations it sleeps for the next
//! [`Backoff`] delay: 5s, 10s, 20s, 30s, 30s, ... with the default policy.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// What one status fetch observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Not finished yet. Carries the status label for logging.
    Pending(String),
    /// Finished successfully with the job's payload.
    Completed(T),
    /// Finished unsuccessfully, with the service's reason if it gave one.
    Failed(Option<String>),
}

/// Backoff parameters plus an optional ceiling on how long to keep polling.
///
/// Both `max_polls` and `timeout` default to `None`, which polls until the job
/// reaches a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Maximum number of fetches, including the first.
    pub max_polls: Option<u32>,
    /// Overall budget measured from the first fetch.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(5_000),
            max_delay: Duration::from_millis(30_000),
            max_polls: None,
            timeout: None,
        }
    }
}

impl PollPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn max_polls(mut self, polls: Option<u32>) -> Self {
        self.max_polls = polls;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Infinite sequence of delays: `min(initial * 2^n, max)`.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            current: initial.min(max),
            max,
        }
    }

    pub fn from_policy(policy: &PollPolicy) -> Self {
        Self::new(policy.initial_delay, policy.max_delay)
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        Some(delay)
    }
}

/// Call `fetch` until it reports a terminal status.
///
/// - `Completed(t)` returns `Ok(t)`.
/// - `Failed(reason)` returns [`Error::JobFailed`].
/// - An `Err` from `fetch` is returned as-is, without retrying.
/// - `Pending` sleeps for the next backoff delay and tries again, unless the
///   policy's ceiling would be exceeded, which returns [`Error::PollTimeout`].
pub async fn poll_until_complete<T, F, Fut>(
    job_id: &str,
    policy: &PollPolicy,
    mut fetch: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>>>,
{
    let started = Instant::now();
    let mut backoff = Backoff::from_policy(policy);
    let mut polls: u32 = 0;

    loop {
        polls += 1;
        let label = match fetch().await? {
            PollStatus::Completed(payload) => {
                debug!(job_id, polls, "job completed");
                return Ok(payload);
            }
            PollStatus::Failed(reason) => {
                return Err(Error::JobFailed {
                    id: job_id.to_string(),
                    reason,
                });
            }
            PollStatus::Pending(label) => label,
        };

        let delay = backoff.next().unwrap_or(policy.max_delay);

        let out_of_polls = policy.max_polls.is_some_and(|max| polls >= max);
        let out_of_time = policy
            .timeout
            .is_some_and(|timeout| started.elapsed() + delay > timeout);
        if out_of_polls || out_of_time {
            return Err(Error::PollTimeout {
                id: job_id.to_string(),
                polls,
                elapsed: started.elapsed(),
            });
        }

        info!(
            job_id,
            status = %label,
            wait_secs = delay.as_secs_f64(),
            "transcript not ready, waiting"
        );
        tokio::time::sleep(delay).await;
    }
}
