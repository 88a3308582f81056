use super::types::{TaskPhase, TaskStatus};
use crate::config::PollConfig;
use crate::error::RegistryError;
use crate::retry::Sleeper;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How often and how long to poll a task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
        }
    }
}

/// Where a polled task stands
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// `attempt` polls have been made so far
    Pending { attempt: u32 },
    Completed(TaskStatus),
    Failed(String),
    TimedOut { attempts: u32 },
}

impl PollState {
    /// Transition after observing `status` on poll number `attempt`
    pub fn observe(status: TaskStatus, attempt: u32) -> Self {
        match status.phase() {
            TaskPhase::Completed => Self::Completed(status),
            TaskPhase::Failed => Self::Failed(status.failure_reason()),
            TaskPhase::Running => Self::Pending { attempt },
        }
    }
}

/// Poll `fetch` until the task finishes or `max_attempts` polls have been made.
///
/// Sleeps between polls only, never after the last one. Errors from `fetch`
/// end polling immediately.
pub async fn poll_task<F, Fut, S>(
    task_id: &str,
    policy: &PollPolicy,
    sleeper: &S,
    mut fetch: F,
) -> Result<TaskStatus, RegistryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<TaskStatus, RegistryError>>,
    S: Sleeper,
{
    let mut state = PollState::Pending { attempt: 0 };
    loop {
        state = match state {
            PollState::Pending { attempt } if attempt >= policy.max_attempts => {
                PollState::TimedOut { attempts: attempt }
            }
            PollState::Pending { attempt } => {
                if attempt > 0 {
                    sleeper.sleep(policy.interval).await;
                }
                let status = fetch().await?;
                debug!(
                    "Task {} poll {}/{}: {}",
                    task_id,
                    attempt + 1,
                    policy.max_attempts,
                    status.status
                );
                PollState::observe(status, attempt + 1)
            }
            PollState::Completed(status) => return Ok(status),
            PollState::Failed(reason) => {
                return Err(RegistryError::TaskFailed {
                    task_id: task_id.to_string(),
                    reason,
                });
            }
            PollState::TimedOut { attempts } => {
                return Err(RegistryError::PollTimeout {
                    task_id: task_id.to_string(),
                    attempts,
                });
            }
        };
    }
}
