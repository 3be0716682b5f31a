//! Bounded task pool for per-file generation.
//!
//! A permit is taken before each task is spawned, so `submit` blocks the submitter while the
//! pool is full and at most `limit` tasks ever run at once. After a failure the pool applies
//! its [`FailurePolicy`]; cancellation of the caller's token stops submission and aborts
//! in-flight work at its next await point.

use crate::error::PipelineError;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// What the pool does once a task has failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop submitting new tasks; in-flight tasks run to completion.
    #[default]
    StopSubmitting,
    /// Keep submitting; every task runs.
    Continue,
    /// Stop submitting and cancel in-flight tasks.
    CancelInFlight,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::StopSubmitting => "stop_submitting",
            FailurePolicy::Continue => "continue",
            FailurePolicy::CancelInFlight => "cancel_in_flight",
        }
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "stop_submitting" => Ok(FailurePolicy::StopSubmitting),
            "continue" => Ok(FailurePolicy::Continue),
            "cancel_in_flight" => Ok(FailurePolicy::CancelInFlight),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

/// Outcome of one `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    /// The failure policy stopped submission; the task was not started.
    Halted,
    /// The run was cancelled; the task was not started.
    Cancelled,
}

pub type TaskOutcome<T> = (usize, Result<T, PipelineError>);

pub struct TaskPool<T> {
    semaphore: Arc<Semaphore>,
    tasks: JoinSet<TaskOutcome<T>>,
    policy: FailurePolicy,
    submit_delay: Duration,
    /// Child of the caller's token; cancelled by the caller or by `CancelInFlight`.
    work: CancellationToken,
    /// Set after the first failure under a halting policy.
    halt: CancellationToken,
}

impl<T: Send + 'static> TaskPool<T> {
    pub fn new(
        limit: usize,
        policy: FailurePolicy,
        cancel: &CancellationToken,
        submit_delay: Duration,
    ) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit.max(1))),
            tasks: JoinSet::new(),
            policy,
            submit_delay,
            work: cancel.child_token(),
            halt: CancellationToken::new(),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_cancelled()
    }

    /// Wait for a free slot, then spawn `task` under `index`.
    pub async fn submit<F>(&mut self, index: usize, task: F) -> Submission
    where
        F: Future<Output = Result<T, PipelineError>> + Send + 'static,
    {
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        let permit = tokio::select! {
            biased;
            _ = self.halt.cancelled() => return Submission::Halted,
            _ = self.work.cancelled() => return Submission::Cancelled,
            permit = self.semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return Submission::Cancelled,
            },
        };
        // A failing task sets `halt` before releasing its permit.
        if self.halt.is_cancelled() {
            return Submission::Halted;
        }

        let work = self.work.clone();
        let halt = self.halt.clone();
        let policy = self.policy;
        self.tasks.spawn(async move {
            let _permit = permit;
            let result = tokio::select! {
                biased;
                _ = work.cancelled() => Err(PipelineError::Cancelled),
                result = AssertUnwindSafe(task).catch_unwind() => {
                    result.unwrap_or_else(|payload| Err(PipelineError::TaskPanicked(panic_message(payload))))
                }
            };
            if let Err(err) = &result {
                if !err.is_cancelled() {
                    match policy {
                        FailurePolicy::Continue => {}
                        FailurePolicy::StopSubmitting => halt.cancel(),
                        FailurePolicy::CancelInFlight => {
                            halt.cancel();
                            work.cancel();
                        }
                    }
                }
            }
            (index, result)
        });
        debug!(task = index, "Task submitted");
        Submission::Accepted
    }

    /// Wait for every submitted task. Outcomes are sorted by index.
    pub async fn join_all(mut self) -> Vec<TaskOutcome<T>> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "Generation task did not complete"),
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);
        outcomes
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
