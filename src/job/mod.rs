#[cfg(feature = "job_context")]
pub mod context;
pub mod task;

use std::fmt;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::warn;
use uuid::Uuid;

use crate::logger::JobLogger;
use crate::metrics::JobMetrics;

pub use task::{BoxedRunFn, FnTask, Task, TaskError, TaskResult};

// --- Public Type Aliases ---

/// Unique identifier of a single execution of a job's task. Uses UUID v4.
pub type ExecutionId = Uuid;

// --- Gating State ---

/// Whether triggers are allowed to start an execution.
///
/// The periodic timer keeps firing in both states; `Disabled` only turns
/// ticks and manual triggers into no-ops. It never cancels a running execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobState {
  #[default]
  Enabled,
  Disabled,
}

impl fmt::Display for JobState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      JobState::Enabled => f.write_str("Enabled"),
      JobState::Disabled => f.write_str("Disabled"),
    }
  }
}

// --- Shared Job State ---

/// Schedule metadata guarded by the job's single lock.
/// The lock is only held for individual reads and updates.
#[derive(Debug, Clone)]
pub(crate) struct JobMeta {
  pub interval: StdDuration,
  pub next_run: DateTime<Utc>,
  pub last_run: Option<DateTime<Utc>>,
  pub in_progress: bool,
  pub state: JobState,
}

/// Everything the job handle, its loop and its execution tasks share.
pub(crate) struct JobShared {
  pub task: Arc<dyn Task>,
  pub logger: JobLogger,
  pub meta: Mutex<JobMeta>,
  /// Single-permit guard; whoever holds the permit is the one running execution.
  pub guard: Arc<Semaphore>,
  pub metrics: JobMetrics,
}

impl JobShared {
  pub(crate) fn new(
    task: Arc<dyn Task>,
    logger: JobLogger,
    interval: StdDuration,
    state: JobState,
  ) -> Self {
    let now = Utc::now();
    Self {
      task,
      logger,
      meta: Mutex::new(JobMeta {
        interval,
        next_run: add_interval(now, interval),
        last_run: None,
        in_progress: false,
        state,
      }),
      guard: Arc::new(Semaphore::new(1)),
      metrics: JobMetrics::new(),
    }
  }

  pub(crate) fn name(&self) -> &str {
    self.task.name()
  }

  pub(crate) fn state(&self) -> JobState {
    self.meta.lock().state
  }

  pub(crate) fn set_state(&self, state: JobState) {
    self.meta.lock().state = state;
  }

  pub(crate) fn status(&self) -> JobStatus {
    let meta = self.meta.lock().clone();
    JobStatus {
      task_id: self.task.id(),
      name: self.task.name().to_string(),
      state: meta.state,
      interval: meta.interval,
      next_run: meta.next_run,
      last_run: meta.last_run,
      in_progress: meta.in_progress,
    }
  }
}

impl fmt::Debug for JobShared {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JobShared")
      .field("task_id", &self.task.id())
      .field("task_name", &self.task.name())
      .field("logger", &self.logger)
      .field("meta", &*self.meta.lock())
      .field("guard_available", &self.guard.available_permits())
      .finish()
  }
}

// --- Schedule Arithmetic ---

/// `reference + interval`, saturating instead of overflowing.
pub(crate) fn add_interval(reference: DateTime<Utc>, interval: StdDuration) -> DateTime<Utc> {
  match ChronoDuration::from_std(interval) {
    Ok(step) => reference.checked_add_signed(step).unwrap_or_else(|| {
      warn!(?interval, "Interval addition overflowed.");
      DateTime::<Utc>::MAX_UTC
    }),
    Err(e) => {
      warn!(?interval, error = %e, "Failed to convert interval duration.");
      DateTime::<Utc>::MAX_UTC
    }
  }
}

/// Moves `next_run` forward by whole intervals until it lies strictly after `now`.
///
/// Slots that were missed while an execution overran are discarded, never
/// replayed. Returns the corrected time and how many slots were skipped.
pub(crate) fn advance_past(
  mut next_run: DateTime<Utc>,
  interval: StdDuration,
  now: DateTime<Utc>,
) -> (DateTime<Utc>, usize) {
  if interval.is_zero() {
    return (next_run, 0);
  }
  let mut skipped = 0;
  while next_run <= now {
    let advanced = add_interval(next_run, interval);
    if advanced <= next_run {
      break;
    }
    next_run = advanced;
    skipped += 1;
  }
  (next_run, skipped)
}

// --- Public Snapshot Struct ---

/// A consistent snapshot of one job's schedule, taken under its lock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JobStatus {
  /// `Task::id()` of the job's task.
  pub task_id: i64,
  /// `Task::name()` of the job's task.
  pub name: String,
  pub state: JobState,
  pub interval: StdDuration,
  pub next_run: DateTime<Utc>,
  /// `None` until the first execution has started.
  pub last_run: Option<DateTime<Utc>>,
  pub in_progress: bool,
}
