use crate::command::TriggerSource;
use crate::job::{advance_past, ExecutionId, JobShared};
use crate::metrics::JobMetrics;

#[cfg(feature = "job_context")]
use crate::job::context::{ExecutionContext, CURRENT_EXECUTION_CONTEXT};

use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, warn};

/// How a single execution of the task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecutionOutcome {
  Succeeded,
  Failed,
  Panicked,
  Cancelled,
}

impl ExecutionOutcome {
  fn as_str(&self) -> &'static str {
    match self {
      ExecutionOutcome::Succeeded => "Success",
      ExecutionOutcome::Failed => "Fail",
      ExecutionOutcome::Panicked => "Panic",
      ExecutionOutcome::Cancelled => "Cancelled",
    }
  }
}

/// One started execution of a job's task.
///
/// Created by the job loop once it holds the guard permit. The permit is
/// owned here and dropped only after the job's metadata has been updated, so
/// the guard is released on every path, failure and panic included.
pub(crate) struct Execution {
  shared: Arc<JobShared>,
  permit: OwnedSemaphorePermit,
  execution_id: ExecutionId,
  #[cfg_attr(not(feature = "job_context"), allow(dead_code))]
  started_at: DateTime<Utc>,
  source: TriggerSource,
}

impl Execution {
  pub(crate) fn new(
    shared: Arc<JobShared>,
    permit: OwnedSemaphorePermit,
    execution_id: ExecutionId,
    started_at: DateTime<Utc>,
    source: TriggerSource,
  ) -> Self {
    Self {
      shared,
      permit,
      execution_id,
      started_at,
      source,
    }
  }

  /// Runs the task to completion, then reports the outcome, clears the
  /// in-progress flag, corrects the next run time and releases the guard.
  pub(crate) async fn run(self) {
    debug!(trigger = self.source.as_str(), "Starting task execution.");
    let start_instant = Instant::now();
    let outcome = self.execute_task().await;
    let duration = start_instant.elapsed();

    self.shared.metrics.execution_duration.record(duration);
    debug!(
      duration_ms = duration.as_millis(),
      outcome = outcome.as_str(),
      "Finished task execution."
    );

    self.finish();
  }

  /// Spawns the task's future on its own Tokio task so a panic surfaces as a
  /// `JoinError` instead of unwinding through the job.
  async fn execute_task(&self) -> ExecutionOutcome {
    let task = self.shared.task.clone();
    let name = self.shared.name();
    let metrics = &self.shared.metrics;
    let logger = &self.shared.logger;

    #[cfg(feature = "job_context")]
    let handle = {
      let context = ExecutionContext {
        task_id: task.id(),
        task_name: task.name().to_string(),
        execution_id: self.execution_id,
        started_at: self.started_at,
      };
      tokio::spawn(CURRENT_EXECUTION_CONTEXT.scope(context, async move { task.run().await }))
    };
    #[cfg(not(feature = "job_context"))]
    let handle = tokio::spawn(async move { task.run().await });

    match handle.await {
      Ok(Ok(())) => {
        JobMetrics::incr(&metrics.executions_succeeded);
        logger.info(format_args!("JOB={} Finished task.", name));
        ExecutionOutcome::Succeeded
      }
      Ok(Err(e)) => {
        JobMetrics::incr(&metrics.executions_failed);
        logger.error(format_args!("JOB={} Error during task execution: {}.", name, e));
        ExecutionOutcome::Failed
      }
      Err(join_error) if join_error.is_panic() => {
        JobMetrics::incr(&metrics.executions_panicked);
        logger.error(format_args!(
          "JOB={} Task panicked during execution {}.",
          name, self.execution_id
        ));
        ExecutionOutcome::Panicked
      }
      Err(_) => {
        // Only happens while the runtime itself is shutting down.
        warn!(execution_id = %self.execution_id, "Task was cancelled during execution.");
        JobMetrics::incr(&metrics.executions_failed);
        ExecutionOutcome::Cancelled
      }
    }
  }

  fn finish(self) {
    let now = Utc::now();
    let skipped = {
      let mut meta = self.shared.meta.lock();
      meta.in_progress = false;
      let (next_run, skipped) = advance_past(meta.next_run, meta.interval, now);
      meta.next_run = next_run;
      skipped
    };

    if skipped > 0 {
      self
        .shared
        .metrics
        .ticks_skipped_overrun
        .fetch_add(skipped, AtomicOrdering::Relaxed);
      debug!(skipped, "Execution overran its interval; skipped missed slots.");
    }

    // Leave the guard last, after the metadata reflects completion.
    drop(self.permit);
  }
}
