use super::ExecutionId;

use chrono::{DateTime, Utc};

/// Contextual information available to a running task via task-locals.
/// Accessible inside [`Task::run`](super::Task::run) using
/// `try_get_execution_context()` or the `execution_context!()` macro when the
/// `job_context` feature is enabled.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
  /// `Task::id()` of the task being executed.
  pub task_id: i64,
  /// `Task::name()` of the task being executed.
  pub task_name: String,
  /// The unique ID of this specific execution.
  pub execution_id: ExecutionId,
  /// When the execution was started (the job's `last_run`).
  pub started_at: DateTime<Utc>,
}

tokio::task_local! {
    /// Provides access to the current `ExecutionContext` within a task's execution scope.
    /// Set by the job before the task's future is polled.
    pub static CURRENT_EXECUTION_CONTEXT: ExecutionContext;
}

/// Attempts to retrieve the `ExecutionContext` of the running execution.
///
/// Returns `None` when called outside a task started by a job.
pub fn try_get_execution_context() -> Option<ExecutionContext> {
  CURRENT_EXECUTION_CONTEXT.try_with(|ctx| ctx.clone()).ok()
}

/// Retrieves the current `ExecutionContext`, panicking if called outside a
/// task started by a job.
///
/// Use `try_get_execution_context()` for optional access.
///
/// # Panics
/// Panics if the `CURRENT_EXECUTION_CONTEXT` task local has not been set.
#[macro_export]
macro_rules! execution_context {
  () => {
    $crate::job::context::CURRENT_EXECUTION_CONTEXT.with(|ctx| ctx.clone())
  };
}
