//! Pacekeeper: A Per-Task Recurring Job Runner
//!
//! Runs a unit of work on a fixed interval inside a Tokio application and keeps
//! it controllable at runtime: pause, resume, retime, trigger manually, stop
//! gracefully. Built for long-lived background duties such as periodically
//! rescanning a media library.
//!
//! # Features
//!
//! - One background loop per [`Job`], driven by a periodic timer, manual
//!   triggers, interval changes and a stop signal.
//! - No overlapping executions: a trigger that finds the task still running is
//!   dropped and logged, never queued.
//! - Skip, don't queue: an execution that overruns its interval moves the next
//!   run past every missed slot instead of causing a burst of catch-up runs.
//! - Pause/resume gates executions without stopping the timer.
//! - Graceful stop that waits for the in-flight execution (with optional timeout).
//! - Task failures and panics are logged through the optional [`Logger`] and
//!   never stop the schedule.
//! - Status snapshots ([`JobStatus`]) and per-job metrics ([`MetricsSnapshot`]).
//! - A thread-safe [`Service`] registry aggregating jobs.
//! - Optional task-local execution context (`job_context` feature, on by default).
//! - Optional Serde support for public snapshot types (`serde` feature).
//!
//! # Usage
//!
//! ```no_run
//! use pacekeeper::{async_trait, Job, Service, Task, TaskResult, TracingLogger};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct LibraryScan;
//!
//! #[async_trait]
//! impl Task for LibraryScan {
//!     async fn run(&self) -> TaskResult {
//!         // ... walk the library ...
//!         Ok(())
//!     }
//!     fn id(&self) -> i64 { 1 }
//!     fn name(&self) -> &str { "library-scan" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Service::new();
//!     let scan = Arc::new(Job::new(
//!         LibraryScan,
//!         Some(Arc::new(TracingLogger)),
//!         Duration::from_secs(15 * 60),
//!     )?);
//!     service.add_job(scan.clone());
//!
//!     // Rescan right away, then every 5 minutes.
//!     scan.run_now().await?;
//!     scan.update_interval(Duration::from_secs(5 * 60)).await?;
//!
//!     for status in service.statuses() {
//!         println!("{} next run at {}", status.name, status.next_run);
//!     }
//!
//!     service.stop_all().await;
//!     Ok(())
//! }
//! ```
//!
//! # Observability
//!
//! - Job messages go to the [`Logger`] given at construction; [`TracingLogger`]
//!   forwards them to `tracing`.
//! - Every execution runs inside an `execution` tracing span carrying the task
//!   id, task name, execution id and trigger source.
//! - [`Job::metrics`] returns counters for executions, failures, panics and
//!   skipped triggers.

// --- Feature-gated Documentation ---

#[cfg(all(doc, feature = "job_context"))]
pub mod job_context_docs {
  //! # Accessing the Execution Context (`job_context` feature)
  //!
  //! Inside [`Task::run`](crate::Task::run) the running execution can be
  //! identified through Tokio's task-local context:
  //!
  //! 1.  **`try_get_execution_context() -> Option<ExecutionContext>`**: returns
  //!     `None` when called outside a job execution.
  //! 2.  **`execution_context!() -> ExecutionContext`**: **panics** outside a
  //!     job execution.
  //!
  //! ```no_run
  //! use pacekeeper::{task_fn, try_get_execution_context, FnTask};
  //!
  //! let task = FnTask::new(3, "thumbnailer", task_fn!({
  //!     if let Some(ctx) = try_get_execution_context() {
  //!         println!("execution {} of {}", ctx.execution_id, ctx.task_name);
  //!     }
  //!     Ok(())
  //! }));
  //! ```
}

pub mod command;
mod coordinator;
pub mod error;
pub mod job;
pub mod logger;
mod macros;
pub mod metrics;
pub mod scheduler;
pub mod service;
mod worker;

// --- Public Re-exports ---

pub use async_trait::async_trait;

pub use command::TriggerOutcome;
pub use error::{BuildError, ControlError, StopError};
pub use job::{BoxedRunFn, ExecutionId, FnTask, JobState, JobStatus, Task, TaskError, TaskResult};
pub use logger::{Logger, TracingLogger};
pub use metrics::MetricsSnapshot;
pub use scheduler::{Job, JobBuilder, DEFAULT_COMMAND_BUFFER};
pub use service::Service;

#[cfg(feature = "job_context")]
pub use job::context::{try_get_execution_context, ExecutionContext};
