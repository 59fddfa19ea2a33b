use crate::command::{JobCommand, TriggerOutcome};
use crate::coordinator::JobLoop;
use crate::error::{BuildError, ControlError, StopError};
use crate::job::{JobShared, JobState, JobStatus, Task};
use crate::logger::{JobLogger, Logger};
use crate::metrics::MetricsSnapshot;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

pub const DEFAULT_COMMAND_BUFFER: usize = 16;

/// Configures and starts a [`Job`].
///
/// # Example
///
/// ```no_run
/// use pacekeeper::{task_fn, FnTask, Job, TracingLogger};
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let task = FnTask::new(7, "library-scan", task_fn!({ Ok(()) }));
/// let job = Job::builder(task)
///     .interval(Duration::from_secs(300))
///     .logger(TracingLogger)
///     .start_paused(true) // Optional: hold executions until `resume()`
///     .build()?;
/// # job.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct JobBuilder {
  task: Arc<dyn Task>,
  logger: Option<Arc<dyn Logger>>,
  interval: Option<Duration>,
  start_paused: bool,
  command_buffer_size: usize,
}

impl JobBuilder {
  /// Creates a builder with default settings.
  /// - `interval`: Not set (required).
  /// - `logger`: None (quiet job).
  /// - `start_paused`: false.
  /// - `command_buffer_size`: [`DEFAULT_COMMAND_BUFFER`].
  pub fn new<T: Task>(task: T) -> Self {
    Self::from_shared(Arc::new(task))
  }

  /// Like [`JobBuilder::new`] for a task that is already shared.
  pub fn from_shared(task: Arc<dyn Task>) -> Self {
    Self {
      task,
      logger: None,
      interval: None,
      start_paused: false,
      command_buffer_size: DEFAULT_COMMAND_BUFFER,
    }
  }

  /// Sets the period between executions (required, must be non-zero).
  pub fn interval(mut self, interval: Duration) -> Self {
    self.interval = Some(interval);
    self
  }

  /// Sets the sink for the job's messages.
  pub fn logger<L: Logger + 'static>(mut self, logger: L) -> Self {
    self.logger = Some(Arc::new(logger));
    self
  }

  /// Sets (or clears) an already shared logger.
  pub fn shared_logger(mut self, logger: Option<Arc<dyn Logger>>) -> Self {
    self.logger = logger;
    self
  }

  /// Starts the job in the `Disabled` state. The timer still runs.
  pub fn start_paused(mut self, paused: bool) -> Self {
    self.start_paused = paused;
    self
  }

  /// Sets the capacity of the channel carrying `run_now`, `trigger` and
  /// `update_interval` requests to the loop. Callers wait when it is full.
  pub fn command_buffer_size(mut self, size: usize) -> Self {
    self.command_buffer_size = size.max(1);
    self
  }

  /// Validates the configuration and spawns the job's loop onto the current
  /// Tokio runtime. Never waits for an execution.
  ///
  /// # Errors
  ///
  /// - [`BuildError::MissingInterval`]: `interval` was not set.
  /// - [`BuildError::ZeroInterval`]: `interval` is zero.
  /// - [`BuildError::NoRuntime`]: called outside a Tokio runtime.
  pub fn build(self) -> Result<Job, BuildError> {
    let interval = self.interval.ok_or(BuildError::MissingInterval)?;
    if interval.is_zero() {
      return Err(BuildError::ZeroInterval);
    }
    let runtime = Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

    let state = if self.start_paused {
      JobState::Disabled
    } else {
      JobState::Enabled
    };
    let shared = Arc::new(JobShared::new(
      self.task,
      JobLogger::new(self.logger),
      interval,
      state,
    ));

    let (cmd_tx, cmd_rx) = mpsc::channel::<JobCommand>(self.command_buffer_size);
    let (stop_tx, stop_rx) = watch::channel(false);

    let job_loop = JobLoop::new(shared.clone(), cmd_rx, stop_rx);
    let loop_handle = runtime.spawn(job_loop.run());
    debug!(job = shared.name(), ?interval, ?state, "Job loop spawned.");

    Ok(Job {
      shared,
      cmd_tx,
      stop_tx,
      loop_handle: Mutex::new(Some(loop_handle)),
    })
  }
}

impl fmt::Debug for JobBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JobBuilder")
      .field("task_id", &self.task.id())
      .field("task_name", &self.task.name())
      .field("logger", &self.logger.is_some())
      .field("interval", &self.interval)
      .field("start_paused", &self.start_paused)
      .field("command_buffer_size", &self.command_buffer_size)
      .finish()
  }
}

/// A task running on a fixed interval.
///
/// The job owns a background loop on the Tokio runtime it was built on. At
/// most one execution of its task runs at any time, whatever mix of ticks and
/// manual triggers arrives; triggers that find an execution in progress are
/// dropped, not queued. All control methods talk to the loop through channels
/// and all accessors read a lock-protected snapshot, so a `Job` can be shared
/// freely (`Arc<Job>`).
///
/// Stop a job exactly once with [`Job::stop`]. Dropping an unstopped job also
/// ends its loop, but without waiting for an in-flight execution.
pub struct Job {
  shared: Arc<JobShared>,
  cmd_tx: mpsc::Sender<JobCommand>,
  stop_tx: watch::Sender<bool>,
  loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Job {
  /// Creates and starts a job for `task`, running every `interval`.
  /// A `None` logger keeps the job quiet.
  pub fn new<T: Task>(
    task: T,
    logger: Option<Arc<dyn Logger>>,
    interval: Duration,
  ) -> Result<Job, BuildError> {
    JobBuilder::new(task)
      .shared_logger(logger)
      .interval(interval)
      .build()
  }

  /// Returns a builder to configure and create a `Job`.
  pub fn builder<T: Task>(task: T) -> JobBuilder {
    JobBuilder::new(task)
  }

  // --- Lifecycle ---

  /// Stops the job and waits until its loop has exited, including the
  /// cleanup of an execution that is still running. The running execution
  /// is not interrupted.
  ///
  /// # Errors
  ///
  /// - [`StopError::AlreadyStopped`]: `stop` was called before.
  /// - [`StopError::LoopPanic`]: the loop panicked.
  pub async fn stop(&self) -> Result<(), StopError> {
    self.stop_inner(None).await
  }

  /// Like [`Job::stop`], but gives up waiting after `timeout`.
  ///
  /// On [`StopError::Timeout`] the stop request stays in force and the loop
  /// exits on its own once the in-flight execution finishes; the job counts as
  /// stopped either way.
  pub async fn stop_timeout(&self, timeout: Duration) -> Result<(), StopError> {
    self.stop_inner(Some(timeout)).await
  }

  async fn stop_inner(&self, timeout: Option<Duration>) -> Result<(), StopError> {
    let handle = self
      .loop_handle
      .lock()
      .take()
      .ok_or(StopError::AlreadyStopped)?;

    debug!(job = self.shared.name(), "Stop requested.");
    self.stop_tx.send_replace(true);

    let joined = match timeout {
      Some(timeout) => match tokio::time::timeout(timeout, handle).await {
        Ok(joined) => joined,
        Err(_) => {
          error!(job = self.shared.name(), "Stop timed out after {:?}", timeout);
          return Err(StopError::Timeout);
        }
      },
      None => handle.await,
    };

    joined.map_err(|e| {
      error!(job = self.shared.name(), "Job loop panicked: {:?}", e);
      StopError::LoopPanic
    })
  }

  /// Whether a stop has been requested.
  pub fn is_stopped(&self) -> bool {
    *self.stop_tx.borrow()
  }

  // --- Control ---

  /// Disables the job: ticks and manual triggers no longer start executions.
  /// The timer keeps running and a running execution is not touched.
  pub fn pause(&self) {
    self.shared.set_state(JobState::Disabled);
    self
      .shared
      .logger
      .info(format_args!("JOB={} Job paused.", self.shared.name()));
  }

  /// Re-enables the job.
  pub fn resume(&self) {
    self.shared.set_state(JobState::Enabled);
    self
      .shared
      .logger
      .info(format_args!("JOB={} Job resumed.", self.shared.name()));
  }

  /// Asks the loop to restart its timer with period `interval`. The next run
  /// becomes `now + interval`; time elapsed under the old interval is
  /// discarded. This applies immediately, even while an execution is running;
  /// that execution's completion only moves the next run further forward if
  /// it has already passed.
  ///
  /// # Errors
  ///
  /// - [`ControlError::ZeroInterval`]: `interval` is zero.
  /// - [`ControlError::Stopped`]: the job was stopped.
  pub async fn update_interval(&self, interval: Duration) -> Result<(), ControlError> {
    if interval.is_zero() {
      return Err(ControlError::ZeroInterval);
    }
    self.send(JobCommand::UpdateInterval(interval)).await
  }

  /// Asks the loop for an immediate execution attempt, handled exactly like a
  /// timer tick (pause gating and overlap guard included).
  ///
  /// # Errors
  ///
  /// - [`ControlError::Stopped`]: the job was stopped.
  pub async fn run_now(&self) -> Result<(), ControlError> {
    self.send(JobCommand::RunNow).await
  }

  /// Like [`Job::run_now`], but waits for the loop to report whether the
  /// trigger started an execution.
  ///
  /// # Errors
  ///
  /// - [`ControlError::Stopped`]: the job was stopped.
  /// - [`ControlError::ResponseFailed`]: the loop exited before answering.
  pub async fn trigger(&self) -> Result<TriggerOutcome, ControlError> {
    let (responder, response_rx) = oneshot::channel();
    self.send(JobCommand::Trigger { responder }).await?;
    response_rx.await.map_err(|_| ControlError::ResponseFailed)
  }

  async fn send(&self, cmd: JobCommand) -> Result<(), ControlError> {
    if self.is_stopped() {
      return Err(ControlError::Stopped);
    }
    self
      .cmd_tx
      .send(cmd)
      .await
      .map_err(|_| ControlError::Stopped)
  }

  // --- Queries ---

  /// `Task::id()` of the job's task.
  pub fn id(&self) -> i64 {
    self.shared.task.id()
  }

  /// `Task::name()` of the job's task.
  pub fn name(&self) -> &str {
    self.shared.name()
  }

  /// When the last execution started. `None` before the first one.
  pub fn last_run(&self) -> Option<DateTime<Utc>> {
    self.shared.meta.lock().last_run
  }

  /// When the job is next due.
  pub fn next_run(&self) -> DateTime<Utc> {
    self.shared.meta.lock().next_run
  }

  /// Whether the task is executing right now.
  pub fn in_progress(&self) -> bool {
    self.shared.meta.lock().in_progress
  }

  pub fn state(&self) -> JobState {
    self.shared.state()
  }

  pub fn current_interval(&self) -> Duration {
    self.shared.meta.lock().interval
  }

  /// All schedule fields, read under one lock acquisition.
  pub fn status(&self) -> JobStatus {
    self.shared.status()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }
}

impl fmt::Debug for Job {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Job")
      .field("shared", &self.shared)
      .field("stopped", &self.is_stopped())
      .finish()
  }
}
