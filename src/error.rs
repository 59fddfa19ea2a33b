use thiserror::Error;

/// Errors that can occur while building a job with `JobBuilder` or `Job::new`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
  #[error("Job interval (`interval`) must be specified")]
  MissingInterval,
  #[error("Job interval must be greater than zero")]
  ZeroInterval,
  #[error("No Tokio runtime available on the calling thread to host the job loop")]
  NoRuntime,
}

// --- Control Errors ---

/// Errors related to runtime control requests
/// (`update_interval`, `run_now`, `trigger`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
  #[error("Job loop has exited (job stopped or its loop panicked).")]
  Stopped,
  #[error("Job interval must be greater than zero")]
  ZeroInterval,
  #[error("Job loop did not respond to the request (loop exited before answering).")]
  ResponseFailed,
}

// --- Stop Errors ---

/// Errors related to stopping a job (`stop`, `stop_timeout`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StopError {
  /// A job may only be stopped once; the loop is already gone.
  #[error("Job was already stopped.")]
  AlreadyStopped,
  #[error("Timed out waiting for the job loop (and its in-flight execution) to finish.")]
  Timeout,
  #[error("The job loop panicked while shutting down.")]
  LoopPanic,
}
