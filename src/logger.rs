//! The optional message sink a job reports to.
//!
//! A job never requires a logger. When none is configured the job stays
//! quiet apart from crate-internal `tracing` diagnostics at debug level.

use std::fmt;
use std::sync::Arc;

/// A sink for a job's informational and error messages.
///
/// Informational messages cover initialisation, every trigger received,
/// skipped triggers and interval changes. Errors are task failures.
pub trait Logger: Send + Sync {
  fn info(&self, args: fmt::Arguments<'_>);
  fn error(&self, args: fmt::Arguments<'_>);
}

/// Forwards job messages to the `tracing` ecosystem under the
/// `pacekeeper::job` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
  fn info(&self, args: fmt::Arguments<'_>) {
    tracing::info!(target: "pacekeeper::job", "{}", args);
  }

  fn error(&self, args: fmt::Arguments<'_>) {
    tracing::error!(target: "pacekeeper::job", "{}", args);
  }
}

/// Null-object wrapper around the optional logger.
#[derive(Clone, Default)]
pub(crate) struct JobLogger {
  inner: Option<Arc<dyn Logger>>,
}

impl JobLogger {
  pub(crate) fn new(inner: Option<Arc<dyn Logger>>) -> Self {
    Self { inner }
  }

  pub(crate) fn info(&self, args: fmt::Arguments<'_>) {
    if let Some(logger) = &self.inner {
      logger.info(args);
    }
  }

  pub(crate) fn error(&self, args: fmt::Arguments<'_>) {
    if let Some(logger) = &self.inner {
      logger.error(args);
    }
  }

  pub(crate) fn is_enabled(&self) -> bool {
    self.inner.is_some()
  }
}

impl fmt::Debug for JobLogger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("JobLogger")
      .field("enabled", &self.is_enabled())
      .finish()
  }
}
