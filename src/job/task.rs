use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

/// Error returned by a failing task. Opaque to the job; it is only logged.
pub type TaskError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type TaskResult = Result<(), TaskError>;

/// The function type wrapped by [`FnTask`].
///
/// It is called once per execution and must return a `'static` future, so
/// anything the future needs has to be cloned into it (see [`task_fn!`](crate::task_fn)).
pub type BoxedRunFn =
  Box<dyn Fn() -> Pin<Box<dyn Future<Output = TaskResult> + Send + 'static>> + Send + Sync + 'static>;

/// The unit of work a [`Job`](crate::Job) drives.
///
/// `run` may take arbitrarily long; it executes on its own Tokio task and never
/// blocks the job's scheduling loop. A returned error is logged through the
/// job's logger and otherwise ignored, and a panic is caught and logged the
/// same way. `id` and `name` only label log lines, spans and status snapshots.
#[async_trait]
pub trait Task: Send + Sync + 'static {
  async fn run(&self) -> TaskResult;

  fn id(&self) -> i64;

  fn name(&self) -> &str;
}

/// A [`Task`] built from a closure.
pub struct FnTask {
  id: i64,
  name: String,
  run_fn: BoxedRunFn,
}

impl FnTask {
  pub fn new<F>(id: i64, name: impl Into<String>, run_fn: F) -> Self
  where
    F: Fn() -> Pin<Box<dyn Future<Output = TaskResult> + Send + 'static>> + Send + Sync + 'static,
  {
    Self {
      id,
      name: name.into(),
      run_fn: Box::new(run_fn),
    }
  }
}

#[async_trait]
impl Task for FnTask {
  async fn run(&self) -> TaskResult {
    (self.run_fn)().await
  }

  fn id(&self) -> i64 {
    self.id
  }

  fn name(&self) -> &str {
    &self.name
  }
}

// Manual implementation of Debug since the closure cannot be printed.
impl fmt::Debug for FnTask {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FnTask")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("run_fn", &format_args!("<Fn>"))
      .finish()
  }
}
