//! tests/common.rs
//! Shared helper functions for integration tests.
#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use parking_lot::Mutex;
use pacekeeper::{BoxedRunFn, FnTask, Logger, TaskError, TaskResult};

// Initializes tracing subscriber for test output.
pub fn setup_tracing() {
  // Use try_init to avoid panic if called multiple times
  let _ = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_test_writer()
    .try_init();
}

// Asserts `actual` is within `tolerance` of `expected` (timer jitter).
pub fn assert_close(actual: usize, expected: usize, tolerance: usize, what: &str) {
  assert!(
    actual + tolerance >= expected && actual <= expected + tolerance,
    "{}: expected {} (+/- {}), got {}",
    what,
    expected,
    tolerance,
    actual
  );
}

// Creates a task function that increments a counter, optionally delays,
// and then succeeds or fails.
pub fn task_exec_counter_result(
  counter: Arc<AtomicUsize>,
  delay: StdDuration,
  succeeds: bool,
) -> BoxedRunFn {
  Box::new(move || {
    let ctr = counter.clone();
    Box::pin(async move {
      let count = ctr.fetch_add(1, Ordering::SeqCst) + 1;
      tracing::debug!(
        "Counter task executing (Count: {}, WillSucceed: {})",
        count,
        succeeds
      );
      if delay > StdDuration::ZERO {
        tokio::time::sleep(delay).await;
      }
      let result: TaskResult = if succeeds {
        Ok(())
      } else {
        Err(anyhow::anyhow!("counter task failed on run {}", count).into())
      };
      result
    })
  })
}

pub fn counter_task(counter: Arc<AtomicUsize>, delay: StdDuration) -> FnTask {
  FnTask::new(
    1,
    "counter",
    task_exec_counter_result(counter, delay, true),
  )
}

// Creates a task function that sets a flag once it has finished sleeping.
pub fn task_exec_flag(flag: Arc<AtomicBool>, delay: StdDuration) -> BoxedRunFn {
  Box::new(move || {
    let flg = flag.clone();
    Box::pin(async move {
      tracing::debug!("Flag task executing");
      if delay > StdDuration::ZERO {
        tokio::time::sleep(delay).await;
      }
      flg.store(true, Ordering::SeqCst);
      tracing::debug!("Flag task set flag to true");
      Ok::<(), TaskError>(())
    })
  })
}

// Creates a task function that panics.
pub fn task_exec_panic(counter: Arc<AtomicUsize>) -> BoxedRunFn {
  Box::new(move || {
    let ctr = counter.clone();
    Box::pin(async move {
      let count = ctr.fetch_add(1, Ordering::SeqCst) + 1;
      tracing::debug!("Panic task executing...");
      tokio::task::yield_now().await;
      if count > 0 {
        panic!("Task forced panic!");
      }
      Ok::<(), TaskError>(())
    })
  })
}

// Creates a task function for overlap testing.
// Increments active count on start, decrements on end. Updates max observed.
pub fn task_exec_concurrency_tracker(
  active_counter: Arc<AtomicUsize>,
  max_observed_active: Arc<AtomicUsize>,
  delay: StdDuration,
) -> BoxedRunFn {
  Box::new(move || {
    let active = active_counter.clone();
    let max_obs = max_observed_active.clone();
    Box::pin(async move {
      let current_active = active.fetch_add(1, Ordering::SeqCst) + 1;
      tracing::debug!("Concurrency task START (Active: {})", current_active);

      max_obs.fetch_max(current_active, Ordering::SeqCst);

      if delay > StdDuration::ZERO {
        tokio::time::sleep(delay).await;
      }

      let current_active_after = active.fetch_sub(1, Ordering::SeqCst) - 1;
      tracing::debug!("Concurrency task END (Active: {})", current_active_after);
      Ok::<(), TaskError>(())
    })
  })
}

// A logger that keeps every message so tests can inspect them.
#[derive(Default)]
pub struct RecordingLogger {
  infos: Mutex<Vec<String>>,
  errors: Mutex<Vec<String>>,
}

impl RecordingLogger {
  pub fn infos(&self) -> Vec<String> {
    self.infos.lock().clone()
  }

  pub fn errors(&self) -> Vec<String> {
    self.errors.lock().clone()
  }

  pub fn infos_containing(&self, needle: &str) -> usize {
    self.infos.lock().iter().filter(|l| l.contains(needle)).count()
  }
}

impl Logger for RecordingLogger {
  fn info(&self, args: fmt::Arguments<'_>) {
    self.infos.lock().push(args.to_string());
  }

  fn error(&self, args: fmt::Arguments<'_>) {
    self.errors.lock().push(args.to_string());
  }
}
