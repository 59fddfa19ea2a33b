use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// --- Simple Histogram Implementation ---

/// A basic concurrent histogram storing count and sum.
///
/// Suitable for simple latency tracking without percentile information.
#[derive(Debug, Default)]
pub struct SimpleHistogram {
  count: AtomicUsize,
  sum_micros: AtomicUsize, // Sum of durations in microseconds
}

impl SimpleHistogram {
  /// Records a duration observation in the histogram.
  pub fn record(&self, duration: Duration) {
    self.count.fetch_add(1, Ordering::Relaxed);
    self.sum_micros.fetch_add(
      duration.as_micros().try_into().unwrap_or(usize::MAX),
      Ordering::Relaxed,
    );
  }

  /// Gets the total number of observations recorded.
  pub fn get_count(&self) -> usize {
    self.count.load(Ordering::Relaxed)
  }

  /// Gets the total sum of durations recorded (in microseconds).
  pub fn get_sum_micros(&self) -> usize {
    self.sum_micros.load(Ordering::Relaxed)
  }
}

// --- Main Metrics Struct (Internal State) ---

/// Per-job counters, shared between the job handle, its loop and its
/// execution tasks. Cloning only clones the `Arc`s.
#[derive(Debug, Clone, Default)]
pub(crate) struct JobMetrics {
  // --- Counters (Monotonically increasing) ---
  /// Timer ticks observed by the loop.
  pub ticks_received: Arc<AtomicUsize>,
  /// Manual triggers (`run_now`/`trigger`) observed by the loop.
  pub manual_triggers_received: Arc<AtomicUsize>,
  /// Executions that acquired the guard and were started.
  pub executions_started: Arc<AtomicUsize>,
  /// Executions whose task returned `Ok`.
  pub executions_succeeded: Arc<AtomicUsize>,
  /// Executions whose task returned `Err`. Also counts executions cancelled
  /// by a runtime shutdown before they could finish.
  pub executions_failed: Arc<AtomicUsize>,
  /// Executions whose task panicked.
  pub executions_panicked: Arc<AtomicUsize>,
  /// Triggers dropped because the job was paused.
  pub skipped_paused: Arc<AtomicUsize>,
  /// Triggers dropped because an execution was still running.
  pub skipped_in_progress: Arc<AtomicUsize>,
  /// Scheduled slots discarded by the catch-up skip after an overrunning execution.
  pub ticks_skipped_overrun: Arc<AtomicUsize>,
  /// Interval changes applied by the loop.
  pub interval_updates: Arc<AtomicUsize>,

  // --- Histograms/Summaries ---
  /// Execution duration of the task (in microseconds).
  pub execution_duration: Arc<SimpleHistogram>,
}

impl JobMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn incr(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  /// Creates a point-in-time snapshot of the current metric values.
  pub fn snapshot(&self) -> MetricsSnapshot {
    let order = Ordering::Relaxed;

    MetricsSnapshot {
      ticks_received: self.ticks_received.load(order),
      manual_triggers_received: self.manual_triggers_received.load(order),
      executions_started: self.executions_started.load(order),
      executions_succeeded: self.executions_succeeded.load(order),
      executions_failed: self.executions_failed.load(order),
      executions_panicked: self.executions_panicked.load(order),
      skipped_paused: self.skipped_paused.load(order),
      skipped_in_progress: self.skipped_in_progress.load(order),
      ticks_skipped_overrun: self.ticks_skipped_overrun.load(order),
      interval_updates: self.interval_updates.load(order),
      execution_duration_count: self.execution_duration.get_count(),
      execution_duration_sum_micros: self.execution_duration.get_sum_micros(),
    }
  }
}

// --- Metrics Snapshot Struct (Public Data) ---

/// A snapshot of one job's metrics at a specific point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
  // Counters
  pub ticks_received: usize,
  pub manual_triggers_received: usize,
  pub executions_started: usize,
  pub executions_succeeded: usize,
  pub executions_failed: usize,
  pub executions_panicked: usize,
  pub skipped_paused: usize,
  pub skipped_in_progress: usize,
  pub ticks_skipped_overrun: usize,
  pub interval_updates: usize,
  // Histogram Data
  pub execution_duration_count: usize,
  pub execution_duration_sum_micros: usize,
}

impl MetricsSnapshot {
  /// Executions that have run to completion, whatever their outcome.
  pub fn executions_completed(&self) -> usize {
    self.executions_succeeded + self.executions_failed + self.executions_panicked
  }

  /// Mean execution duration in microseconds. `None` if nothing completed yet.
  pub fn mean_execution_duration_micros(&self) -> Option<f64> {
    if self.execution_duration_count == 0 {
      None
    } else {
      Some(self.execution_duration_sum_micros as f64 / self.execution_duration_count as f64)
    }
  }

  /// Mean execution duration. `None` if nothing completed yet.
  pub fn mean_execution_duration(&self) -> Option<Duration> {
    self
      .mean_execution_duration_micros()
      .map(|micros| Duration::from_micros(micros as u64))
  }
}
