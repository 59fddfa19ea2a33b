use crate::command::{JobCommand, TriggerOutcome, TriggerSource};
use crate::job::{add_interval, JobShared, JobState};
use crate::metrics::JobMetrics;
use crate::worker::Execution;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info_span, trace, warn, Instrument};
use uuid::Uuid;

/// Longest period handed to the timer. Longer intervals are still valid; their
/// ticker simply never fires within a realistic process lifetime.
const MAX_TICKER_PERIOD: Duration = Duration::from_secs(86400 * 365 * 30);

/// Builds the periodic timer. The first tick fires one full period from now,
/// not immediately.
fn new_ticker(period: Duration) -> Interval {
  let period = period.min(MAX_TICKER_PERIOD);
  let now = Instant::now();
  let start = now.checked_add(period).unwrap_or_else(|| {
    warn!(?period, "Ticker start overflowed; falling back to the far future.");
    now + Duration::from_secs(86400 * 365)
  });
  let mut ticker = interval_at(start, period);
  // A late loop fires once and realigns, like a ticker dropping ticks for a slow reader.
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
  ticker
}

/// The background event loop of one job.
///
/// It is the only reader of the job's command channel, stop signal and
/// timer, and it never awaits task work while running: executions are
/// spawned and tracked, and only awaited once the loop is stopping.
pub(crate) struct JobLoop {
  shared: Arc<JobShared>,
  cmd_rx: mpsc::Receiver<JobCommand>,
  stop_rx: watch::Receiver<bool>,
  // Most recently started execution; earlier ones have released the guard already.
  in_flight: Option<JoinHandle<()>>,
}

impl JobLoop {
  pub(crate) fn new(
    shared: Arc<JobShared>,
    cmd_rx: mpsc::Receiver<JobCommand>,
    stop_rx: watch::Receiver<bool>,
  ) -> Self {
    Self {
      shared,
      cmd_rx,
      stop_rx,
      in_flight: None,
    }
  }

  /// Runs the loop until the stop signal is observed or the `Job` handle is dropped.
  pub(crate) async fn run(mut self) {
    let (period, next_run) = {
      let meta = self.shared.meta.lock();
      (meta.interval, meta.next_run)
    };
    let mut ticker = new_ticker(period);

    self.shared.logger.info(format_args!(
      "JOB={} Initialized... first run will be at {}.",
      self.shared.name(),
      next_run.to_rfc3339()
    ));

    loop {
      tokio::select! {
          biased; // Stop must win over anything else that is ready.

          changed = self.stop_rx.changed() => {
              match changed {
                  Ok(()) => {
                      if *self.stop_rx.borrow() {
                          break;
                      }
                  }
                  Err(_) => {
                      debug!(job = self.shared.name(), "Job handle dropped, loop exiting.");
                      break;
                  }
              }
          }

          maybe_cmd = self.cmd_rx.recv() => {
              match maybe_cmd {
                  Some(cmd) => self.handle_command(cmd, &mut ticker),
                  None => {
                      debug!(job = self.shared.name(), "Command channel closed, loop exiting.");
                      break;
                  }
              }
          }

          _ = ticker.tick() => {
              JobMetrics::incr(&self.shared.metrics.ticks_received);
              self.shared.logger.info(format_args!("JOB={} Received timer trigger.", self.shared.name()));
              self.try_start(TriggerSource::Timer);
          }
      }
    }

    self.shared.logger.info(format_args!("JOB={} Stopping job.", self.shared.name()));
    drop(ticker);
    self.cmd_rx.close();

    // Stop only completes once the in-flight execution has cleaned up.
    if let Some(handle) = self.in_flight.take() {
      trace!(job = self.shared.name(), "Waiting for in-flight execution before exiting.");
      if let Err(e) = handle.await {
        error!(job = self.shared.name(), "Execution task failed to join: {:?}", e);
      }
    }
    debug!(job = self.shared.name(), "Job loop exited.");
  }

  fn handle_command(&mut self, cmd: JobCommand, ticker: &mut Interval) {
    match cmd {
      JobCommand::RunNow => {
        self.note_manual_trigger();
        self.try_start(TriggerSource::Manual);
      }
      JobCommand::Trigger { responder } => {
        self.note_manual_trigger();
        let outcome = self.try_start(TriggerSource::Manual);
        if responder.send(outcome).is_err() {
          trace!(job = self.shared.name(), "Trigger caller went away before the outcome was sent.");
        }
      }
      JobCommand::UpdateInterval(interval) => {
        self.shared.logger.info(format_args!(
          "JOB={} Updating interval to {:?}.",
          self.shared.name(),
          interval
        ));
        // Old elapsed time is discarded, not prorated.
        *ticker = new_ticker(interval);
        {
          let mut meta = self.shared.meta.lock();
          meta.next_run = add_interval(Utc::now(), interval);
          meta.interval = interval;
        }
        JobMetrics::incr(&self.shared.metrics.interval_updates);
      }
    }
  }

  fn note_manual_trigger(&self) {
    JobMetrics::incr(&self.shared.metrics.manual_triggers_received);
    self
      .shared
      .logger
      .info(format_args!("JOB={} Received manual trigger.", self.shared.name()));
  }

  /// Shared trigger logic for ticks and manual triggers.
  fn try_start(&mut self, source: TriggerSource) -> TriggerOutcome {
    let name = self.shared.name();
    let metrics = &self.shared.metrics;

    if self.shared.state() == JobState::Disabled {
      JobMetrics::incr(&metrics.skipped_paused);
      self.shared.logger.info(format_args!("JOB={} Job is disabled.", name));
      return TriggerOutcome::SkippedPaused;
    }

    let permit = match self.shared.guard.clone().try_acquire_owned() {
      Ok(permit) => permit,
      Err(_) => {
        JobMetrics::incr(&metrics.skipped_in_progress);
        self
          .shared
          .logger
          .info(format_args!("JOB={} Task is still in progress.", name));
        return TriggerOutcome::SkippedInProgress;
      }
    };

    self.shared.logger.info(format_args!("JOB={} Starting task.", name));
    let now = Utc::now();
    {
      let mut meta = self.shared.meta.lock();
      meta.in_progress = true;
      meta.last_run = Some(now);
      // Provisional; corrected forward when the execution finishes late.
      meta.next_run = add_interval(now, meta.interval);
    }
    JobMetrics::incr(&metrics.executions_started);

    let execution_id = Uuid::new_v4();
    let span = info_span!(
      "execution",
      task_id = self.shared.task.id(),
      task_name = name,
      %execution_id,
      trigger = source.as_str()
    );
    let execution = Execution::new(self.shared.clone(), permit, execution_id, now, source);
    self.in_flight = Some(tokio::spawn(execution.run().instrument(span)));

    TriggerOutcome::Started
  }
}
