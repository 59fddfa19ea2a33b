//! demos/interval_job.rs
//!
//! Demonstrates basic usage of Pacekeeper:
//! - Building a job on a fixed interval with a tracing-backed logger.
//! - Triggering a run manually and retiming the job.
//! - Pausing and resuming.
//! - Listing jobs through a `Service` and stopping them all.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::info;
use pacekeeper::{task_fn, FnTask, Job, Service, TracingLogger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // --- Setup Tracing ---
  let filter = tracing_subscriber::EnvFilter::try_new("warn,pacekeeper=info,interval_job=info")
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).init();

  // --- Shared State ---
  let scans = Arc::new(AtomicUsize::new(0));

  // --- Define Job ---
  let scans_clone = scans.clone();
  let task = FnTask::new(
    1,
    "library-scan",
    task_fn!(
      {let counter = scans_clone.clone();}
      {
        let count = counter.fetch_add(1, Ordering::Relaxed) + 1;
        info!("*** Library scan #{} ***", count);
        #[cfg(feature = "job_context")]
        {
          use pacekeeper::execution_context;
          let ctx = execution_context!();
          info!("  Context: Task {}, Execution {}", ctx.task_id, ctx.execution_id);
        }
        tokio::time::sleep(StdDuration::from_millis(200)).await;
        Ok(())
      }
    ),
  );

  let scan = Arc::new(
    Job::builder(task)
      .interval(StdDuration::from_secs(2))
      .logger(TracingLogger)
      .build()?,
  );
  info!("Job built, first run at {}", scan.next_run());

  let service = Service::new();
  service.add_job(scan.clone());

  // --- Manual trigger ---
  let outcome = scan.trigger().await?;
  info!("Manual trigger outcome: {:?}", outcome);

  // A second request while the first run is busy is dropped.
  tokio::time::sleep(StdDuration::from_millis(50)).await;
  info!("Second trigger outcome: {:?}", scan.trigger().await?);

  // --- Retime ---
  tokio::time::sleep(StdDuration::from_millis(500)).await;
  scan.update_interval(StdDuration::from_millis(700)).await?;
  info!("Interval is now {:?}, next run at {}", scan.current_interval(), scan.next_run());

  tokio::time::sleep(StdDuration::from_secs(3)).await;

  // --- Pause / Resume ---
  scan.pause();
  let paused_at = scans.load(Ordering::Relaxed);
  tokio::time::sleep(StdDuration::from_secs(2)).await;
  info!(
    "While paused: {} scans before, {} after",
    paused_at,
    scans.load(Ordering::Relaxed)
  );
  scan.resume();
  tokio::time::sleep(StdDuration::from_secs(1)).await;

  // --- Status ---
  for status in service.statuses() {
    info!("Status: {:#?}", status);
  }
  info!("Metrics: {:#?}", scan.metrics());

  // --- Shutdown ---
  info!("Stopping all jobs...");
  let errors = service.stop_all().await;
  if !errors.is_empty() {
    return Err(format!("Jobs failed to stop: {:?}", errors).into());
  }
  info!("Done after {} scans.", scans.load(Ordering::Relaxed));
  Ok(())
}
