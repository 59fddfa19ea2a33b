// file: tests/trigger.rs
//! Tests for manual triggers (`run_now` and `trigger`).

mod common;

use crate::common::{counter_task, setup_tracing, RecordingLogger};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration as StdDuration;
use pacekeeper::{Job, Logger, TriggerOutcome};

#[tokio::test(start_paused = true)]
async fn test_run_now_with_long_interval() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));

  // Would not run for one hour, hence we trigger it manually.
  let job = Job::new(
    counter_task(counter.clone(), StdDuration::from_secs(1)),
    None,
    StdDuration::from_secs(3600),
  )
  .unwrap();
  tokio::time::sleep(StdDuration::from_millis(15)).await;
  assert!(!job.in_progress(), "Job should not be in progress yet");
  assert!(job.last_run().is_none());

  job.run_now().await.expect("RunNow failed");
  tokio::time::sleep(StdDuration::from_millis(15)).await;
  assert!(job.in_progress(), "Job should be running now");
  assert!(job.last_run().is_some());

  tokio::time::sleep(StdDuration::from_secs(2)).await;
  assert!(!job.in_progress(), "Execution should have finished");
  assert_eq!(counter.load(Ordering::SeqCst), 1);
  assert_eq!(job.metrics().manual_triggers_received, 1);

  job.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_run_now_while_running_is_dropped() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = Job::new(
    counter_task(counter.clone(), StdDuration::from_millis(500)),
    None,
    StdDuration::from_secs(3600),
  )
  .unwrap();

  job.run_now().await.unwrap();
  tokio::time::sleep(StdDuration::from_millis(10)).await;
  for _ in 0..5 {
    job.run_now().await.unwrap();
  }
  tokio::time::sleep(StdDuration::from_secs(1)).await;

  // The extra triggers were not queued up behind the running execution.
  assert_eq!(counter.load(Ordering::SeqCst), 1);
  let metrics = job.metrics();
  assert_eq!(metrics.manual_triggers_received, 6);
  assert_eq!(metrics.skipped_in_progress, 5);

  job.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_trigger_reports_outcome() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = Job::new(
    counter_task(counter.clone(), StdDuration::from_millis(200)),
    None,
    StdDuration::from_secs(3600),
  )
  .unwrap();

  assert_eq!(job.trigger().await.unwrap(), TriggerOutcome::Started);
  assert_eq!(job.trigger().await.unwrap(), TriggerOutcome::SkippedInProgress);

  tokio::time::sleep(StdDuration::from_millis(300)).await;
  job.pause();
  assert_eq!(job.trigger().await.unwrap(), TriggerOutcome::SkippedPaused);

  job.resume();
  let outcome = job.trigger().await.unwrap();
  assert!(outcome.started());

  tokio::time::sleep(StdDuration::from_millis(300)).await;
  assert_eq!(counter.load(Ordering::SeqCst), 2);

  job.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_trigger_messages_go_to_logger() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let logger = Arc::new(RecordingLogger::default());
  let job = Job::new(
    counter_task(counter.clone(), StdDuration::from_millis(100)),
    Some(logger.clone() as Arc<dyn Logger>),
    StdDuration::from_secs(3600),
  )
  .unwrap();

  job.trigger().await.unwrap();
  job.trigger().await.unwrap();
  tokio::time::sleep(StdDuration::from_millis(150)).await;
  job.pause();
  job.trigger().await.unwrap();
  job.stop().await.unwrap();

  assert_eq!(logger.infos_containing("Initialized"), 1);
  assert_eq!(logger.infos_containing("Received manual trigger"), 3);
  assert_eq!(logger.infos_containing("Starting task"), 1);
  assert_eq!(logger.infos_containing("Task is still in progress"), 1);
  assert_eq!(logger.infos_containing("Finished task"), 1);
  assert_eq!(logger.infos_containing("Job paused"), 1);
  assert_eq!(logger.infos_containing("Job is disabled"), 1);
  assert_eq!(logger.infos_containing("Stopping job"), 1);
  assert!(logger.errors().is_empty());
  assert!(logger.infos().iter().all(|line| line.contains("JOB=counter")));
}
