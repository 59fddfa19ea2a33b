// file: tests/update.rs
//! Tests for `update_interval`.

mod common;

use crate::common::{assert_close, counter_task, setup_tracing};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration as StdDuration;
use pacekeeper::{ControlError, Job, TriggerOutcome};

#[tokio::test]
async fn test_update_interval_resets_next_run() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = Job::new(
    counter_task(counter.clone(), StdDuration::ZERO),
    None,
    StdDuration::from_secs(60),
  )
  .unwrap();

  tokio::time::sleep(StdDuration::from_millis(50)).await;
  let next_run = job.next_run();

  let updated_at = Utc::now();
  job
    .update_interval(StdDuration::from_secs(30))
    .await
    .expect("Update failed");
  tokio::time::sleep(StdDuration::from_millis(50)).await;

  let new_next_run = job.next_run();
  assert_ne!(next_run, new_next_run, "A new run time should have been scheduled");
  // Discards the elapsed part of the old period: now + 30s, not old next_run - 30s.
  let expected = updated_at + ChronoDuration::seconds(30);
  assert!(
    new_next_run >= expected && new_next_run <= expected + ChronoDuration::seconds(1),
    "next_run {} should be ~{}",
    new_next_run,
    expected
  );
  assert_eq!(job.current_interval(), StdDuration::from_secs(30));
  assert_eq!(counter.load(Ordering::SeqCst), 0);

  job.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_update_interval_changes_cadence() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = Job::new(
    counter_task(counter.clone(), StdDuration::ZERO),
    None,
    StdDuration::from_secs(3600),
  )
  .unwrap();

  // Nothing would run for an hour; shrink the interval.
  job.update_interval(StdDuration::from_millis(25)).await.unwrap();
  tokio::time::sleep(StdDuration::from_millis(110)).await;
  assert_close(counter.load(Ordering::SeqCst), 4, 1, "runs at 25ms cadence");

  // And back up: no further runs within the next 100ms.
  job.update_interval(StdDuration::from_secs(3600)).await.unwrap();
  let settled = counter.load(Ordering::SeqCst);
  tokio::time::sleep(StdDuration::from_millis(100)).await;
  assert_eq!(counter.load(Ordering::SeqCst), settled);

  job.stop().await.unwrap();
}

#[tokio::test]
async fn test_update_interval_rejects_zero() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = Job::new(
    counter_task(counter, StdDuration::ZERO),
    None,
    StdDuration::from_secs(60),
  )
  .unwrap();

  let result = job.update_interval(StdDuration::ZERO).await;
  assert_eq!(result, Err(ControlError::ZeroInterval));
  assert_eq!(job.current_interval(), StdDuration::from_secs(60));

  job.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_update_to_huge_interval_keeps_loop_alive() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = Job::new(
    counter_task(counter.clone(), StdDuration::ZERO),
    None,
    StdDuration::from_millis(10),
  )
  .unwrap();

  tokio::time::sleep(StdDuration::from_millis(25)).await;
  job.update_interval(StdDuration::MAX).await.unwrap();
  let settled = counter.load(Ordering::SeqCst);
  tokio::time::sleep(StdDuration::from_millis(100)).await;
  assert_eq!(counter.load(Ordering::SeqCst), settled, "No ticks after retiming to MAX");
  assert_eq!(job.current_interval(), StdDuration::MAX);

  assert_eq!(job.trigger().await.unwrap(), TriggerOutcome::Started);
  tokio::time::sleep(StdDuration::from_millis(10)).await;
  assert_eq!(counter.load(Ordering::SeqCst), settled + 1);

  job.stop().await.expect("Loop should still be running");
}

#[tokio::test]
async fn test_update_interval_applies_while_running() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = Job::new(
    counter_task(counter.clone(), StdDuration::from_millis(500)),
    None,
    StdDuration::from_secs(3600),
  )
  .unwrap();

  job.run_now().await.unwrap();
  tokio::time::sleep(StdDuration::from_millis(50)).await;
  assert!(job.in_progress());

  let updated_at = Utc::now();
  job.update_interval(StdDuration::from_secs(30)).await.unwrap();
  tokio::time::sleep(StdDuration::from_millis(20)).await;
  assert!(job.in_progress(), "Execution should still be running");
  let expected = updated_at + ChronoDuration::seconds(30);
  let next_run = job.next_run();
  assert!(
    next_run >= expected && next_run <= expected + ChronoDuration::seconds(1),
    "next_run {} should already be ~{}",
    next_run,
    expected
  );

  // Completion on time leaves the retimed value alone.
  job.stop().await.unwrap();
  assert_eq!(job.next_run(), next_run);
  assert_eq!(counter.load(Ordering::SeqCst), 1);
}
