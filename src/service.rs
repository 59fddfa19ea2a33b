use crate::error::StopError;
use crate::job::JobStatus;
use crate::scheduler::Job;

use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{info, warn};

/// An ordered registry of jobs.
///
/// Pure bookkeeping: the service never drives execution, every job runs its
/// own loop. Registration order is preserved, duplicates are allowed and
/// nothing is ever removed. Registration is internally synchronised, so jobs
/// may be added from several threads.
#[derive(Debug, Default)]
pub struct Service {
  jobs: RwLock<Vec<Arc<Job>>>,
}

impl Service {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends `job` to the registry.
  pub fn add_job(&self, job: Arc<Job>) {
    self.jobs.write().push(job);
  }

  /// Snapshot of the registered jobs, in registration order.
  pub fn jobs(&self) -> Vec<Arc<Job>> {
    self.jobs.read().clone()
  }

  pub fn len(&self) -> usize {
    self.jobs.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.jobs.read().is_empty()
  }

  /// First registered job whose task has the given id.
  pub fn find(&self, task_id: i64) -> Option<Arc<Job>> {
    self.jobs.read().iter().find(|job| job.id() == task_id).cloned()
  }

  /// Status snapshot of every registered job, in registration order.
  pub fn statuses(&self) -> Vec<JobStatus> {
    self.jobs.read().iter().map(|job| job.status()).collect()
  }

  /// Stops every registered job that has not been stopped yet, concurrently,
  /// and waits for all of them. Returns the errors other than
  /// [`StopError::AlreadyStopped`].
  pub async fn stop_all(&self) -> Vec<StopError> {
    let jobs = self.jobs();
    info!(jobs = jobs.len(), "Stopping all registered jobs...");

    let results = join_all(jobs.iter().map(|job| job.stop())).await;
    let errors: Vec<StopError> = results
      .into_iter()
      .filter_map(Result::err)
      .filter(|e| *e != StopError::AlreadyStopped)
      .collect();

    if errors.is_empty() {
      info!("All jobs stopped.");
    } else {
      warn!(failed = errors.len(), "Some jobs failed to stop cleanly: {:?}", errors);
    }
    errors
  }
}
