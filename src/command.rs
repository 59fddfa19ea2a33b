use std::time::Duration;

use tokio::sync::oneshot;

/// What happened to a manual trigger requested through [`Job::trigger`](crate::Job::trigger).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerOutcome {
  /// The guard was free and an execution was started.
  Started,
  /// The job is paused; the trigger was dropped.
  SkippedPaused,
  /// An execution is still running; the trigger was dropped, not queued.
  SkippedInProgress,
}

impl TriggerOutcome {
  pub fn started(&self) -> bool {
    matches!(self, TriggerOutcome::Started)
  }
}

/// Commands sent from the `Job` handle to its background loop.
///
/// The stop request travels on a separate `watch` channel so it is never
/// stuck behind queued commands.
#[derive(Debug)]
pub(crate) enum JobCommand {
  /// Fire-and-forget manual trigger.
  RunNow,
  /// Manual trigger that reports its outcome back to the caller.
  Trigger {
    responder: oneshot::Sender<TriggerOutcome>,
  },
  /// Replace the periodic timer and reset the next run to `now + interval`.
  UpdateInterval(Duration),
}

/// Where a trigger came from. Only used for logging and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerSource {
  Timer,
  Manual,
}

impl TriggerSource {
  pub(crate) fn as_str(&self) -> &'static str {
    match self {
      TriggerSource::Timer => "timer",
      TriggerSource::Manual => "manual",
    }
  }
}
