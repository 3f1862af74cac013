//! Run Observability
//!
//! The sink the engine reports into: every slot step and every module
//! enable/disable transition is bracketed and delivered as a [`RunEvent`]
//! carrying the chain name, slot index, run id and duration.

use std::time::Duration;

use log::{debug, error, warn};

use crate::module::RunId;

/// Kind of step applied to a slot during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// The module's unit of work followed by its own input cleanup.
    Exec,
    /// Cleanup only, for slots reached after an earlier slot failed.
    Cleanup,
}

/// What the engine observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A normal step finished (module exec plus its own cleanup).
    ExecCompleted,
    /// A normal step failed; the run switches to cleanup from here on.
    ExecFailed,
    /// A cleanup step finished.
    CleanupCompleted,
    /// The module acquired its resources.
    Enabled,
    /// The module failed to acquire its resources.
    EnableFailed,
    /// The module released its resources.
    Disabled,
    /// The module reported a failure while releasing resources.
    DisableFailed,
}

/// A single observation reported by the engine.
#[derive(Debug, Clone)]
pub struct RunEvent {
    /// Name of the chain that produced the event.
    pub chain: String,
    /// Slot index within the chain.
    pub slot: usize,
    /// Module instance occupying the slot.
    pub module: String,
    /// Run identifier, absent for enable/disable transitions.
    pub run_id: Option<RunId>,
    /// What happened.
    pub kind: EventKind,
    /// Duration of the bracketed operation.
    pub duration: Duration,
}

/// Sink for engine observations.
///
/// Implementations must tolerate concurrent calls from overlapping runs.
pub trait RunObserver: Send + Sync {
    /// Records one event.
    fn record(&self, event: RunEvent);
}

/// Default observer forwarding every event to the log facade.
#[derive(Debug, Default)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn record(&self, event: RunEvent) {
        match event.kind {
            EventKind::ExecCompleted => debug!(
                "chain '{}' run {} slot {} '{}': exec completed in {:.2?}",
                event.chain,
                event.run_id.unwrap_or_default(),
                event.slot,
                event.module,
                event.duration
            ),
            EventKind::ExecFailed => error!(
                "chain '{}' run {} slot {} '{}': exec failed after {:.2?}",
                event.chain,
                event.run_id.unwrap_or_default(),
                event.slot,
                event.module,
                event.duration
            ),
            EventKind::CleanupCompleted => debug!(
                "chain '{}' run {} slot {} '{}': cleanup completed in {:.2?}",
                event.chain,
                event.run_id.unwrap_or_default(),
                event.slot,
                event.module,
                event.duration
            ),
            EventKind::Enabled => debug!(
                "chain '{}' slot {} '{}': enabled in {:.2?}",
                event.chain, event.slot, event.module, event.duration
            ),
            EventKind::EnableFailed => error!(
                "chain '{}' slot {} '{}': enable failed after {:.2?}",
                event.chain, event.slot, event.module, event.duration
            ),
            EventKind::Disabled => debug!(
                "chain '{}' slot {} '{}': disabled in {:.2?}",
                event.chain, event.slot, event.module, event.duration
            ),
            EventKind::DisableFailed => warn!(
                "chain '{}' slot {} '{}': disable failed after {:.2?}",
                event.chain, event.slot, event.module, event.duration
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_observer_accepts_all_kinds() {
        let observer = LogObserver;
        let kinds = [
            EventKind::ExecCompleted,
            EventKind::ExecFailed,
            EventKind::CleanupCompleted,
            EventKind::Enabled,
            EventKind::EnableFailed,
            EventKind::Disabled,
            EventKind::DisableFailed,
        ];

        for kind in kinds {
            observer.record(RunEvent {
                chain: "c".to_string(),
                slot: 0,
                module: "m".to_string(),
                run_id: Some(1),
                kind,
                duration: Duration::from_millis(1),
            });
        }
    }
}
