//! Run Timeline
//!
//! A recording observer: keeps every engine event with its offset from
//! timeline creation, for end-of-run reports and for asserting ordering
//! and pipelining properties in tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::module::RunId;
use crate::monitoring::observe::{EventKind, RunEvent, RunObserver};

/// An engine event plus its offset from timeline creation.
#[derive(Debug, Clone)]
pub struct TimedEvent {
    /// Offset from the moment the timeline was created.
    pub at: Duration,
    /// The recorded event.
    pub event: RunEvent,
}

/// Aggregate counters over a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineCounts {
    /// Normal steps that completed.
    pub exec_steps: usize,
    /// Cleanup steps that completed.
    pub cleanup_steps: usize,
    /// Steps that failed.
    pub failures: usize,
    /// Distinct run ids observed.
    pub runs: usize,
}

/// Records engine events in arrival order.
///
/// Thread-safe; share one instance between the chains of a system to get
/// a single interleaved record of everything that happened.
pub struct RunTimeline {
    events: Mutex<Vec<TimedEvent>>,
    start_time: Instant,
}

impl RunTimeline {
    /// Creates a timeline starting now.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            start_time: Instant::now(),
        }
    }

    /// Returns a snapshot of all recorded events.
    pub fn events(&self) -> Vec<TimedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the events belonging to one run, in arrival order.
    pub fn events_for_run(&self, run_id: RunId) -> Vec<TimedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|timed| timed.event.run_id == Some(run_id))
            .cloned()
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// True if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }

    /// Elapsed time since the timeline was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Aggregate counters over all recorded events.
    pub fn counts(&self) -> TimelineCounts {
        let events = self.events.lock().unwrap();
        let mut counts = TimelineCounts::default();
        let mut runs = std::collections::HashSet::new();

        for timed in events.iter() {
            match timed.event.kind {
                EventKind::ExecCompleted => counts.exec_steps += 1,
                EventKind::CleanupCompleted => counts.cleanup_steps += 1,
                EventKind::ExecFailed | EventKind::EnableFailed | EventKind::DisableFailed => {
                    counts.failures += 1
                }
                EventKind::Enabled | EventKind::Disabled => {}
            }
            if let Some(run_id) = timed.event.run_id {
                runs.insert(run_id);
            }
        }

        counts.runs = runs.len();
        counts
    }

    /// Renders a per-chain report of steps, failures and runs.
    pub fn summary(&self) -> String {
        let events = self.events.lock().unwrap();
        let mut per_chain: BTreeMap<String, TimelineCounts> = BTreeMap::new();
        let mut chain_runs: BTreeMap<String, std::collections::HashSet<RunId>> = BTreeMap::new();

        for timed in events.iter() {
            let counts = per_chain.entry(timed.event.chain.clone()).or_default();
            match timed.event.kind {
                EventKind::ExecCompleted => counts.exec_steps += 1,
                EventKind::CleanupCompleted => counts.cleanup_steps += 1,
                EventKind::ExecFailed | EventKind::EnableFailed | EventKind::DisableFailed => {
                    counts.failures += 1
                }
                EventKind::Enabled | EventKind::Disabled => {}
            }
            if let Some(run_id) = timed.event.run_id {
                chain_runs
                    .entry(timed.event.chain.clone())
                    .or_default()
                    .insert(run_id);
            }
        }

        let mut output = String::from("Execution summary:\n");
        if per_chain.is_empty() {
            output.push_str("  (no events recorded)\n");
            return output;
        }

        for (chain, counts) in &per_chain {
            let runs = chain_runs.get(chain).map_or(0, |set| set.len());
            output.push_str(&format!(
                "  {}: {} runs, {} exec steps, {} cleanup steps, {} failures\n",
                chain, runs, counts.exec_steps, counts.cleanup_steps, counts.failures
            ));
        }
        output
    }
}

impl Default for RunTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl RunObserver for RunTimeline {
    fn record(&self, event: RunEvent) {
        let timed = TimedEvent {
            at: self.start_time.elapsed(),
            event,
        };
        self.events.lock().unwrap().push(timed);
    }
}
