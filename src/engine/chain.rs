//! Chain Execution Core
//!
//! Drives an ordered list of module slots through overlapping runs:
//! - every trigger flows through the slots in order (no overtaking)
//! - each slot accepts work from at most one run at a time
//! - successive runs pipeline across slots for throughput
//! - a failed step switches the rest of that run to cleanup steps
//! - enable/disable bracket module resources around triggering
//!
//! The readiness protocol uses one shared mutex/condvar pair for the
//! per-slot tickets and the in-flight counter, plus one mutex per slot
//! guarding the module instance itself. Broadcast wakeups are safe since
//! every waiter re-checks its own predicate.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

use log::{debug, error, info};
use thiserror::Error;

use crate::engine::id::IdGenerator;
use crate::module::{Module, ModuleError, RunId};
use crate::monitoring::{EventKind, LogObserver, RunEvent, RunObserver, StepKind};

/// Errors reported by chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// `exec()` was called while the chain is disabled. No run id was
    /// taken and no module was touched.
    #[error("chain '{chain}' is not enabled")]
    NotEnabled {
        /// Name of the chain.
        chain: String,
    },

    /// A module's exec step failed for one run. The cleanup cascade has
    /// already completed when this is returned.
    #[error("chain '{chain}' module '{module}' (slot {slot}) failed for run {run_id}: {source}")]
    ModuleStep {
        /// Name of the chain.
        chain: String,
        /// Module instance that failed.
        module: String,
        /// Slot index of the failing module.
        slot: usize,
        /// Run the failure belongs to.
        run_id: RunId,
        /// The original module error.
        #[source]
        source: ModuleError,
    },

    /// A module failed to enable. Previously enabled slots have been
    /// rolled back and the chain remains disabled.
    #[error("chain '{chain}' module '{module}' (slot {slot}) failed to enable: {source}")]
    ModuleEnable {
        /// Name of the chain.
        chain: String,
        /// Module instance that failed.
        module: String,
        /// Slot index of the failing module.
        slot: usize,
        /// The original module error.
        #[source]
        source: ModuleError,
    },
}

/// One fixed position in the chain.
///
/// The module instance name is cached so logs and errors never need the
/// slot lock.
struct ModuleSlot {
    name: String,
    module: Mutex<Box<dyn Module>>,
}

/// Cross-slot bookkeeping shared by all slots of one chain.
struct ChainState {
    /// For each slot, the next run ticket the slot accepts. Advances by
    /// exactly 1 per completed step, in ticket order.
    ready_run: Vec<u64>,
    /// Number of `exec()` calls between registration and completion.
    in_flight: usize,
}

/// A process chain: an ordered, fixed sequence of module slots driven
/// through overlapping runs.
///
/// Multiple threads may call [`exec`](Chain::exec) concurrently; per slot,
/// runs are serviced strictly in the order their tickets were issued, and
/// a run never reaches slot `i` before finishing slot `i - 1`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use chainrunner::engine::{Chain, IdGenerator};
///
/// # fn modules() -> Vec<Box<dyn chainrunner::Module>> { Vec::new() }
/// let generator = Arc::new(IdGenerator::new(3));
/// let chain = Chain::new("ingest", modules(), generator);
///
/// chain.enable()?;
/// chain.exec()?;
/// chain.disable();
/// # Ok::<(), chainrunner::ChainError>(())
/// ```
pub struct Chain {
    name: String,
    slots: Vec<ModuleSlot>,
    id_generator: Arc<IdGenerator>,
    /// Dense ticket counter, one per `exec()` call that passed the
    /// enabled check. Distinct from the generator-produced run id.
    next_run: AtomicU64,
    state: Mutex<ChainState>,
    state_changed: Condvar,
    enabled: AtomicBool,
    /// Serializes enable/disable transitions; never held during exec.
    lifecycle: Mutex<()>,
    observer: Arc<dyn RunObserver>,
}

impl Chain {
    /// Creates a chain over the given modules, in pipeline order.
    ///
    /// The chain owns its slots for its whole lifetime; run numbering is
    /// continuous across enable/disable cycles.
    pub fn new(
        name: impl Into<String>,
        modules: Vec<Box<dyn Module>>,
        id_generator: Arc<IdGenerator>,
    ) -> Self {
        let slots: Vec<ModuleSlot> = modules
            .into_iter()
            .map(|module| ModuleSlot {
                name: module.name().to_string(),
                module: Mutex::new(module),
            })
            .collect();

        Self {
            name: name.into(),
            state: Mutex::new(ChainState {
                ready_run: vec![0; slots.len()],
                in_flight: 0,
            }),
            slots,
            id_generator,
            next_run: AtomicU64::new(0),
            state_changed: Condvar::new(),
            enabled: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
            observer: Arc::new(LogObserver),
        }
    }

    /// Replaces the default log observer.
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Name of the chain.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of module slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the chain has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True if the chain currently accepts triggers.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Module instance names in slot order.
    pub fn module_names(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.name.as_str()).collect()
    }

    /// Triggers one run through the chain.
    ///
    /// Takes a fresh run id, then drives every slot in order. On a module
    /// failure the remaining slots (and the failing one) receive cleanup
    /// steps instead, other in-flight runs are left undisturbed, and the
    /// original module error is returned.
    pub fn exec(&self) -> Result<(), ChainError> {
        // Registered before the enabled check so a concurrent disable()
        // either fails this call or waits for it to drain; there is no
        // window where a ticketed run escapes the drain wait.
        let _in_flight = InFlightGuard::enter(self);

        if !self.enabled.load(Ordering::Acquire) {
            return Err(ChainError::NotEnabled {
                chain: self.name.clone(),
            });
        }

        let run = self.next_run.fetch_add(1, Ordering::Relaxed);
        let run_id = self.id_generator.next();
        debug!(
            "chain '{}': run {} ticketed with id {}",
            self.name, run, run_id
        );

        for index in 0..self.slots.len() {
            if let Err(err) = self.process_slot(index, run, run_id, StepKind::Exec) {
                self.cleanup_sweep(run, run_id);
                error!(
                    "chain '{}': run {} (id {}) aborted: {}",
                    self.name, run, run_id, err
                );
                return Err(err);
            }
        }

        debug!("chain '{}': run {} (id {}) completed", self.name, run, run_id);
        Ok(())
    }

    /// Enables every module in slot order.
    ///
    /// No-op if already enabled. If a module fails, the slots enabled
    /// before it are disabled again, the chain stays disabled, and the
    /// module's error is returned.
    pub fn enable(&self) -> Result<(), ChainError> {
        let _lifecycle = self.lifecycle.lock().unwrap();
        if self.enabled.load(Ordering::Acquire) {
            return Ok(());
        }

        // Execs cannot be in flight while disabled; the wait costs
        // nothing when the count is already zero.
        self.wait_for_drain();

        info!(
            "chain '{}': enabling {} modules",
            self.name,
            self.slots.len()
        );

        for index in 0..self.slots.len() {
            if let Err(source) = self.enable_slot(index) {
                for enabled_index in 0..index {
                    self.disable_slot(enabled_index);
                }
                return Err(ChainError::ModuleEnable {
                    chain: self.name.clone(),
                    module: self.slots[index].name.clone(),
                    slot: index,
                    source,
                });
            }
        }

        self.enabled.store(true, Ordering::Release);
        info!("chain '{}': enabled", self.name);
        Ok(())
    }

    /// Disables every module in slot order.
    ///
    /// Idempotent and infallible. The enabled flag flips first so no new
    /// run can be ticketed, then the call waits for all in-flight runs to
    /// drain before releasing module resources. A module's disable
    /// failure is logged and does not stop the remaining modules.
    pub fn disable(&self) {
        let _lifecycle = self.lifecycle.lock().unwrap();
        if !self.enabled.swap(false, Ordering::AcqRel) {
            return;
        }

        info!("chain '{}': disabling, waiting for in-flight runs", self.name);
        self.wait_for_drain();

        for index in 0..self.slots.len() {
            self.disable_slot(index);
        }
        info!("chain '{}': disabled", self.name);
    }

    /// Serializes and orders one slot's step for one run.
    ///
    /// Waits until the slot accepts this run's ticket, performs the step
    /// under the slot lock, then advances the ticket and wakes all
    /// waiters. An exec failure leaves the ticket untouched; the cleanup
    /// sweep advances it.
    fn process_slot(
        &self,
        index: usize,
        run: u64,
        run_id: RunId,
        step: StepKind,
    ) -> Result<(), ChainError> {
        self.wait_for_turn(index, run);

        let slot = &self.slots[index];
        let started = Instant::now();
        let result = {
            let mut module = slot.module.lock().unwrap();
            match step {
                StepKind::Exec => match module.exec(run_id) {
                    Ok(()) => {
                        // The module's own cleanup of this run's consumed
                        // inputs happens under the same lock acquisition,
                        // atomically with the readiness transition.
                        module.cleanup(run_id);
                        Ok(())
                    }
                    Err(source) => Err(source),
                },
                StepKind::Cleanup => {
                    module.cleanup(run_id);
                    Ok(())
                }
            }
        };
        let duration = started.elapsed();

        match result {
            Ok(()) => {
                self.advance(index, run);
                self.observer.record(RunEvent {
                    chain: self.name.clone(),
                    slot: index,
                    module: slot.name.clone(),
                    run_id: Some(run_id),
                    kind: match step {
                        StepKind::Exec => EventKind::ExecCompleted,
                        StepKind::Cleanup => EventKind::CleanupCompleted,
                    },
                    duration,
                });
                Ok(())
            }
            Err(source) => {
                self.observer.record(RunEvent {
                    chain: self.name.clone(),
                    slot: index,
                    module: slot.name.clone(),
                    run_id: Some(run_id),
                    kind: EventKind::ExecFailed,
                    duration,
                });
                Err(ChainError::ModuleStep {
                    chain: self.name.clone(),
                    module: slot.name.clone(),
                    slot: index,
                    run_id,
                    source,
                })
            }
        }
    }

    /// Runs a cleanup step on every slot that has not yet advanced past
    /// this run, the failing slot included.
    ///
    /// This both releases resources for slots that already started and
    /// unblocks slots downstream of the failure, so concurrently
    /// in-flight runs are never held up by the failed one.
    fn cleanup_sweep(&self, run: u64, run_id: RunId) {
        for index in 0..self.slots.len() {
            let advanced = self.state.lock().unwrap().ready_run[index] >= run + 1;
            if advanced {
                continue;
            }
            // Cleanup steps cannot fail; the result only matters for
            // exec steps.
            let _ = self.process_slot(index, run, run_id, StepKind::Cleanup);
        }
    }

    /// Blocks until the slot accepts this run's ticket.
    fn wait_for_turn(&self, index: usize, run: u64) {
        let mut state = self.state.lock().unwrap();
        while state.ready_run[index] != run {
            state = self.state_changed.wait(state).unwrap();
        }
    }

    /// Marks the slot ready for the next run and wakes all waiters.
    fn advance(&self, index: usize, run: u64) {
        let mut state = self.state.lock().unwrap();
        state.ready_run[index] = run + 1;
        self.state_changed.notify_all();
    }

    /// Blocks until no `exec()` call is in flight.
    fn wait_for_drain(&self) {
        let mut state = self.state.lock().unwrap();
        while state.in_flight > 0 {
            state = self.state_changed.wait(state).unwrap();
        }
    }

    fn enable_slot(&self, index: usize) -> Result<(), ModuleError> {
        let slot = &self.slots[index];
        let started = Instant::now();
        let result = slot.module.lock().unwrap().enable();

        self.observer.record(RunEvent {
            chain: self.name.clone(),
            slot: index,
            module: slot.name.clone(),
            run_id: None,
            kind: match result {
                Ok(()) => EventKind::Enabled,
                Err(_) => EventKind::EnableFailed,
            },
            duration: started.elapsed(),
        });
        result
    }

    fn disable_slot(&self, index: usize) {
        let slot = &self.slots[index];
        let started = Instant::now();
        let result = slot.module.lock().unwrap().disable();

        if let Err(ref err) = result {
            error!(
                "chain '{}' module '{}' (slot {}) failed to disable: {}",
                self.name, slot.name, index, err
            );
        }
        self.observer.record(RunEvent {
            chain: self.name.clone(),
            slot: index,
            module: slot.name.clone(),
            run_id: None,
            kind: match result {
                Ok(()) => EventKind::Disabled,
                Err(_) => EventKind::DisableFailed,
            },
            duration: started.elapsed(),
        });
    }
}

impl Drop for Chain {
    /// A chain torn down while enabled still releases its modules.
    fn drop(&mut self) {
        self.disable();
    }
}

/// Scope guard counting one `exec()` call as in flight.
///
/// The drain waits in `enable()`/`disable()` observe the count through
/// the shared condition variable; dropping the guard keeps the count
/// balanced on every exit path, failures included.
struct InFlightGuard<'a> {
    chain: &'a Chain,
}

impl<'a> InFlightGuard<'a> {
    fn enter(chain: &'a Chain) -> Self {
        chain.state.lock().unwrap().in_flight += 1;
        Self { chain }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.chain.state.lock().unwrap();
        state.in_flight -= 1;
        self.chain.state_changed.notify_all();
    }
}
