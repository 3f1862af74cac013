//! Run-Keyed Transfer Buffers
//!
//! Connects one module's output to a downstream module's input. Records
//! are grouped by the run id that produced them, so overlapping runs never
//! see each other's data, and cleanup can discard everything a failed or
//! finished run left behind.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::module::RunId;

/// A shared, run-id-keyed buffer between two modules of a chain.
///
/// Handles are cheap to clone; all clones refer to the same buffer. The
/// producing module calls [`push`](TransferChannel::push) during its step,
/// the consuming module calls [`take`](TransferChannel::take) during its
/// own, and either side's cleanup calls
/// [`discard_up_to`](TransferChannel::discard_up_to).
pub struct TransferChannel<T> {
    inner: Arc<Mutex<BTreeMap<RunId, Vec<T>>>>,
}

impl<T> Clone for TransferChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for TransferChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TransferChannel<T> {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Appends a record produced for the given run.
    pub fn push(&self, run_id: RunId, value: T) {
        self.inner
            .lock()
            .unwrap()
            .entry(run_id)
            .or_default()
            .push(value);
    }

    /// Consumes and returns all records of the given run.
    ///
    /// Returns an empty vector if the run produced nothing upstream.
    pub fn take(&self, run_id: RunId) -> Vec<T> {
        self.inner
            .lock()
            .unwrap()
            .remove(&run_id)
            .unwrap_or_default()
    }

    /// Returns true if records for the given run are waiting.
    pub fn pending(&self, run_id: RunId) -> bool {
        self.inner.lock().unwrap().contains_key(&run_id)
    }

    /// Drops all records belonging to runs with an id less than or equal
    /// to `run_id`. Idempotent, and safe when the run never produced data.
    pub fn discard_up_to(&self, run_id: RunId) {
        self.inner.lock().unwrap().retain(|id, _| *id > run_id);
    }

    /// Number of runs currently holding records.
    pub fn runs_pending(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
