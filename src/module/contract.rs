//! Module Contract
//!
//! The interface every processing unit must implement to occupy a slot
//! in a chain. Modules are opaque to the engine: it drives them through
//! enable/exec/cleanup/disable and guarantees that no two threads ever
//! call into the same instance concurrently.

use std::error::Error;

/// Identifier assigned to one trigger of a chain.
///
/// Produced by an [`IdGenerator`](crate::engine::IdGenerator), strictly
/// increasing over the generator's lifetime, and attached to all data the
/// modules exchange during that run.
pub type RunId = u64;

/// Error type returned by fallible module operations.
pub type ModuleError = Box<dyn Error + Send + Sync>;

/// A processing unit occupying one fixed position in a chain.
///
/// The engine calls `enable` before the chain accepts triggers, `exec`
/// once per run flowing through the module's slot, `cleanup` to discard
/// per-run data, and `disable` when the chain releases its resources.
///
/// # Contract
///
/// - `exec` either fully completes or reports failure; partial completion
///   inside a single step is the module's own responsibility.
/// - `cleanup` must be idempotent and safe to call even if `exec` for
///   that run id never ran.
/// - `disable` failures are logged by the engine and never propagated;
///   a module should release as much as it can regardless.
pub trait Module: Send {
    /// Instance name used in logs and error reports.
    fn name(&self) -> &str;

    /// Acquires the resources the module needs to accept `exec` calls.
    fn enable(&mut self) -> Result<(), ModuleError>;

    /// Releases the module's resources.
    ///
    /// Best effort: the engine logs a failure and keeps disabling the
    /// remaining modules of the chain.
    fn disable(&mut self) -> Result<(), ModuleError>;

    /// Performs the module's unit of work for one run.
    fn exec(&mut self, run_id: RunId) -> Result<(), ModuleError>;

    /// Discards any data the module holds for runs up to and including
    /// `run_id`. Called after a successful `exec`, and in place of `exec`
    /// for every remaining slot once an earlier slot failed the run.
    fn cleanup(&mut self, run_id: RunId);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        name: String,
        execs: usize,
        cleanups: Vec<RunId>,
    }

    impl Module for Counter {
        fn name(&self) -> &str {
            &self.name
        }

        fn enable(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }

        fn disable(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }

        fn exec(&mut self, _run_id: RunId) -> Result<(), ModuleError> {
            self.execs += 1;
            Ok(())
        }

        fn cleanup(&mut self, run_id: RunId) {
            self.cleanups.push(run_id);
        }
    }

    #[test]
    fn test_module_as_trait_object() {
        let mut module: Box<dyn Module> = Box::new(Counter {
            name: "counter".to_string(),
            execs: 0,
            cleanups: Vec::new(),
        });

        assert_eq!(module.name(), "counter");
        assert!(module.enable().is_ok());
        assert!(module.exec(7).is_ok());
        module.cleanup(7);
        assert!(module.disable().is_ok());
    }

    #[test]
    fn test_module_error_from_string() {
        fn failing() -> Result<(), ModuleError> {
            Err("resource unavailable".into())
        }

        let err = failing().unwrap_err();
        assert_eq!(err.to_string(), "resource unavailable");
    }
}
