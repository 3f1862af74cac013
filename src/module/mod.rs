//! Module Contract and Assembly
//!
//! Everything the engine knows about the units it drives, plus the
//! machinery that turns configuration into module instances.
//!
//! # Structure
//!
//! - [`contract`]: the `Module` trait and run id type
//! - [`registry`]: kind-to-factory mapping and build-time channel wiring
//! - [`builtin`]: module kinds registered by default
//! - [`transfer`]: run-id-keyed buffers between modules

pub mod builtin;
pub mod contract;
pub mod registry;
pub mod transfer;

pub use builtin::{default_registry, BUILTIN_REGISTRY};
pub use contract::{Module, ModuleError, RunId};
pub use registry::{BuildContext, ModuleFactory, ModuleRegistry};
pub use transfer::TransferChannel;
