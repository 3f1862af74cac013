//! ChainRunner - Pipelined Chain Execution Engine
//!
//! A runtime for fixed, user-declared sequences of processing modules
//! ("chains"). Each trigger of a chain flows through its modules in
//! order while successive triggers overlap in time, with every module
//! accepting work from at most one run at a time.
//!
//! # Architecture
//!
//! The library is organized into five main modules:
//!
//! - [`chain`]: Configuration data structures, parsing and validation
//! - [`engine`]: Core execution engine — run ids, slot protocol, lifecycle
//! - [`module`]: The module contract, registry, built-ins and transfer buffers
//! - [`system`]: Assembly of named chains and shared id generators
//! - [`monitoring`]: Per-step observability and run timelines
//!
//! # Example
//!
//! ```rust,no_run
//! use chainrunner::chain::model::{ChainConfig, ModuleSpec, SystemConfig};
//! use chainrunner::module::default_registry;
//! use chainrunner::System;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut config = SystemConfig::new();
//!     config.add_chain(
//!         ChainConfig::new("flow")
//!             .with_module(ModuleSpec::new("emit").with_param("output", "raw"))
//!             .with_module(ModuleSpec::new("sink").with_param("input", "raw")),
//!     )?;
//!
//!     let system = System::build(&config, &default_registry())?;
//!     system.enable_all()?;
//!     system.chain("flow").unwrap().exec()?;
//!     system.disable_all();
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod engine;
pub mod module;
pub mod monitoring;
pub mod system;

// Re-export commonly used types
pub use chain::model::{ChainConfig, ModuleSpec, SystemConfig};
pub use chain::parser::load_config;
pub use engine::chain::{Chain, ChainError};
pub use engine::id::IdGenerator;
pub use module::contract::{Module, ModuleError, RunId};
pub use module::registry::ModuleRegistry;
pub use system::System;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ChainRunner";
