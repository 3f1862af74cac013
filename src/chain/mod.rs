//! Chain Configuration Module
//!
//! Provides data structures and utilities for declaring, parsing, and
//! validating chain configurations.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (SystemConfig, ChainConfig, ModuleSpec)
//! - [`parser`]: YAML parsing and loading
//! - [`validator`]: Validation rules

pub mod model;
pub mod parser;
pub mod validator;

pub use model::{ChainConfig, ModuleSpec, SystemConfig};
pub use parser::{load_config, parse_config};
pub use validator::{validate_config, ValidationError};
