//! Configuration Validation
//!
//! Validates system declarations before any chain is built:
//! - chain name uniqueness and non-emptiness
//! - module kind presence
//! - module instance name uniqueness within a chain

use std::collections::HashSet;

use log::debug;

use super::model::{ChainConfig, SystemConfig};

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NoChains,
    EmptyChainName,
    DuplicateChainName(String),
    EmptyChain(String),
    EmptyModuleKind { chain: String, slot: usize },
    DuplicateModuleName { chain: String, module: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoChains => write!(f, "Configuration declares no chains"),
            Self::EmptyChainName => write!(f, "Chain has empty or whitespace-only name"),
            Self::DuplicateChainName(name) => write!(f, "Duplicate chain name: '{}'", name),
            Self::EmptyChain(name) => write!(f, "Chain '{}' declares no modules", name),
            Self::EmptyModuleKind { chain, slot } => {
                write!(f, "Chain '{}' slot {} has no module kind", chain, slot)
            }
            Self::DuplicateModuleName { chain, module } => {
                write!(f, "Chain '{}' declares module '{}' twice", chain, module)
            }
        }
    }
}

/// Validates one chain declaration.
fn validate_chain(chain: &ChainConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if chain.name.trim().is_empty() {
        errors.push(ValidationError::EmptyChainName);
        return errors; // Can't report further errors without a name
    }

    if chain.modules.is_empty() {
        errors.push(ValidationError::EmptyChain(chain.name.clone()));
    }

    let mut seen = HashSet::new();
    for (slot, module) in chain.modules.iter().enumerate() {
        if module.kind.trim().is_empty() {
            errors.push(ValidationError::EmptyModuleKind {
                chain: chain.name.clone(),
                slot,
            });
        }
        if !module.name.trim().is_empty() && !seen.insert(module.name.clone()) {
            errors.push(ValidationError::DuplicateModuleName {
                chain: chain.name.clone(),
                module: module.name.clone(),
            });
        }
    }

    errors
}

/// Validates a complete system declaration.
///
/// Collects every error rather than stopping at the first, so a config
/// file can be fixed in one pass.
pub fn validate_config(config: &SystemConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.chains.is_empty() {
        errors.push(ValidationError::NoChains);
    }

    let mut seen = HashSet::new();
    for chain in &config.chains {
        if !chain.name.trim().is_empty() && !seen.insert(chain.name.clone()) {
            errors.push(ValidationError::DuplicateChainName(chain.name.clone()));
        }
        errors.extend(validate_chain(chain));
    }

    if errors.is_empty() {
        debug!(
            "Configuration valid: {} chains, {} generators",
            config.len(),
            config.generator_names().len()
        );
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::model::ModuleSpec;

    fn valid_chain(name: &str) -> ChainConfig {
        ChainConfig::new(name).with_module(ModuleSpec::new("emit"))
    }

    #[test]
    fn test_valid_config_passes() {
        let config = SystemConfig {
            chains: vec![valid_chain("a"), valid_chain("b")],
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_config_rejected() {
        let errors = validate_config(&SystemConfig::new()).unwrap_err();
        assert!(errors.contains(&ValidationError::NoChains));
    }

    #[test]
    fn test_duplicate_chain_names_rejected() {
        let config = SystemConfig {
            chains: vec![valid_chain("a"), valid_chain("a")],
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateChainName("a".to_string())));
    }

    #[test]
    fn test_chain_without_modules_rejected() {
        let config = SystemConfig {
            chains: vec![ChainConfig::new("hollow")],
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyChain("hollow".to_string())));
    }

    #[test]
    fn test_empty_chain_name_rejected() {
        let config = SystemConfig {
            chains: vec![valid_chain("  ")],
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyChainName));
    }

    #[test]
    fn test_empty_module_kind_rejected() {
        let mut chain = ChainConfig::new("a");
        chain.modules.push(ModuleSpec {
            kind: "".to_string(),
            name: "m".to_string(),
            params: Default::default(),
        });

        let errors = validate_config(&SystemConfig { chains: vec![chain] }).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::EmptyModuleKind { slot: 0, .. })));
    }

    #[test]
    fn test_duplicate_module_names_rejected() {
        let chain = ChainConfig::new("a")
            .with_module(ModuleSpec::new("emit").with_name("m"))
            .with_module(ModuleSpec::new("sink").with_name("m"));

        let errors = validate_config(&SystemConfig { chains: vec![chain] }).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::DuplicateModuleName { module, .. } if module == "m"
        )));
    }

    #[test]
    fn test_error_messages_name_the_chain() {
        let err = ValidationError::EmptyChain("t".to_string());
        assert!(err.to_string().contains("'t'"));
    }
}
