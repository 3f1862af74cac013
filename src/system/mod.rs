//! System Assembly
//!
//! Owns the named chains of a process and the id generators they share,
//! all built from a validated configuration and a module registry.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use log::info;

use crate::chain::model::SystemConfig;
use crate::engine::chain::{Chain, ChainError};
use crate::engine::id::IdGenerator;
use crate::module::registry::{BuildContext, ModuleRegistry};
use crate::monitoring::RunObserver;

/// A built system: every chain of the configuration, ready to enable.
///
/// Chains naming the same id generator share one generator whose stride
/// covers the largest of their slot counts, so ids never collide between
/// them.
pub struct System {
    chains: Vec<Arc<Chain>>,
    generators: HashMap<String, Arc<IdGenerator>>,
}

impl System {
    /// Builds all chains from a configuration, using the default log
    /// observer.
    pub fn build(
        config: &SystemConfig,
        registry: &ModuleRegistry,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Self::assemble(config, registry, None)
    }

    /// Builds all chains, attaching the given observer to each of them.
    pub fn build_with_observer(
        config: &SystemConfig,
        registry: &ModuleRegistry,
        observer: Arc<dyn RunObserver>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Self::assemble(config, registry, Some(observer))
    }

    fn assemble(
        config: &SystemConfig,
        registry: &ModuleRegistry,
        observer: Option<Arc<dyn RunObserver>>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut generators: HashMap<String, Arc<IdGenerator>> = HashMap::new();

        for name in config.generator_names() {
            let stride = config
                .chains
                .iter()
                .filter(|chain| chain.generator_name() == name)
                .map(|chain| chain.len() as u64)
                .max()
                .unwrap_or(1);
            generators.insert(name.to_string(), Arc::new(IdGenerator::new(stride)));
        }

        let mut chains = Vec::with_capacity(config.len());
        for chain_config in &config.chains {
            let mut context = BuildContext::new();
            let mut modules = Vec::with_capacity(chain_config.len());

            for spec in &chain_config.modules {
                let module = registry.create(spec, &mut context).map_err(|e| {
                    format!(
                        "Chain '{}' module '{}': {}",
                        chain_config.name, spec.name, e
                    )
                })?;
                modules.push(module);
            }

            let generator = Arc::clone(&generators[chain_config.generator_name()]);
            let mut chain = Chain::new(chain_config.name.clone(), modules, generator);
            if let Some(ref observer) = observer {
                chain = chain.with_observer(Arc::clone(observer));
            }
            chains.push(Arc::new(chain));
        }

        info!(
            "System built: {} chains, {} id generators",
            chains.len(),
            generators.len()
        );
        Ok(Self { chains, generators })
    }

    /// Gets a chain by name.
    pub fn chain(&self, name: &str) -> Option<&Arc<Chain>> {
        self.chains.iter().find(|chain| chain.name() == name)
    }

    /// All chains, in configuration order.
    pub fn chains(&self) -> &[Arc<Chain>] {
        &self.chains
    }

    /// Gets an id generator by name.
    pub fn generator(&self, name: &str) -> Option<&Arc<IdGenerator>> {
        self.generators.get(name)
    }

    /// Number of chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// True if the system has no chains.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Enables every chain in configuration order.
    ///
    /// Stops at the first failure; chains enabled before it stay enabled.
    pub fn enable_all(&self) -> Result<(), ChainError> {
        for chain in &self.chains {
            chain.enable()?;
        }
        Ok(())
    }

    /// Disables every chain. Best effort, like each chain's disable.
    pub fn disable_all(&self) {
        for chain in &self.chains {
            chain.disable();
        }
    }
}
