//! Module Registry
//!
//! Maps module kinds to factories so chains can be assembled from
//! configuration. Factories receive the module's declaration plus a
//! per-chain build context that wires named transfer channels between
//! the chain's modules.

use std::collections::HashMap;

use crate::chain::model::ModuleSpec;
use crate::module::contract::{Module, ModuleError};
use crate::module::transfer::TransferChannel;

/// Build-time wiring for one chain.
///
/// Channels are created on first use and shared by every module of the
/// chain that names them, connecting a producer's `output` parameter to
/// a consumer's `input` parameter.
#[derive(Default)]
pub struct BuildContext {
    channels: HashMap<String, TransferChannel<String>>,
}

impl BuildContext {
    /// Creates an empty context for one chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the named channel, creating it on first use.
    pub fn channel(&mut self, name: &str) -> TransferChannel<String> {
        self.channels
            .entry(name.to_string())
            .or_insert_with(TransferChannel::new)
            .clone()
    }

    /// Number of distinct channels requested so far.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Factory producing a module instance from its declaration.
pub type ModuleFactory =
    Box<dyn Fn(&ModuleSpec, &mut BuildContext) -> Result<Box<dyn Module>, ModuleError> + Send + Sync>;

/// Registry of module kinds.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = ModuleRegistry::new();
/// registry.register("null", |spec, _ctx| Ok(NullModule::boxed(&spec.name)));
/// let module = registry.create(&ModuleSpec::new("null"), &mut BuildContext::new())?;
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for a module kind, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&ModuleSpec, &mut BuildContext) -> Result<Box<dyn Module>, ModuleError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    /// Instantiates a module from its declaration.
    pub fn create(
        &self,
        spec: &ModuleSpec,
        context: &mut BuildContext,
    ) -> Result<Box<dyn Module>, ModuleError> {
        let factory = self
            .factories
            .get(&spec.kind)
            .ok_or_else(|| format!("Unknown module kind '{}'", spec.kind))?;
        factory(spec, context)
    }

    /// True if the kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::contract::RunId;

    struct Null {
        name: String,
    }

    impl Module for Null {
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
            Ok(())
        }
        fn cleanup(&mut self, _run_id: RunId) {}
    }

    #[test]
    fn test_register_and_create() {
        let mut registry = ModuleRegistry::new();
        registry.register("null", |spec, _ctx| {
            Ok(Box::new(Null {
                name: spec.name.clone(),
            }) as Box<dyn Module>)
        });

        let spec = ModuleSpec::new("null").with_name("quiet");
        let module = registry.create(&spec, &mut BuildContext::new()).unwrap();
        assert_eq!(module.name(), "quiet");
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let registry = ModuleRegistry::new();
        let err = match registry.create(&ModuleSpec::new("ghost"), &mut BuildContext::new()) {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.to_string().contains("Unknown module kind 'ghost'"));
    }

    #[test]
    fn test_kinds_sorted() {
        let mut registry = ModuleRegistry::new();
        registry.register("b", |_, _| Err("unused".into()));
        registry.register("a", |_, _| Err("unused".into()));

        assert_eq!(registry.kinds(), vec!["a", "b"]);
        assert!(registry.contains("a"));
        assert!(!registry.contains("c"));
    }

    #[test]
    fn test_context_shares_channels_by_name() {
        let mut context = BuildContext::new();

        let producer_side = context.channel("frames");
        let consumer_side = context.channel("frames");
        context.channel("other");

        producer_side.push(0, "record".to_string());
        assert_eq!(consumer_side.take(0), vec!["record".to_string()]);
        assert_eq!(context.channel_count(), 2);
    }
}
