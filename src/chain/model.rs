//! Chain Configuration Model
//!
//! Data structures describing a system of chains: each chain names an
//! id generator (shared generators give chains disjoint id ranges) and
//! declares its ordered module list.
//!
//! # Example YAML Format
//!
//! ```yaml
//! chains:
//!   - name: telemetry
//!     id_generator: shared
//!     modules:
//!       - name: reader
//!         kind: emit
//!         params:
//!           output: frames
//!           count: "3"
//!       - kind: relay
//!         params:
//!           input: frames
//!           output: tagged
//!           prefix: "t/"
//!       - kind: sink
//!         params:
//!           input: tagged
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Declaration of one module instance inside a chain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModuleSpec {
    /// Module kind, resolved through the registry.
    pub kind: String,

    /// Instance name; defaults to the kind when omitted.
    #[serde(default)]
    pub name: String,

    /// Free-form parameters interpreted by the module's factory.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, String>,
}

impl ModuleSpec {
    /// Creates a spec for the given kind, named after the kind.
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into().trim().to_string();
        Self {
            name: kind.clone(),
            kind,
            params: HashMap::new(),
        }
    }

    /// Sets the instance name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into().trim().to_string();
        self
    }

    /// Adds one parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Looks up a parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parses an integer parameter, falling back to `default` when the
    /// parameter is absent.
    pub fn param_u64(&self, key: &str, default: u64) -> Result<u64, String> {
        match self.params.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| {
                format!(
                    "module '{}': parameter '{}' is not an integer: '{}'",
                    self.name, key, raw
                )
            }),
        }
    }
}

/// Declaration of one chain: a name, the id generator it draws from, and
/// its ordered module list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChainConfig {
    /// Unique chain name.
    pub name: String,

    /// Name of the id generator this chain draws run ids from. Chains
    /// naming the same generator share one id sequence. Defaults to the
    /// chain name (a private generator).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_generator: Option<String>,

    /// Ordered module declarations, slot 0 first.
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

impl ChainConfig {
    /// Creates an empty chain declaration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            id_generator: None,
            modules: Vec::new(),
        }
    }

    /// Names the shared id generator.
    pub fn with_id_generator(mut self, name: impl Into<String>) -> Self {
        self.id_generator = Some(name.into().trim().to_string());
        self
    }

    /// Appends a module declaration.
    pub fn with_module(mut self, module: ModuleSpec) -> Self {
        self.modules.push(module);
        self
    }

    /// The effective generator name (explicit or the chain's own name).
    pub fn generator_name(&self) -> &str {
        self.id_generator.as_deref().unwrap_or(&self.name)
    }

    /// Number of declared modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True if the chain declares no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// A complete system declaration: every chain of the process.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SystemConfig {
    /// Declared chains.
    pub chains: Vec<ChainConfig>,
}

impl SystemConfig {
    /// Creates an empty system declaration.
    pub fn new() -> Self {
        Self { chains: Vec::new() }
    }

    /// Adds a chain declaration, rejecting duplicate names.
    pub fn add_chain(&mut self, chain: ChainConfig) -> Result<(), String> {
        if self.chains.iter().any(|c| c.name == chain.name) {
            return Err(format!("Chain '{}' already exists", chain.name));
        }
        self.chains.push(chain);
        Ok(())
    }

    /// Gets a chain declaration by name.
    pub fn get_chain(&self, name: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.name == name)
    }

    /// Distinct generator names in first-use order.
    pub fn generator_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for chain in &self.chains {
            let name = chain.generator_name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Number of declared chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// True if no chains are declared.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_spec_defaults_name_to_kind() {
        let spec = ModuleSpec::new("emit");
        assert_eq!(spec.name, "emit");
        assert_eq!(spec.kind, "emit");
    }

    #[test]
    fn test_module_spec_builder() {
        let spec = ModuleSpec::new("relay")
            .with_name("tagger")
            .with_param("input", "frames")
            .with_param("prefix", "t/");

        assert_eq!(spec.name, "tagger");
        assert_eq!(spec.param("input"), Some("frames"));
        assert_eq!(spec.param("missing"), None);
    }

    #[test]
    fn test_param_u64_default_and_parse() {
        let spec = ModuleSpec::new("emit").with_param("count", "7");

        assert_eq!(spec.param_u64("count", 1).unwrap(), 7);
        assert_eq!(spec.param_u64("missing", 4).unwrap(), 4);
    }

    #[test]
    fn test_param_u64_rejects_garbage() {
        let spec = ModuleSpec::new("emit").with_param("count", "many");

        let err = spec.param_u64("count", 1).unwrap_err();
        assert!(err.contains("not an integer"));
    }

    #[test]
    fn test_chain_generator_name_defaults_to_chain_name() {
        let chain = ChainConfig::new("telemetry");
        assert_eq!(chain.generator_name(), "telemetry");

        let chain = ChainConfig::new("telemetry").with_id_generator("shared");
        assert_eq!(chain.generator_name(), "shared");
    }

    #[test]
    fn test_system_rejects_duplicate_chain_names() {
        let mut config = SystemConfig::new();
        assert!(config.add_chain(ChainConfig::new("a")).is_ok());
        assert!(config.add_chain(ChainConfig::new("a")).is_err());
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_generator_names_deduplicated() {
        let mut config = SystemConfig::new();
        config
            .add_chain(ChainConfig::new("a").with_id_generator("shared"))
            .unwrap();
        config
            .add_chain(ChainConfig::new("b").with_id_generator("shared"))
            .unwrap();
        config.add_chain(ChainConfig::new("c")).unwrap();

        assert_eq!(config.generator_names(), vec!["shared", "c"]);
    }

    #[test]
    fn test_get_chain() {
        let mut config = SystemConfig::new();
        config.add_chain(ChainConfig::new("a")).unwrap();

        assert!(config.get_chain("a").is_some());
        assert!(config.get_chain("b").is_none());
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = SystemConfig {
            chains: vec![ChainConfig::new("t")
                .with_id_generator("shared")
                .with_module(ModuleSpec::new("emit").with_param("count", "2"))
                .with_module(ModuleSpec::new("sink").with_name("drain"))],
        };

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: SystemConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }
}
