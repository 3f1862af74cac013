//! Configuration Parser
//!
//! Loads system declarations from YAML files, normalizes defaulted
//! fields (module names fall back to their kind) and validates the
//! result before handing it to the system builder.

use std::error::Error;
use std::fs;

use log::info;

use super::model::SystemConfig;
use super::validator::validate_config;

/// Parses a system declaration from a YAML string.
pub fn parse_config(yaml: &str) -> Result<SystemConfig, Box<dyn Error>> {
    let mut config: SystemConfig = serde_yaml::from_str(yaml)?;
    normalize(&mut config);

    validate_config(&config).map_err(|errors| {
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        format!("Invalid configuration: {}", joined)
    })?;

    Ok(config)
}

/// Loads and parses a system declaration from a YAML file.
pub fn load_config(path: &str) -> Result<SystemConfig, Box<dyn Error>> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Cannot read '{}': {}", path, e))?;
    let config = parse_config(&content)?;

    info!(
        "Loaded configuration '{}': {} chains, {} modules",
        path,
        config.len(),
        config.chains.iter().map(|c| c.len()).sum::<usize>()
    );
    Ok(config)
}

/// Fills defaulted fields after deserialization.
fn normalize(config: &mut SystemConfig) {
    for chain in &mut config.chains {
        for module in &mut chain.modules {
            if module.name.trim().is_empty() {
                module.name = module.kind.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
chains:
  - name: telemetry
    id_generator: shared
    modules:
      - kind: emit
        params:
          output: frames
          count: "2"
      - name: drain
        kind: sink
        params:
          input: frames
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = parse_config(SAMPLE).unwrap();

        assert_eq!(config.len(), 1);
        let chain = config.get_chain("telemetry").unwrap();
        assert_eq!(chain.generator_name(), "shared");
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.modules[1].name, "drain");
    }

    #[test]
    fn test_parse_defaults_module_name_to_kind() {
        let config = parse_config(SAMPLE).unwrap();
        let chain = config.get_chain("telemetry").unwrap();
        assert_eq!(chain.modules[0].name, "emit");
    }

    #[test]
    fn test_parse_rejects_invalid_yaml() {
        assert!(parse_config("chains: [1, 2").is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_config() {
        let err = parse_config("chains: []").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_parse_collects_all_errors() {
        let yaml = r#"
chains:
  - name: a
    modules: []
  - name: a
    modules: []
"#;
        let err = parse_config(yaml).unwrap_err().to_string();
        assert!(err.contains("Duplicate chain name"));
        assert!(err.contains("declares no modules"));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/chains.yaml").unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
