//! Built-in Module Kinds
//!
//! Small processing units registered by default, enough to wire working
//! chains from a config file:
//!
//! - `emit`: produces `count` records per run into an `output` channel
//! - `relay`: moves records from `input` to `output`, prepending `prefix`
//! - `sink`: consumes records from `input` and counts them
//! - `delay`: sleeps `millis` per run (useful for pipelining demos)

use std::thread;
use std::time::Duration;

use log::{debug, info};
use once_cell::sync::Lazy;

use crate::chain::model::ModuleSpec;
use crate::module::contract::{Module, ModuleError, RunId};
use crate::module::registry::{BuildContext, ModuleRegistry};
use crate::module::transfer::TransferChannel;

/// Process-wide registry holding the built-in kinds.
///
/// Sufficient for configs that only use built-ins; embedders with custom
/// modules build their own registry via [`default_registry`].
pub static BUILTIN_REGISTRY: Lazy<ModuleRegistry> = Lazy::new(default_registry);

/// Returns a fresh registry with all built-in kinds installed.
pub fn default_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();

    registry.register("emit", |spec, ctx| {
        let output = ctx.channel(spec.param("output").unwrap_or("out"));
        let count = spec.param_u64("count", 1)?;
        Ok(Box::new(EmitModule {
            name: spec.name.clone(),
            count,
            output,
            produced: 0,
        }) as Box<dyn Module>)
    });

    registry.register("relay", |spec, ctx| {
        let input = ctx.channel(spec.param("input").unwrap_or("in"));
        let output = ctx.channel(spec.param("output").unwrap_or("out"));
        Ok(Box::new(RelayModule {
            name: spec.name.clone(),
            prefix: spec.param("prefix").unwrap_or_default().to_string(),
            input,
            output,
        }) as Box<dyn Module>)
    });

    registry.register("sink", |spec, ctx| {
        let input = ctx.channel(spec.param("input").unwrap_or("in"));
        Ok(Box::new(SinkModule {
            name: spec.name.clone(),
            input,
            received: 0,
        }) as Box<dyn Module>)
    });

    registry.register("delay", |spec, _ctx| {
        let millis = spec.param_u64("millis", 10)?;
        Ok(Box::new(DelayModule {
            name: spec.name.clone(),
            delay: Duration::from_millis(millis),
        }) as Box<dyn Module>)
    });

    registry
}

/// Produces a fixed number of records per run.
struct EmitModule {
    name: String,
    count: u64,
    output: TransferChannel<String>,
    produced: u64,
}

impl Module for EmitModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn enable(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ModuleError> {
        info!("emit '{}': produced {} records total", self.name, self.produced);
        Ok(())
    }

    fn exec(&mut self, run_id: RunId) -> Result<(), ModuleError> {
        for seq in 0..self.count {
            self.output
                .push(run_id, format!("{}:{}:{}", self.name, run_id, seq));
        }
        self.produced += self.count;
        Ok(())
    }

    fn cleanup(&mut self, _run_id: RunId) {
        // Producer side holds no input data.
    }
}

/// Forwards records downstream with a prefix.
struct RelayModule {
    name: String,
    prefix: String,
    input: TransferChannel<String>,
    output: TransferChannel<String>,
}

impl Module for RelayModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn enable(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn exec(&mut self, run_id: RunId) -> Result<(), ModuleError> {
        let records = self.input.take(run_id);
        debug!("relay '{}': run {} forwarding {} records", self.name, run_id, records.len());
        for record in records {
            self.output.push(run_id, format!("{}{}", self.prefix, record));
        }
        Ok(())
    }

    fn cleanup(&mut self, run_id: RunId) {
        self.input.discard_up_to(run_id);
    }
}

/// Consumes and counts records.
struct SinkModule {
    name: String,
    input: TransferChannel<String>,
    received: u64,
}

impl Module for SinkModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn enable(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ModuleError> {
        info!("sink '{}': received {} records total", self.name, self.received);
        Ok(())
    }

    fn exec(&mut self, run_id: RunId) -> Result<(), ModuleError> {
        let records = self.input.take(run_id);
        self.received += records.len() as u64;
        debug!("sink '{}': run {} drained {} records", self.name, run_id, records.len());
        Ok(())
    }

    fn cleanup(&mut self, run_id: RunId) {
        self.input.discard_up_to(run_id);
    }
}

/// Sleeps for a configured duration per run.
struct DelayModule {
    name: String,
    delay: Duration,
}

impl Module for DelayModule {
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
        thread::sleep(self.delay);
        Ok(())
    }

    fn cleanup(&mut self, _run_id: RunId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_kinds() {
        let registry = default_registry();
        assert_eq!(registry.kinds(), vec!["delay", "emit", "relay", "sink"]);
    }

    #[test]
    fn test_builtin_registry_is_shared() {
        assert!(BUILTIN_REGISTRY.contains("emit"));
        assert!(BUILTIN_REGISTRY.contains("sink"));
    }

    #[test]
    fn test_emit_produces_records_per_run() {
        let registry = default_registry();
        let mut context = BuildContext::new();

        let spec = ModuleSpec::new("emit")
            .with_param("output", "frames")
            .with_param("count", "3");
        let mut module = registry.create(&spec, &mut context).unwrap();
        let frames = context.channel("frames");

        module.enable().unwrap();
        module.exec(7).unwrap();

        let records = frames.take(7);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], "emit:7:0");
    }

    #[test]
    fn test_emit_rejects_bad_count() {
        let registry = default_registry();
        let spec = ModuleSpec::new("emit").with_param("count", "plenty");
        let err = match registry.create(&spec, &mut BuildContext::new()) {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.to_string().contains("not an integer"));
    }

    #[test]
    fn test_relay_prefixes_and_forwards() {
        let registry = default_registry();
        let mut context = BuildContext::new();

        let spec = ModuleSpec::new("relay")
            .with_param("input", "raw")
            .with_param("output", "tagged")
            .with_param("prefix", "t/");
        let mut module = registry.create(&spec, &mut context).unwrap();

        context.channel("raw").push(2, "x".to_string());
        module.exec(2).unwrap();

        assert_eq!(context.channel("tagged").take(2), vec!["t/x".to_string()]);
    }

    #[test]
    fn test_relay_cleanup_discards_stale_input() {
        let registry = default_registry();
        let mut context = BuildContext::new();

        let spec = ModuleSpec::new("relay")
            .with_param("input", "raw")
            .with_param("output", "tagged");
        let mut module = registry.create(&spec, &mut context).unwrap();

        let raw = context.channel("raw");
        raw.push(0, "left over".to_string());
        module.cleanup(0);

        assert!(!raw.pending(0));
    }

    #[test]
    fn test_sink_counts_records() {
        let registry = default_registry();
        let mut context = BuildContext::new();

        let spec = ModuleSpec::new("sink").with_param("input", "frames");
        let mut module = registry.create(&spec, &mut context).unwrap();

        let frames = context.channel("frames");
        frames.push(1, "a".to_string());
        frames.push(1, "b".to_string());

        module.exec(1).unwrap();
        assert!(!frames.pending(1));
        module.disable().unwrap();
    }

    #[test]
    fn test_delay_sleeps_per_exec() {
        let registry = default_registry();
        let spec = ModuleSpec::new("delay").with_param("millis", "20");
        let mut module = registry.create(&spec, &mut BuildContext::new()).unwrap();

        let started = std::time::Instant::now();
        module.exec(0).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
