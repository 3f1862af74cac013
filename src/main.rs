//! ChainRunner CLI Entry Point
//!
//! Provides command-line interface for running chain configurations.
//!
//! # Usage
//!
//! ```bash
//! # Run every chain in a config once
//! chainrunner chains.yaml
//!
//! # Trigger each chain 20 times across 4 worker threads
//! chainrunner chains.yaml --runs 20 --workers 4
//!
//! # Validate a config without building or running it
//! chainrunner chains.yaml --validate
//!
//! # Machine-readable summary
//! chainrunner chains.yaml --runs 5 --json
//! ```

use std::collections::VecDeque;
use std::env;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use log::{error, info};
use serde_json::json;

use chainrunner::module::builtin::BUILTIN_REGISTRY;
use chainrunner::monitoring::RunTimeline;
use chainrunner::{load_config, System, APP_NAME, VERSION};

/// Default configuration file used when none is specified.
const DEFAULT_CONFIG: &str = "chains.yaml";

/// Default number of triggers per chain.
const DEFAULT_RUNS: usize = 1;

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    config_path: String,
    runs: usize,
    workers: usize,
    validate_only: bool,
    json_summary: bool,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG.to_string(),
            runs: DEFAULT_RUNS,
            workers: default_workers(),
            validate_only: false,
            json_summary: false,
            verbose: false,
        }
    }
}

/// Default trigger worker count, bounded by the machine's cores.
fn default_workers() -> usize {
    num_cpus::get().min(4).max(1)
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Pipelined Chain Execution Engine");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: chainrunner [OPTIONS] <CONFIG_FILE>");
    println!();
    println!("Arguments:");
    println!("  <CONFIG_FILE>    Path to chain configuration YAML file");
    println!();
    println!("Options:");
    println!("  --runs N         Triggers per chain (default: {})", DEFAULT_RUNS);
    println!("  --workers N      Trigger worker threads (default: {})", default_workers());
    println!("  --validate       Check the configuration and exit");
    println!("  --json           Print a JSON summary after execution");
    println!("  --verbose        Enable debug logging");
    println!("  --help           Show this help message");
    println!("  --version        Show version information");
    println!();
    println!("Examples:");
    println!("  chainrunner chains.yaml");
    println!("  chainrunner chains.yaml --runs 20 --workers 4");
    println!("  chainrunner chains.yaml --validate");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--validate" => {
                config.validate_only = true;
            }
            "--json" => {
                config.json_summary = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--runs" => {
                i += 1;
                if i >= args.len() {
                    return Err("--runs requires a number argument".to_string());
                }
                config.runs = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid runs value: {}", args[i]))?;
            }
            "--workers" => {
                i += 1;
                if i >= args.len() {
                    return Err("--workers requires a number argument".to_string());
                }
                config.workers = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid workers value: {}", args[i]))?;
                if config.workers == 0 {
                    return Err("--workers must be at least 1".to_string());
                }
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                // Positional argument
                match positional_index {
                    0 => config.config_path = arg.clone(),
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Triggers every chain `runs` times from a pool of worker threads.
///
/// Returns the number of failed runs; individual failures are logged and
/// never stop the remaining triggers.
fn trigger_all(system: &System, runs: usize, workers: usize) -> Result<u64, String> {
    let mut jobs = VecDeque::new();
    for chain in system.chains() {
        for _ in 0..runs {
            jobs.push_back(Arc::clone(chain));
        }
    }

    let queue = Arc::new(Mutex::new(jobs));
    let failures = Arc::new(AtomicU64::new(0));

    let mut handles = Vec::new();
    for _ in 0..workers {
        let queue = Arc::clone(&queue);
        let failures = Arc::clone(&failures);

        handles.push(thread::spawn(move || loop {
            let job = queue.lock().unwrap().pop_front();
            let Some(chain) = job else {
                break;
            };
            if let Err(e) = chain.exec() {
                error!("{}", e);
                failures.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    for handle in handles {
        handle.join().map_err(|_| "Worker thread panicked")?;
    }

    Ok(failures.load(Ordering::Relaxed))
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    // Setup logging
    setup_logging(config.verbose);

    // Print banner
    print_banner();

    // Load configuration
    info!("Loading configuration: {}", config.config_path);
    let system_config = load_config(&config.config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        format!(
            "Could not load configuration from '{}': {}",
            config.config_path, e
        )
    })?;

    if config.validate_only {
        println!("Configuration OK: {} chains", system_config.len());
        return Ok(());
    }

    // Build the system with a recording timeline
    let timeline = Arc::new(RunTimeline::new());
    let system = System::build_with_observer(&system_config, &BUILTIN_REGISTRY, timeline.clone())?;

    info!(
        "Triggering {} runs per chain across {} workers",
        config.runs, config.workers
    );

    let start_time = Instant::now();
    system.enable_all()?;
    let failed_runs = trigger_all(&system, config.runs, config.workers)?;
    system.disable_all();
    let total_time = start_time.elapsed();

    // Print summary
    println!();
    println!("{}", timeline.summary());
    println!("Total execution time: {:.2?}", total_time);

    if config.json_summary {
        let counts = timeline.counts();
        let summary = json!({
            "chains": system.len(),
            "runs": counts.runs,
            "exec_steps": counts.exec_steps,
            "cleanup_steps": counts.cleanup_steps,
            "failures": counts.failures,
            "elapsed_ms": total_time.as_millis() as u64,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if failed_runs > 0 {
        return Err(format!("{} runs failed", failed_runs).into());
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
