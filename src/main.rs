//! featrun - Parallel Feature-Unit Test Runner
//!
//! Runs feature units concurrently on a bounded worker pool. Each
//! unit's reporting calls are recorded privately and replayed onto the
//! shared consumers one unit at a time, so the console and report
//! files read as if the units had run sequentially.
//!
//! ## Usage
//!
//! ```bash
//! # Run units with the default pool of 2 workers
//! featrun run features/login.outline features/cart.outline
//!
//! # Widen the pool and write a JSON report
//! featrun run features/ --workers 4 --json report.json
//!
//! # One character per step, no color
//! featrun run features/ --format progress --no-color
//!
//! # Inspect saved runs
//! featrun results
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use featrun::cli::{self, Args};
use featrun::config::{self, AppConfig, EnvConfig};
use featrun::consumer::ConsumerSet;
use featrun::engine::OutlineEngine;
use featrun::executor::{finalize, Scheduler};
use featrun::models::Unit;
use featrun::output::{build_consumers, ConsoleFormat};
use featrun::results::{RunRecord, RunStore};
use featrun::utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env = EnvConfig::load();

    let level = if args.verbose || env.verbose.unwrap_or(false) {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    init_logger(level);

    match args.command {
        cli::Command::Run(run_args) => {
            let code = run_units(run_args, &env).await?;
            std::process::exit(code);
        }
        cli::Command::Formats(formats_args) => {
            list_formats(formats_args);
        }
        cli::Command::Results(results_args) => {
            show_results(results_args)?;
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args, &env)?;
        }
    }

    Ok(())
}

async fn run_units(args: cli::RunArgs, env: &EnvConfig) -> Result<i32> {
    let mut config = AppConfig::discover(args.config.as_deref(), env)?;
    config.apply_env(env);

    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(deadline) = args.deadline {
        config.deadline_secs = deadline;
    }
    if let Some(format) = &args.format {
        config.format = format.clone();
    }
    if args.no_color {
        config.color = false;
    }
    config.validate()?;
    debug!("effective config: {:?}", config);

    let units = collect_units(&args.units)?;
    let started_at = Utc::now();

    let consumers = build_consumers(config.console_format(), config.color, args.json.as_deref());
    let consumers = Arc::new(ConsumerSet::new(consumers));
    let engine = Arc::new(OutlineEngine::new());

    let mut scheduler = Scheduler::new(engine, consumers.clone())
        .workers(config.workers)
        .deadline(config.deadline())
        .dry_run(args.dry_run);

    let outcome = scheduler.run(units).await;
    let outcome = finalize(&consumers, outcome).await;

    println!("{outcome}");

    if args.save {
        let record = RunRecord::new(started_at, outcome.clone())
            .with_workers(config.workers)
            .with_deadline_secs(config.deadline_secs)
            .with_dry_run(args.dry_run);

        let store = match &config.report_dir {
            Some(dir) => RunStore::new(dir),
            None => RunStore::default_dir(),
        };
        let path = store.save(&record)?;
        println!("Run record saved: {}", path.display());
    }

    Ok(outcome.exit_code())
}

/// Expand unit arguments: files are taken as-is, directories contribute
/// their `.outline` files in name order.
fn collect_units(paths: &[PathBuf]) -> Result<Vec<Unit>> {
    let mut units = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read directory: {}", path.display()))?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|p| p.extension().map(|e| e == "outline").unwrap_or(false))
                .collect();
            entries.sort();
            units.extend(entries.into_iter().map(Unit::from_path));
        } else {
            units.push(Unit::from_path(path));
        }
    }

    Ok(units)
}

fn list_formats(args: cli::FormatsArgs) {
    println!("\nConsole Formats\n");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for format in ConsoleFormat::all() {
        if args.detailed {
            println!("  {:10} - {}", format.name(), format.description());
        } else {
            println!("  {}", format.name());
        }
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn show_results(args: cli::ResultsArgs) -> Result<()> {
    let store = match &args.dir {
        Some(dir) => RunStore::new(dir),
        None => RunStore::default_dir(),
    };

    if let Some(run_id) = &args.delete {
        store.delete(run_id)?;
        println!("✓ Deleted run: {run_id}");
        return Ok(());
    }

    if let Some(run_id) = &args.run {
        let record = store.load(run_id)?;
        print_record(&record, &args.format)?;

        if let Some(export_path) = &args.export {
            store.export_csv(&record, export_path)?;
            println!("\n✓ Exported to: {}", export_path.display());
        }
        return Ok(());
    }

    // without --run, --export acts on the latest record
    if let Some(export_path) = &args.export {
        match store.latest()? {
            Some(record) => {
                store.export_csv(&record, export_path)?;
                println!("✓ Exported {} to: {}", record.id, export_path.display());
            }
            None => println!("No stored runs to export."),
        }
        return Ok(());
    }

    let records = store.list()?;
    if records.is_empty() {
        println!("\nNo stored runs found.");
        println!("Save one with: featrun run <units> --save\n");
        return Ok(());
    }

    println!("\nStored Runs ({})", records.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for record in &records {
        println!("  {}", record.brief());
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("\nUse --run <id> to view details, --export <path> for CSV.\n");

    Ok(())
}

fn print_record(record: &RunRecord, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        _ => {
            println!("\nRun {}", record.id);
            println!(
                "Started:  {}",
                record.started_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!(
                "Finished: {}",
                record.finished_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!(
                "Workers: {}   Deadline: {}s   Dry run: {}",
                record.workers, record.deadline_secs, record.dry_run
            );
            println!("{}", record.outcome);
        }
    }
    Ok(())
}

fn manage_config(args: cli::ConfigArgs, env: &EnvConfig) -> Result<()> {
    use std::path::Path;

    match args.action {
        cli::ConfigAction::Show { format } => {
            let mut config = AppConfig::discover(None, env)?;
            config.apply_env(env);

            let output = if format == "json" {
                serde_json::to_string_pretty(&config)?
            } else {
                serde_yaml::to_string(&config)?
            };
            println!("{output}");
        }

        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            AppConfig::default().save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Path => match AppConfig::find() {
            Some(path) => println!("{}", path.display()),
            None => println!("No configuration file found. Defaults are in effect."),
        },

        cli::ConfigAction::Env => {
            config::env::print_env_help();
            if env.has_any() {
                println!();
                env.print_summary();
            }
        }
    }

    Ok(())
}
