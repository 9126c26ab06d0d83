//! testpool - Concurrency-Bounded Test File Runner
//!
//! A CLI tool that discovers test files, runs each one as an isolated child
//! process with a bounded number of processes in flight, streams error output
//! live and reports an aggregated pass/fail summary.
//!
//! ## Features
//!
//! - Work-conserving FIFO scheduling with a configurable concurrency bound
//! - Live stderr streaming; stdout buffered per file unless `--verbose`
//! - Single-process coverage mode for aggregated coverage reports
//! - YAML/JSON configuration with run profiles and environment overrides
//!
//! ## Usage
//!
//! ```bash
//! # Run all discovered test files
//! testpool run
//!
//! # Stream all output
//! testpool run --verbose
//!
//! # Run under the coverage tool in a single process
//! testpool run --coverage
//!
//! # Run specific files
//! testpool run src/app.test.ts
//!
//! # Run the CI suite with four processes
//! testpool run --profile ci -j 4
//! ```

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, info};

mod cli;
mod config;
mod discovery;
mod error;
mod executor;
mod models;
mod output;
mod utils;

use cli::{Args, Command};
use config::{AppConfig, ConfigFile, EnvConfig};
use discovery::Discovery;
use error::RunnerError;
use executor::{CoverageRun, ProcessLauncher, Progress, ProgressMode, Scheduler};
use models::WorkItem;
use output::{OutputFormat, ResultFormatter, RunReport};
use utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let env = EnvConfig::load();

    let verbose = env.verbose.unwrap_or(false)
        || matches!(&args.command, Command::Run(run) if run.verbose || !run.files.is_empty());
    let level = args
        .log_level
        .as_deref()
        .or(env.log.as_deref())
        .and_then(LogLevel::from_str)
        .unwrap_or_else(|| LogLevel::default_for(verbose));
    init_logger(level);

    match dispatch(args, env).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("\x1b[31mError: {e:#}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(args: Args, env: EnvConfig) -> Result<u8> {
    let config_path = args.config.clone().or_else(|| env.config_file.clone());
    let file = match &config_path {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    match args.command {
        Command::Run(run_args) => run_tests(run_args, &file, &env).await,
        Command::List(list_args) => list_files(list_args, &file, &env),
        Command::Config(config_args) => manage_config(config_args, &file, &env),
    }
}

/// Layer profile, environment and command-line overrides onto the file configuration
fn resolve_config(
    file: &ConfigFile,
    env: &EnvConfig,
    profile: Option<&str>,
    root: Option<&str>,
    patterns: &[String],
) -> Result<AppConfig> {
    let mut app = file.app.clone();

    if let Some(name) = profile.or(env.profile.as_deref()) {
        let profile = file
            .profile(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown profile: {name}"))?;
        debug!("Applying profile {}", profile.name);
        app.apply_profile(&profile);
    }

    app.apply_env(env);

    match (root, patterns.is_empty()) {
        (Some(root), true) => app.discovery.rebase(root),
        (Some(root), false) => {
            app.discovery.root = root.into();
            app.discovery.patterns = patterns.to_vec();
        }
        (None, false) => app.discovery.patterns = patterns.to_vec(),
        (None, true) => {}
    }

    Ok(app)
}

fn discover(app: &AppConfig) -> Result<Vec<WorkItem>> {
    let discovery = Discovery::new(&app.discovery.root, &app.discovery.patterns)?;
    let items = discovery.discover()?;
    if items.is_empty() {
        return Err(RunnerError::NoWorkItems {
            patterns: discovery.describe(),
        }
        .into());
    }
    Ok(items)
}

async fn run_tests(args: cli::RunArgs, file: &ConfigFile, env: &EnvConfig) -> Result<u8> {
    let mut app = resolve_config(
        file,
        env,
        args.profile.as_deref(),
        args.root.as_deref(),
        &args.patterns,
    )?;
    if args.concurrency.is_some() {
        app.max_concurrency = args.concurrency;
    }
    if args.timeout.is_some() {
        app.timeout_secs = args.timeout;
    }
    if args.no_color {
        app.color = false;
    }
    app.validate()?;

    let explicit = !args.files.is_empty();
    let verbose = args.verbose || explicit || env.verbose.unwrap_or(false);
    let format = match args.format.as_deref().or(env.format.as_deref()) {
        Some(name) => OutputFormat::from_str(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown output format: {name}"))?,
        None => OutputFormat::Text,
    };
    let text = format == OutputFormat::Text;
    let live = streams_stdout(verbose, format);

    let items = if explicit {
        discovery::explicit(&args.files)
    } else {
        discover(&app)?
    };

    if text {
        let coverage_msg = if args.coverage { " with coverage" } else { "" };
        println!(
            "{} (running {} test file(s) in parallel{})\n",
            app.runner.display(),
            items.len(),
            coverage_msg
        );
    }

    if args.coverage {
        let code = CoverageRun::new(app.coverage.clone(), app.runner.clone())
            .with_env(app.env.clone())
            .run(&items)
            .await?;
        return Ok(exit_byte(code));
    }

    let concurrency = app.concurrency();
    if text && !verbose {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        println!("Running with concurrency limit: {concurrency} ({cpus} CPUs available)\n");
    }

    let mut launcher = ProcessLauncher::new(app.runner.clone())
        .with_env(app.env.clone())
        .with_timeout(app.timeout())
        .verbose(live);
    let mode = match (text, verbose) {
        (true, true) => ProgressMode::Verbose,
        (true, false) => ProgressMode::Line,
        (false, _) => ProgressMode::Hidden,
    };
    let mut progress = Progress::new(mode);
    let mut formatter = ResultFormatter::new(format).streamed(live);
    if !app.color {
        launcher = launcher.no_color();
        progress = progress.no_color();
        formatter = formatter.no_color();
    }

    let started_at = Utc::now();
    let scheduler = Scheduler::new(launcher, concurrency).with_progress(progress);
    debug!("Scheduler bound: {}", scheduler.concurrency());
    let summary = scheduler.run(items).await?;

    let rendered = formatter.format_summary(&summary);
    if summary.is_all_passed() || !text {
        println!("{rendered}");
    } else {
        eprintln!("{rendered}");
    }

    if let Some(path) = &args.output {
        RunReport::new(app.runner.display(), started_at, summary.clone())
            .save(path)
            .with_context(|| format!("Failed to save report to {path}"))?;
    }

    info!("Exiting with code {}", summary.exit_code());
    Ok(exit_byte(summary.exit_code()))
}

fn list_files(args: cli::ListArgs, file: &ConfigFile, env: &EnvConfig) -> Result<u8> {
    let app = resolve_config(
        file,
        env,
        args.profile.as_deref(),
        args.root.as_deref(),
        &args.patterns,
    )?;
    app.validate()?;

    let items = discover(&app)?;
    println!(
        "\n{} test file(s) under {} matching [{}]\n",
        items.len(),
        app.discovery.root.display(),
        app.discovery.patterns.join(", ")
    );
    for item in &items {
        println!("  {item}");
    }
    println!();

    Ok(0)
}

fn manage_config(args: cli::ConfigArgs, file: &ConfigFile, env: &EnvConfig) -> Result<u8> {
    match args.action {
        cli::ConfigAction::Show { profile } => {
            println!("{}", effective_config(file, env, profile.as_deref())?);
        }
        cli::ConfigAction::Init { path, force } => {
            if std::path::Path::new(&path).exists() && !force {
                anyhow::bail!("{path} already exists (use --force to overwrite)");
            }
            ConfigFile::example().save(&path)?;
            println!("✓ Wrote example configuration to {path}");
        }
        cli::ConfigAction::Env => {
            config::print_env_help();
            if env.has_any() {
                println!();
                env.print_summary();
            }
        }
    }

    Ok(0)
}

/// Render the configuration a run would use, as YAML
fn effective_config(file: &ConfigFile, env: &EnvConfig, profile: Option<&str>) -> Result<String> {
    let app = resolve_config(file, env, profile, None, &[])?;
    let yaml = serde_yaml::to_string(&app).context("Failed to serialize config")?;
    Ok(format!(
        "{yaml}\n# effective concurrency: {}",
        app.concurrency()
    ))
}

/// Child stdout goes straight to ours only in verbose text mode, so JSON output stays parseable
fn streams_stdout(verbose: bool, format: OutputFormat) -> bool {
    verbose && format == OutputFormat::Text
}

/// Clamp a child exit code into a process exit byte, keeping failures non-zero
fn exit_byte(code: i32) -> u8 {
    match code {
        0 => 0,
        1..=255 => code as u8,
        _ => 1,
    }
}
