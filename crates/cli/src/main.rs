mod cli;
mod metrics;
mod report;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use burstdng_core::{
    default_preferences_path, enumerate, load_preferences, save_preferences,
    validate_preferences, BatchRunner, Converter, ConverterConfig, DngLabConverter,
    EnumerationRequest, Preferences,
};

use cli::{Cli, Commands, ConvertArgs, PrefsAction};
use report::{OutputFormat, Reporter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,burstdng=debug,burstdng_core=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let prefs_path = cli.prefs.clone().unwrap_or_else(default_preferences_path);

    match cli.command {
        Commands::Convert(args) => convert(args, &prefs_path, cli.verbose).await,
        Commands::Prefs { action } => prefs(action, &prefs_path),
        Commands::Check { dnglab } => check(dnglab, &prefs_path).await,
    }
}

fn load(prefs_path: &Path) -> Result<Preferences> {
    let prefs = load_preferences(prefs_path)
        .with_context(|| format!("Failed to load preferences from {:?}", prefs_path))?;
    validate_preferences(&prefs).context("Preferences validation failed")?;
    Ok(prefs)
}

fn warn_if_missing_executable(executable: &Path) {
    let converter = DngLabConverter::new(ConverterConfig::with_executable(executable));
    if converter.resolve_executable().is_err() {
        warn!(
            executable = %executable.display(),
            "dnglab executable not found; set it with `burstdng prefs set --dnglab <PATH>`"
        );
    }
}

async fn convert(args: ConvertArgs, prefs_path: &Path, verbose: bool) -> Result<i32> {
    let prefs = load(prefs_path)?;

    let mut converter_config = ConverterConfig::from_preferences(&prefs);
    if let Some(dnglab) = args.dnglab {
        converter_config.executable_path = dnglab;
    }
    if let Some(timeout) = args.timeout {
        converter_config.timeout_secs = Some(timeout).filter(|t| *t > 0);
    }
    warn_if_missing_executable(&converter_config.executable_path);

    let max_jobs = args.jobs.unwrap_or(prefs.max_concurrent_jobs);
    let output_folder = args
        .output
        .unwrap_or_else(|| prefs.default_output_folder.clone());

    let mut request = EnumerationRequest::new(args.inputs, output_folder, args.name);
    if !args.extensions.is_empty() {
        request = request.with_extensions(&args.extensions);
    }
    let tasks = enumerate(&request).context("Cannot start conversion")?;
    info!(
        tasks = tasks.len(),
        output = %request.output_folder.display(),
        "Enumerated inputs"
    );

    let runner = BatchRunner::new(DngLabConverter::new(converter_config));
    let mut handle = runner
        .run(tasks, max_jobs)
        .await
        .context("Cannot start conversion")?;

    let token = handle.cancellation_token();
    let batch_id = handle.batch_id();
    let interrupt = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!(%batch_id, "Interrupted, cancelling batch");
            token.cancel();
        }
    });

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let mut reporter = Reporter::new(format, std::io::stdout().lock()).with_verbose(verbose);
    while let Some(event) = handle.recv().await {
        reporter.event(&event).context("Failed to write status")?;
    }
    drop(reporter);

    let summary = handle.wait().await?;
    interrupt.abort();

    if let Some(path) = args.metrics {
        metrics::write_metrics(&path)
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
    }

    Ok(report::exit_code(&summary))
}

fn prefs(action: PrefsAction, prefs_path: &Path) -> Result<i32> {
    match action {
        PrefsAction::Path => {
            println!("{}", prefs_path.display());
        }
        PrefsAction::Show => {
            let prefs = load(prefs_path)?;
            warn_if_missing_executable(&prefs.executable_path);
            print!("{}", toml::to_string_pretty(&prefs)?);
        }
        PrefsAction::Set {
            dnglab,
            output_folder,
            max_jobs,
            timeout,
        } => {
            let mut prefs = load(prefs_path)?;
            if let Some(dnglab) = dnglab {
                prefs = prefs.with_executable(dnglab);
            }
            if let Some(folder) = output_folder {
                prefs = prefs.with_output_folder(folder);
            }
            if let Some(max) = max_jobs {
                prefs = prefs.with_max_concurrent_jobs(max);
            }
            if let Some(secs) = timeout {
                prefs.timeout_secs = Some(secs).filter(|s| *s > 0);
            }
            validate_preferences(&prefs).context("Invalid preferences")?;
            save_preferences(prefs_path, &prefs)?;
            warn_if_missing_executable(&prefs.executable_path);
            println!("Saved preferences to {}", prefs_path.display());
        }
    }
    Ok(0)
}

async fn check(dnglab: Option<PathBuf>, prefs_path: &Path) -> Result<i32> {
    let prefs = load(prefs_path)?;
    let executable = dnglab.unwrap_or(prefs.executable_path);

    let converter = DngLabConverter::new(ConverterConfig::with_executable(&executable));
    let info = converter
        .validate()
        .await
        .with_context(|| format!("dnglab is not usable at {:?}", executable))?;

    println!("dnglab:  {}", info.executable.display());
    println!("version: {}", info.version.as_deref().unwrap_or("unknown"));
    Ok(0)
}
