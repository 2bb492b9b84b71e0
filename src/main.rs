//! universe-pilot: Review, validate and launch universe configurations

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail};
use platform_rs::{PlatformApi, PlatformClient, PlatformConfig, PlatformError};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};
use universe_pilot_core::{
    LaunchOutcome, ReviewPhase, ReviewSection, ReviewStep, WizardFormData, WizardSession,
};

/// universe-pilot: Review and launch universe configurations
#[derive(Parser, Debug)]
#[command(name = "universe-pilot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the platform config file (default: ~/.universe-pilot/config.yaml)
    #[arg(long)]
    config: Option<String>,

    /// Platform endpoint, overrides the config file
    #[arg(long)]
    endpoint: Option<String>,

    /// Customer UUID, overrides the config file
    #[arg(long)]
    customer: Option<String>,

    /// Wizard form as YAML; required when creating a universe
    #[arg(short, long)]
    form: Option<String>,

    /// Edit this universe instead of creating one
    #[arg(short, long)]
    universe: Option<String>,

    /// Submit the configuration if the review allows it
    #[arg(short, long)]
    launch: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log file path (default: <temp_dir>/universe-pilot.log)
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    color_eyre::install()?;

    let log_path = resolve_log_path(cli.log_file.clone());
    let log_file = File::create(&log_path)?;

    // Quiet down the HTTP stack unless asked
    let filter = if cli.debug {
        EnvFilter::from_default_env()
            .add_directive(Level::DEBUG.into())
            .add_directive("hyper=info".parse()?)
            .add_directive("reqwest=info".parse()?)
            .add_directive("rustls=info".parse()?)
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .init();

    tracing::info!("Starting universe-pilot");

    let config = resolve_config(&cli)?;
    tracing::info!("Using platform {}", config.endpoint);
    let api: Arc<dyn PlatformApi> = Arc::new(PlatformClient::new(&config)?);

    let session = open_session(&cli, api.as_ref()).await?;
    let step = ReviewStep::open(Arc::new(session), api);
    step.prepare().await;

    print_review(&step);

    if cli.launch {
        match step.launch().await {
            LaunchOutcome::Submitted => println!("\nSubmitted."),
            LaunchOutcome::NotAllowed => {
                step.close();
                bail!("The review does not allow launching this configuration");
            }
            LaunchOutcome::Failed(message) => {
                step.close();
                bail!("Launch failed: {}", message);
            }
        }
    }

    step.close();
    tracing::info!("Goodbye!");
    Ok(())
}

/// Resolve the log file path, falling back to the platform temp directory.
fn resolve_log_path(log_file: Option<String>) -> PathBuf {
    match log_file {
        Some(path) => PathBuf::from(path),
        None => std::env::temp_dir().join("universe-pilot.log"),
    }
}

/// Load the platform config, letting flags fill in or replace its values.
///
/// The file may be missing when both `--endpoint` and `--customer` are given.
fn resolve_config(cli: &Cli) -> Result<PlatformConfig> {
    let loaded = match &cli.config {
        Some(path) => PlatformConfig::load(path),
        None => PlatformConfig::load_default(),
    };
    let config = match (loaded, &cli.endpoint, &cli.customer) {
        (Ok(config), _, _) => config,
        (Err(PlatformError::ConfigNotFound(_)), Some(endpoint), Some(customer)) => {
            PlatformConfig::new(endpoint.clone(), customer.clone())?
        }
        (Err(e), _, _) => {
            return Err(e).wrap_err("Failed to load platform config");
        }
    };
    Ok(config.with_overrides(cli.endpoint.clone(), cli.customer.clone())?)
}

fn parse_form(contents: &str) -> Result<WizardFormData> {
    let form: WizardFormData = serde_yaml::from_str(contents)?;
    form.validate()?;
    Ok(form)
}

fn load_form(path: &Path) -> Result<WizardFormData> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read form {}", path.display()))?;
    parse_form(&contents).wrap_err_with(|| format!("Invalid form {}", path.display()))
}

/// Create session from a form file, or edit session seeded from the universe
async fn open_session(cli: &Cli, api: &dyn PlatformApi) -> Result<WizardSession> {
    match (&cli.universe, &cli.form) {
        (Some(uuid), form) => {
            let edited = form.as_deref().map(|path| load_form(Path::new(path))).transpose()?;
            WizardSession::open_edit(api, uuid, edited)
                .await
                .wrap_err_with(|| format!("Failed to open universe {}", uuid))
        }
        (None, Some(path)) => Ok(WizardSession::create(load_form(Path::new(path))?)),
        (None, None) => bail!("Either --form or --universe is required"),
    }
}

fn print_review(step: &ReviewStep) {
    let snapshot = step.snapshot();
    let phase = match snapshot.phase() {
        ReviewPhase::Blocked => "blocked",
        ReviewPhase::Loading => "loading",
        ReviewPhase::Ready => "ready",
    };
    println!(
        "Review ({}): {}, configure {}",
        snapshot.operation, phase, snapshot.configure.status
    );

    for notification in snapshot.notifications() {
        println!("[{}] {}", notification.level, notification.message);
    }
    for section in step.sections() {
        print_section(&section);
    }

    println!();
    if snapshot.is_launch_allowed() {
        println!("Ready to launch.");
    } else {
        println!("Launch is not allowed.");
    }
}

fn print_section(section: &ReviewSection) {
    println!("\n{}", section.title);
    for row in &section.rows {
        let marker = if row.changed { "*" } else { " " };
        let mut lines = row.value.lines();
        println!(
            "{} {:<28} {}",
            marker,
            row.title,
            lines.next().unwrap_or_default()
        );
        for line in lines {
            println!("  {:<28} {}", "", line);
        }
    }
}
