//! Index Migration CLI
//!
//! CLI tool for migrating Algolia indices between accounts and validating
//! the result.
//! Pedantic lints relaxed for CLI ergonomics.

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use index_migrate::config::{
    EXAMPLE_CONFIG, SOURCE_API_KEY_ENV, SOURCE_APP_ID_ENV, TARGET_API_KEY_ENV, TARGET_APP_ID_ENV,
};
use index_migrate::logging::{self, LogFiles};
use index_migrate::prompt::{Confirm, FixedAnswer, TerminalConfirm};
use index_migrate::{AlgoliaCli, Pipeline, RunArtifacts, RunConfig, RunMode, Validator};

#[derive(Parser)]
#[command(name = "index-migrate")]
#[command(version)]
#[command(
    about = "Migrate Algolia indices between accounts and validate the result",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: Overrides,
}

/// Values that take precedence over the configuration file.
#[derive(Args)]
struct Overrides {
    /// Source application ID
    #[arg(long, env = SOURCE_APP_ID_ENV, global = true)]
    source_app_id: Option<String>,

    /// Source API key
    #[arg(long, env = SOURCE_API_KEY_ENV, hide_env_values = true, global = true)]
    source_api_key: Option<String>,

    /// Target application ID
    #[arg(long, env = TARGET_APP_ID_ENV, global = true)]
    target_app_id: Option<String>,

    /// Target API key
    #[arg(long, env = TARGET_API_KEY_ENV, hide_env_values = true, global = true)]
    target_api_key: Option<String>,

    /// Artifact root directory
    #[arg(long, value_name = "DIR", global = true)]
    artifacts_dir: Option<PathBuf>,

    /// Only process indices of this hub (repeatable)
    #[arg(long = "hub", value_name = "HUB", global = true)]
    hubs: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List, confirm and migrate every index
    Migrate {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List and classify indices without migrating
    Plan,

    /// Compare source and target indices
    Validate,

    /// Generate example configuration
    Init {
        /// Output file path
        #[arg(short, long, default_value = "index-migrate.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { output, force } = &cli.command {
        return generate_config(output, *force);
    }

    let log_files = logging::init(cli.verbose);
    let config = load_config(cli.config.as_deref(), cli.overrides)?;

    match cli.command {
        Commands::Migrate { yes } => {
            let confirm: Box<dyn Confirm> = if yes {
                Box::new(FixedAnswer(true))
            } else {
                Box::new(TerminalConfirm::new())
            };
            run_migration(&config, &log_files, RunMode::Migrate, confirm.as_ref()).await
        }
        Commands::Plan => {
            run_migration(&config, &log_files, RunMode::Plan, &FixedAnswer(false)).await
        }
        Commands::Validate => run_validation(&config, &log_files).await,
        Commands::Init { .. } => Ok(()),
    }
}

fn load_config(path: Option<&Path>, overrides: Overrides) -> anyhow::Result<RunConfig> {
    let mut config = match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            RunConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => RunConfig::default(),
    };

    if overrides.source_app_id.is_some() {
        config.source.app_id = overrides.source_app_id;
    }
    if overrides.source_api_key.is_some() {
        config.source.api_key = overrides.source_api_key;
    }
    if overrides.target_app_id.is_some() {
        config.target.app_id = overrides.target_app_id;
    }
    if overrides.target_api_key.is_some() {
        config.target.api_key = overrides.target_api_key;
    }
    if let Some(root) = overrides.artifacts_dir {
        config.artifacts.root = root;
    }
    if !overrides.hubs.is_empty() {
        config.hubs = overrides.hubs;
    }

    config.validate()?;
    Ok(config)
}

fn open_run(
    config: &RunConfig,
    log_files: &LogFiles,
    mode: RunMode,
) -> anyhow::Result<RunArtifacts> {
    let artifacts = RunArtifacts::create(&config.artifacts.root, mode)?;
    if let Err(e) = log_files.attach(artifacts.dir()) {
        warn!(error = %e, "Run logs will only be written to the console");
    }
    info!(dir = %artifacts.dir().display(), "Run artifacts directory");
    Ok(artifacts)
}

async fn run_migration(
    config: &RunConfig,
    log_files: &LogFiles,
    mode: RunMode,
    confirm: &dyn Confirm,
) -> anyhow::Result<()> {
    let artifacts = open_run(config, log_files, mode)?;
    let client = AlgoliaCli::new(&config.client.binary);

    let report = Pipeline::new(config, &client, confirm)
        .run(&artifacts)
        .await?;

    let classification = &report.classification;
    println!();
    if mode == RunMode::Plan {
        println!("{}", style("Migration Plan").bold());
    } else if report.confirmed && report.is_success() {
        println!("{}", style("✅ Migration Complete!").green().bold());
    } else if !report.confirmed && report.is_success() {
        println!("{}", style("Migration cancelled, nothing was changed").yellow());
    } else {
        println!("{}", style("❌ Migration Failed").red().bold());
    }
    println!("   Primaries:  {}", classification.primaries.len());
    println!("   Replicas:   {}", classification.replicas.len());
    println!("   Hubs:       {}", classification.hubs.join(", "));
    if mode == RunMode::Migrate {
        println!(
            "   Stages:     {}/{}",
            report.stages_completed(),
            classification.stage_count()
        );
    }
    if !report.link_issues.is_empty() {
        println!("   Link issues: {}", style(report.link_issues.len()).yellow());
    }
    println!("   Duration:   {:.2}s", report.duration_secs);
    println!("   Artifacts:  {}", report.artifacts_dir.display());
    print_cleanup_failures(&report.cleanup_failures);

    if let Some(failure) = report.failure {
        return Err(anyhow::Error::new(failure).context("migration failed"));
    }
    Ok(())
}

async fn run_validation(config: &RunConfig, log_files: &LogFiles) -> anyhow::Result<()> {
    let artifacts = open_run(config, log_files, RunMode::Validate)?;
    let client = AlgoliaCli::new(&config.client.binary);

    let report = Validator::new(config, &client).run(&artifacts).await?;

    println!();
    if report.is_clean() {
        println!("{}", style("✅ Source and target match").green().bold());
    } else {
        println!("{}", style("❌ Validation found differences").red().bold());
    }
    println!("   Indices:    {}", report.results.len());
    println!("   Findings:   {}", report.findings.len());
    for finding in &report.findings {
        println!("     - {finding}");
    }
    println!("   Duration:   {:.2}s", report.duration_secs);
    println!("   Artifacts:  {}", report.artifacts_dir.display());
    print_cleanup_failures(&report.cleanup_failures);

    if let Some(failure) = report.failure {
        return Err(anyhow::Error::new(failure).context("validation failed"));
    }
    if !report.findings.is_empty() {
        anyhow::bail!("validation found {} finding(s)", report.findings.len());
    }
    Ok(())
}

fn print_cleanup_failures(failures: &[index_migrate::profiles::CleanupFailure]) {
    if failures.is_empty() {
        return;
    }
    println!(
        "   {}",
        style("Profiles left behind (remove with `algolia profile remove <name>`):").yellow()
    );
    for failure in failures {
        println!("     - {}: {}", failure.profile, failure.message);
    }
}

fn generate_config(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    std::fs::write(output, EXAMPLE_CONFIG)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("✅ Generated configuration: {:?}", output);
    println!(
        "   Edit the file and run: index-migrate --config {:?} plan",
        output
    );

    Ok(())
}
