//! Bambuclone CLI
//!
//! Command-line interface for:
//! - Running a clone job (`config.json`) against a Bambu Studio config tree
//! - Listing the profiles a config tree defines
//! - Printing a profile with its inheritance chain folded in

use anyhow::{Context, Result};
use bambuclone_core::{run_job, JobConfig, JobReport, ProfileIndex, ProfileType, DEFAULT_JOB_FILE};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bambuclone")]
#[command(author, version, about = "Clone Bambu Studio presets into user profiles")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the clone directives of a job file (default)
    Run {
        /// Job configuration file
        #[arg(short, long, default_value = DEFAULT_JOB_FILE)]
        config: PathBuf,
    },

    /// List indexed profiles
    List {
        /// Bambu Studio configuration root
        #[arg(short, long)]
        root: PathBuf,
        /// Only list one profile type
        #[arg(short = 't', long = "type")]
        profile_type: Option<ProfileType>,
    },

    /// Print a profile with its inheritance chain resolved
    Show {
        /// Bambu Studio configuration root
        #[arg(short, long)]
        root: PathBuf,
        #[arg(short = 't', long = "type")]
        profile_type: ProfileType,
        /// Profile name (as declared in the JSON, not the file name)
        #[arg(short, long)]
        name: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Commands::Run {
        config: PathBuf::from(DEFAULT_JOB_FILE),
    }) {
        Commands::Run { config } => cmd_run(&config),
        Commands::List { root, profile_type } => cmd_list(&root, profile_type),
        Commands::Show {
            root,
            profile_type,
            name,
        } => cmd_show(&root, profile_type, &name),
    }
}

fn cmd_run(config: &Path) -> Result<()> {
    let cwd = env::current_dir().context("failed to read the working directory")?;
    let config_path = cwd.join(config);
    tracing::debug!(path = %config_path.display(), "loading job configuration");
    let job = JobConfig::load(&config_path)
        .with_context(|| format!("failed to load job {}", config_path.display()))?;

    let report = run_job(&job, &cwd).context("clone job failed")?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &JobReport) {
    for profile in &report.cloned {
        println!(
            "{} {} {} -> {}",
            "cloned".green().bold(),
            profile.profile_type,
            profile.name.bold(),
            profile.json_path.display()
        );
    }
    for skipped in &report.skipped {
        println!("{} {}", "skipped".yellow().bold(), skipped.reason);
    }
    println!(
        "{} cloned, {} skipped",
        report.cloned.len(),
        report.skipped.len()
    );
}

fn cmd_list(root: &Path, profile_type: Option<ProfileType>) -> Result<()> {
    let index = ProfileIndex::build(root)
        .with_context(|| format!("failed to index {}", root.display()))?;

    let types: Vec<ProfileType> = match profile_type {
        Some(t) => vec![t],
        None => ProfileType::ALL.to_vec(),
    };

    for ty in types {
        let records = index.list(ty);
        println!("{} ({})", ty.to_string().cyan().bold(), records.len());
        for record in records {
            println!(
                "  {:<48} {:<6} {}",
                record.name,
                record.scope,
                record.path.display().to_string().dimmed()
            );
        }
    }
    Ok(())
}

fn cmd_show(root: &Path, profile_type: ProfileType, name: &str) -> Result<()> {
    let index = ProfileIndex::build(root)
        .with_context(|| format!("failed to index {}", root.display()))?;
    let record = index
        .find(profile_type, name)
        .with_context(|| format!("settings for {profile_type} \"{name}\" not found"))?;

    let flat = index.resolve(record)?;
    println!("{}", serde_json::to_string_pretty(&flat)?);
    Ok(())
}
