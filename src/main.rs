//! retrodiff - list and prune the increments of a reverse-incremental backup.
//!
//! Usage:
//!   retrodiff list PATH                          Describe the increments of a path
//!   retrodiff list PATH --parsable               Machine-readable listing
//!   retrodiff remove-older-than TIME REPOSITORY  Delete increments older than TIME
//!   retrodiff --help                             Show help

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use retrodiff_core::{ManageConfig, TimeCodec, TimeZoneMode, parse_time_spec};
use retrodiff_manage::{
    BackupLayout, ExecutionContext, catalog_entries, describe_human, describe_parsable,
};

#[derive(Parser)]
#[command(
    name = "retrodiff",
    version,
    about = "List and prune the increments of a reverse-incremental backup",
    long_about = "retrodiff inspects the increments stored next to a backup mirror.\n\n\
                  Use `list` to see the history of a path and `remove-older-than` \
                  to enforce a retention cutoff."
)]
struct Cli {
    /// Render and interpret times in UTC instead of the local zone
    #[arg(long, global = true)]
    utc: bool,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Describe the increments of a mirrored path
    List {
        /// Path inside the mirror
        path: PathBuf,

        /// Print `<seconds> <type>` lines, oldest first, current mirror last
        #[arg(long)]
        parsable: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete increments older than a time (e.g. "2W", "3D12h", "2002-03-05")
    RemoveOlderThan {
        /// Cutoff time
        time: String,

        /// Root of the mirror
        #[arg(default_value = ".")]
        repository: PathBuf,

        /// Report what would be deleted without deleting it
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let time_zone = if cli.utc {
        TimeZoneMode::Utc
    } else {
        TimeZoneMode::Local
    };

    match cli.command {
        Command::List {
            path,
            parsable,
            format,
        } => {
            run_list(&path, time_zone, parsable, format)?;
        }
        Command::RemoveOlderThan {
            time,
            repository,
            dry_run,
            format,
        } => {
            run_remove_older_than(&time, &repository, time_zone, dry_run, format)?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Describe the increments of one path.
fn run_list(
    path: &Path,
    time_zone: TimeZoneMode,
    parsable: bool,
    format: OutputFormat,
) -> Result<()> {
    let path = std::path::absolute(path).context("Invalid path")?;

    let config = ManageConfig::builder()
        .repository(&path)
        .time_zone(time_zone)
        .build()
        .context("Invalid configuration")?;
    let layout = BackupLayout::discover(&path, config).context("Not inside a backup")?;

    let mirror_time = layout.mirror_time().context("Cannot read current mirror time")?;
    let (increments, mirror) = layout
        .increments_for(&path)
        .context("Cannot list increments")?;
    debug!(path = %path.display(), mirror_time, count = increments.len(), "Listing increments");

    match format {
        OutputFormat::Json => {
            let entries = catalog_entries(&increments, mirror_time, &mirror)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text if parsable => {
            println!("{}", describe_parsable(&increments, mirror_time, &mirror)?);
        }
        OutputFormat::Text => {
            let codec = layout.config().codec();
            println!("{}", describe_human(&increments, mirror_time, &mirror, &codec));
        }
    }

    Ok(())
}

/// Prune a repository's data directory.
fn run_remove_older_than(
    spec: &str,
    repository: &Path,
    time_zone: TimeZoneMode,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let repository = repository.canonicalize().context("Invalid repository path")?;

    let config = ManageConfig::builder()
        .repository(&repository)
        .time_zone(time_zone)
        .dry_run(dry_run)
        .build()
        .context("Invalid configuration")?;
    let codec = config.codec();
    let layout = BackupLayout::new(config);

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .context("System clock is before the epoch")?
        .as_secs() as i64;
    let cutoff = parse_time_spec(spec, now, &codec)?;

    info!(
        cutoff,
        time = %codec.pretty(cutoff),
        repository = %repository.display(),
        dry_run,
        "Deleting increments older than cutoff"
    );

    let report = layout
        .prune_older_than(cutoff, ExecutionContext::Local)
        .context("Pruning failed")?;

    match format {
        OutputFormat::Text => {
            if report.is_empty() {
                println!("No increments older than the cutoff.");
            } else {
                for path in &report.removed {
                    println!("  {}", path.display());
                }
                println!("{}", report.summary());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
