//! geodump: random-access index and coordinate extraction for MediaWiki dumps

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use geodump::config::{Config, LogFormat};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "geodump")]
#[command(about = "Random-access offset index and coordinate extraction for MediaWiki XML dumps")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "geodump.toml")]
    config: PathBuf,

    /// Uncompressed XML dump file
    #[arg(short, long)]
    dump: Option<PathBuf>,

    /// Directory holding the index database
    #[arg(short, long)]
    index_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (no progress output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the dump and persist record offsets and coordinates
    Scan {
        /// Scan only this fraction of the estimated record count
        #[arg(long)]
        sample: Option<f64>,

        /// Estimated record count used by a sampled scan
        #[arg(long)]
        estimate: Option<u64>,

        /// Commit every N records
        #[arg(long)]
        commit_every: Option<usize>,
    },

    /// Backfill titles for indexed records
    Titles {
        /// Stop after this many records
        #[arg(long)]
        max: Option<u64>,
    },

    /// Regenerate coordinate rows from indexed records
    Coords {
        /// Drop existing coordinate rows first
        #[arg(long)]
        rebuild: bool,
    },

    /// Show one record by number
    Show {
        record: u64,

        /// Print the record's raw XML
        #[arg(long)]
        raw: bool,
    },

    /// Find the record carrying a title
    Lookup { title: String },

    /// Show index status
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config, falling back to defaults when no file exists
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    if let Some(dump) = cli.dump {
        config.dump.path = dump;
    }
    if let Some(index_dir) = cli.index_dir {
        config.dump.index_dir = index_dir;
    }
    if let Commands::Scan {
        sample,
        estimate,
        commit_every,
    } = &cli.command
    {
        if let Some(fraction) = sample {
            config.scan.sample_fraction = *fraction;
        }
        if let Some(estimate) = estimate {
            config.scan.estimated_records = *estimate;
        }
        if let Some(commit_every) = commit_every {
            config.scan.commit_every = *commit_every;
        }
    }
    config.validate()?;

    // Setup logging
    let log_level = config.logging.level.raised(cli.verbose).to_tracing();
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr);
    match config.logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }

    info!("Index directory: {}", config.dump.index_dir.display());

    match cli.command {
        Commands::Scan { .. } => commands::scan_dump(config, cli.json, cli.quiet),
        Commands::Titles { max } => commands::index_titles(config, max, cli.json, cli.quiet),
        Commands::Coords { rebuild } => {
            commands::backfill_coordinates(config, rebuild, cli.json, cli.quiet)
        }
        Commands::Show { record, raw } => commands::show_record(config, record, cli.json, raw),
        Commands::Lookup { title } => commands::lookup_title(config, &title, cli.json),
        Commands::Status => commands::show_status(config, cli.json),
    }
}
