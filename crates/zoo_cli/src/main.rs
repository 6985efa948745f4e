//! Zoo CLI
//!
//! Command-line tools for versioning data cells as JSON snapshots.
//!
//! # Commands
//!
//! - `init` - Load a snapshot into a cell under fresh ids
//! - `add` - Add snapshot records the cell does not hold yet
//! - `commit` - Write a cell to `<prefix>.json` and `<prefix>.zoo`
//! - `pull` - Bring a cell up to date with a snapshot
//! - `diff` - Write per-record deltas between a cell and a snapshot
//! - `drop` - Drop a cell
//! - `destroy` - Drop a database
//! - `status` - Count the records of one cell or of every cell
//! - `sample` - Draw random records from a cell

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zoo_core::{Client, Config};

/// Versioned data cells for sequence collections.
#[derive(Parser)]
#[command(name = "zoo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Store root directory
    #[arg(global = true, long, env = "ZOO_CLIENT", default_value = "zoo-data")]
    client: PathBuf,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// The cell a command works on.
#[derive(Args)]
struct CellArgs {
    /// Database name
    #[arg(long)]
    db: String,

    /// Cell name
    #[arg(long)]
    cell: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a snapshot into a cell, assigning fresh ids
    Init {
        #[command(flatten)]
        target: CellArgs,

        /// Snapshot file
        file: PathBuf,
    },

    /// Add snapshot records that the cell does not hold yet
    Add {
        #[command(flatten)]
        target: CellArgs,

        /// Field (dotted path) identifying duplicates
        #[arg(long, default_value = "_id")]
        primkey: String,

        /// Snapshot file
        file: PathBuf,
    },

    /// Write a cell to <prefix>.json and its signatures to <prefix>.zoo
    Commit {
        #[command(flatten)]
        target: CellArgs,

        /// Comma separated list of k-mer sizes. Larger is more specific.
        #[arg(long, default_value = "16,31")]
        ksize: String,

        /// Hashes kept per signature
        #[arg(long, default_value_t = 1000)]
        n: usize,

        /// Output file prefix, without extension
        prefix: PathBuf,
    },

    /// Bring a cell up to date with a snapshot
    Pull {
        #[command(flatten)]
        target: CellArgs,

        /// Snapshot file
        file: PathBuf,
    },

    /// Write per-record deltas between a cell and a snapshot
    Diff {
        #[command(flatten)]
        target: CellArgs,

        /// Delta output file
        #[arg(long, default_value = "diff.json")]
        out: PathBuf,

        /// Snapshot file
        file: PathBuf,
    },

    /// Drop a cell
    Drop {
        #[command(flatten)]
        target: CellArgs,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Drop a database with all its cells
    Destroy {
        /// Database name
        #[arg(long)]
        db: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Count the records of one cell, or of every cell in a database
    Status {
        /// Database name
        #[arg(long)]
        db: String,

        /// Cell name; all cells when omitted
        #[arg(long)]
        cell: Option<String>,

        /// Print one example record
        #[arg(long)]
        example: bool,
    },

    /// Draw records uniformly at random from a cell
    Sample {
        #[command(flatten)]
        target: CellArgs,

        /// Only draw records matching this JSON object of path/value pairs
        #[arg(long)]
        filter: Option<String>,

        /// Number of records to draw
        #[arg(long, default_value_t = 10)]
        size: usize,

        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = Client::open(&cli.client, Config::default())?;

    match cli.command {
        Commands::Init { target, file } => {
            commands::init::run(&client, &target.db, &target.cell, &file)?;
        }
        Commands::Add {
            target,
            primkey,
            file,
        } => {
            commands::add::run(&client, &target.db, &target.cell, &primkey, &file)?;
        }
        Commands::Commit {
            target,
            ksize,
            n,
            prefix,
        } => {
            commands::commit::run(&client, &target.db, &target.cell, &ksize, n, &prefix)?;
        }
        Commands::Pull { target, file } => {
            commands::pull::run(&client, &target.db, &target.cell, &file)?;
        }
        Commands::Diff { target, out, file } => {
            commands::diff::run(&client, &target.db, &target.cell, &file, &out)?;
        }
        Commands::Drop { target, force } => {
            commands::drop::run(&client, &target.db, &target.cell, force)?;
        }
        Commands::Destroy { db, force } => {
            commands::destroy::run(&client, &db, force)?;
        }
        Commands::Status { db, cell, example } => {
            commands::status::run(&client, &db, cell.as_deref(), example)?;
        }
        Commands::Sample {
            target,
            filter,
            size,
            seed,
        } => {
            commands::sample::run(
                &client,
                &target.db,
                &target.cell,
                filter.as_deref(),
                size,
                seed,
            )?;
        }
    }

    Ok(())
}
