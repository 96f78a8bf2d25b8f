// SPDX-License-Identifier: AGPL-3.0-or-later
//! StrataFS CLI
//!
//! File operations over a virtual tree rooted at a local directory.

mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use stratafs_adapters::LocalAdapter;
use stratafs_core::{AdapterConfig, StrataResult, Vfs};

#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about = "StrataFS - virtual filesystem toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Local directory exposed as the virtual tree
    #[arg(short, long, global = true, default_value = ".")]
    root: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List directory contents
    #[command(alias = "dir")]
    Ls {
        /// Path to list
        #[arg(default_value = "/")]
        path: String,

        /// Long format with details
        #[arg(short, long)]
        long: bool,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,
    },

    /// Display file contents
    Cat {
        /// File to display
        path: String,
    },

    /// Copy a file or directory
    Cp {
        src: String,
        dst: String,

        /// Process directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Replace a conflicting destination
        #[arg(short, long)]
        force: bool,

        /// Nest a file inside an existing destination directory
        #[arg(short, long)]
        merge: bool,

        /// Create missing destination ancestors
        #[arg(short, long)]
        parents: bool,
    },

    /// Move a file or directory
    Mv {
        src: String,
        dst: String,

        /// Process directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Replace a conflicting destination
        #[arg(short, long)]
        force: bool,

        /// Nest a file inside an existing destination directory
        #[arg(short, long)]
        merge: bool,

        /// Create missing destination ancestors
        #[arg(short, long)]
        parents: bool,
    },

    /// Delete a file or directory
    Rm {
        path: String,

        /// Delete directory trees recursively
        #[arg(short, long)]
        recursive: bool,

        /// Delete non-writable files too
        #[arg(short, long)]
        force: bool,
    },

    /// Create a directory
    Mkdir {
        path: String,

        /// Create missing ancestors
        #[arg(short, long)]
        parents: bool,
    },

    /// Show metadata for a path
    Stat { path: String },

    /// BLAKE3 digest of a file
    Hash { path: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("strata: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> StrataResult<()> {
    let config = AdapterConfig::builder().root(&cli.root).build()?;
    let adapter = Arc::new(LocalAdapter::new("local", &config)?);
    let vfs = Vfs::new(adapter);

    match cli.command {
        Commands::Ls { path, long, human } => commands::ls(&vfs, &path, long, human).await,
        Commands::Cat { path } => commands::cat(&vfs, &path).await,
        Commands::Cp {
            src,
            dst,
            recursive,
            force,
            merge,
            parents,
        } => {
            let flags = commands::transfer_flags(recursive, force, merge, parents);
            commands::cp(&vfs, &src, &dst, flags).await
        }
        Commands::Mv {
            src,
            dst,
            recursive,
            force,
            merge,
            parents,
        } => {
            let flags = commands::transfer_flags(recursive, force, merge, parents);
            commands::mv(&vfs, &src, &dst, flags).await
        }
        Commands::Rm {
            path,
            recursive,
            force,
        } => commands::rm(&vfs, &path, recursive, force).await,
        Commands::Mkdir { path, parents } => commands::mkdir(&vfs, &path, parents).await,
        Commands::Stat { path } => commands::stat(&vfs, &path).await,
        Commands::Hash { path } => commands::hash(&vfs, &path).await,
    }
}
