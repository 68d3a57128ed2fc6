//! Command line interface definition

use clap::{Parser, Subcommand};
use otadex_types::ColorChoice;
use std::path::PathBuf;

/// otadex - A/B OTA dexopt coordinator
#[derive(Parser)]
#[command(name = "otadex")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A/B OTA dexopt coordinator")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to /data/misc/otadex/logs/
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Package manifest to read installed packages from
    #[arg(long, global = true, value_name = "PATH", env = "OTADEX_MANIFEST")]
    pub manifest: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print every dexopt command for the installed packages, one per line
    Export {
        /// Stop after this many commands
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Compile every package in place through the execution backend
    Run {
        /// Program executed for each compilation request
        #[arg(long, value_name = "PATH")]
        backend: Option<PathBuf>,
    },

    /// Move artifacts staged by an update into place
    Relocate,
}
