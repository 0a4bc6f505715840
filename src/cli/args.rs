//! CLI argument definitions using clap
//!
//! Commands:
//! - simple-model check --models <path> --model <Name>
//! - simple-model describe --models <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Declarative record models: validate JSON input against declared models
#[derive(Parser, Debug)]
#[command(name = "simple-model")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build one record per stdin line and report the result
    Check {
        /// Declaration file, or a directory of *.json declaration files
        #[arg(long)]
        models: PathBuf,

        /// Name of the model to build
        #[arg(long)]
        model: String,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Resolve absent fields through the null path
        #[arg(long)]
        allow_missing: bool,

        /// Discard undeclared input keys instead of rejecting them
        #[arg(long)]
        allow_unknown: bool,
    },

    /// Print the fields of every declared model
    Describe {
        /// Declaration file, or a directory of *.json declaration files
        #[arg(long)]
        models: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
