use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Tiller LLM completion core
#[derive(Debug, Parser)]
#[command(name = "tiller", about = "Inspect LLM call options and normalize provider responses")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tiller.toml", env = "TILLER_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the configuration and print the resolved model settings
    Check,

    /// Print the kwargs a responses-API call would use
    Options {
        /// Extra `include` entries
        #[arg(long)]
        include: Vec<String>,

        /// Explicit `store` flag
        #[arg(long)]
        store: Option<bool>,
    },

    /// Normalize a raw provider response and print the uniform response
    Normalize {
        /// Wire shape of the input
        #[arg(long, value_enum)]
        shape: Shape,

        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
    },
}

/// Provider response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shape {
    /// Chat-completions response
    Chat,
    /// Responses-API response
    Responses,
}
