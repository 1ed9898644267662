//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tableschema: typed schemas for tabular data
#[derive(Parser)]
#[command(name = "tableschema")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer a schema descriptor from a data file
    Infer {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the descriptor here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of rows to sample
        #[arg(long, default_value = "100")]
        limit: usize,

        /// Share of the leading type vote a candidate needs
        #[arg(long, default_value = "0.75")]
        confidence: f64,
    },

    /// Validate a schema descriptor
    Validate {
        /// Path or URL of the descriptor
        #[arg(value_name = "DESCRIPTOR")]
        descriptor: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read a data file, casting rows through a schema
    Read {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Path or URL of the schema descriptor (inferred when omitted)
        #[arg(short, long)]
        schema: Option<String>,

        /// JSON file mapping resource names to reference rows
        #[arg(short, long)]
        relations: Option<PathBuf>,

        /// Report errors and keep reading instead of stopping
        #[arg(long)]
        continue_on_error: bool,

        /// Stop after this many rows
        #[arg(long)]
        limit: Option<usize>,

        /// Expected size of the file in bytes
        #[arg(long)]
        size: Option<u64>,

        /// Expected SHA-256 of the file (hex, optionally "sha256:" prefixed)
        #[arg(long)]
        hash: Option<String>,

        /// Output rows as JSON lines
        #[arg(long)]
        json: bool,
    },
}
