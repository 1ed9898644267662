//! Tableschema CLI - infer, validate and read tables against a schema.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Infer {
            file,
            output,
            limit,
            confidence,
        } => commands::infer::run(file, output, limit, confidence),

        Commands::Validate { descriptor, json } => commands::validate::run(descriptor, json),

        Commands::Read {
            file,
            schema,
            relations,
            continue_on_error,
            limit,
            size,
            hash,
            json,
        } => commands::read::run(commands::read::ReadArgs {
            file,
            schema,
            relations,
            continue_on_error,
            limit,
            size,
            hash,
            json,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
