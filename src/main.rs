use clap::Parser;
use colored::*;
use micronota::cli::{Cli, Commands};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging with MICRONOTA_LOG environment variable support
    let log_level = std::env::var("MICRONOTA_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<micronota::MicronotaError>() {
            Some(micronota::MicronotaError::Config(_)) => 2,
            Some(micronota::MicronotaError::Io(_)) => 3,
            Some(micronota::MicronotaError::Parse(_))
            | Some(micronota::MicronotaError::EmptyInput) => 4,
            Some(micronota::MicronotaError::Search(_)) => 5,
            Some(micronota::MicronotaError::CacheBuild(_))
            | Some(micronota::MicronotaError::CacheTeardown { .. }) => 6,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // External tools take the thread count; nothing in-process parallelizes
    let threads = if cli.threads == 0 {
        num_cpus::get()
    } else {
        cli.threads
    };

    if cli.verbose > 0 {
        eprintln!("Using {} threads for external tools", threads);
    }

    match cli.command {
        Commands::Annotate(args) => micronota::cli::commands::annotate::run(args, threads),
        Commands::Genes(args) => micronota::cli::commands::genes::run(args),
    }
}
