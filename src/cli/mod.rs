pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "micronota",
    version,
    about = "Annotation pipeline for microbial (meta)genomes",
    long_about = "Micronota annotates microbial genomes and metagenomes by predicting genes \
                  with an external gene finder and assigning function through sequential \
                  searches against an ordered list of reference databases, caching recently \
                  unmatched sequences to skip redundant work across runs."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads for external tools (0 = all available)
    #[arg(short = 'j', long, default_value = "1", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate protein sequences against reference databases
    Annotate(commands::annotate::AnnotateArgs),

    /// Predict genes with the external gene finder
    Genes(commands::genes::GenesArgs),
}
