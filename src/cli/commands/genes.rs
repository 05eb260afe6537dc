use crate::tools::prodigal::{GeneFormat, ProcedureMode, Prodigal};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct GenesArgs {
    /// Input genome or contigs (FASTA, GenBank, or EMBL)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Prefix for output file names
    #[arg(short, long, default_value = "genes")]
    pub prefix: String,

    /// Prediction procedure (single or meta)
    #[arg(short, long, default_value = "meta")]
    pub mode: ProcedureMode,

    /// Coordinate output format (gbk or gff)
    #[arg(short, long, default_value = "gbk")]
    pub format: GeneFormat,
}

pub fn run(args: GenesArgs) -> Result<()> {
    let prodigal = Prodigal::locate()?
        .with_mode(args.mode)
        .with_format(args.format);

    let prediction = prodigal.predict(&args.input, &args.out_dir, &args.prefix)?;

    info!("Gene coordinates: {:?}", prediction.genes);
    info!("Protein translations: {:?}", prediction.proteins);
    info!("Nucleotide sequences: {:?}", prediction.nucleotides);

    Ok(())
}
