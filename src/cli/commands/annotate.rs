use crate::bio::fasta::{parse_fasta, write_fasta};
use crate::core::cache::SequenceCache;
use crate::core::config::{load_config, Config};
use crate::core::pipeline::AnnotationPipeline;
use crate::tools::diamond::{AlignerMode, DiamondAligner, OutputFormat};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// Run metadata written next to the result table.
#[derive(Serialize)]
struct RunSummary {
    queries: usize,
    annotated: usize,
    unmatched: usize,
    databases: usize,
    cached: Option<usize>,
}

#[derive(Args)]
pub struct AnnotateArgs {
    /// Query sequences (FASTA, optionally gzip-compressed)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Reference databases, searched in the given order (repeatable)
    #[arg(short = 'd', long = "db", required = true)]
    pub databases: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long)]
    pub out_dir: PathBuf,

    /// Cache FASTA file; seeded from it when present, rewritten after the run
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Maximum number of sequences held in the cache
    #[arg(long)]
    pub cache_size: Option<usize>,

    /// Aligner mode (blastp or blastx)
    #[arg(long)]
    pub aligner: Option<AlignerMode>,

    /// Alignment output format (tab or sam)
    #[arg(long)]
    pub outfmt: Option<OutputFormat>,

    /// Threshold E-value
    #[arg(short, long)]
    pub evalue: Option<f64>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: AnnotateArgs, threads: usize) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path).context("reading configuration")?,
        None => Config::default(),
    };

    let aligner_mode = args.aligner.unwrap_or(config.search.aligner);
    let format = args.outfmt.unwrap_or(config.search.format);
    let evalue = args.evalue.unwrap_or(config.search.evalue);
    let cache_size = args.cache_size.unwrap_or(config.cache.max_size);

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating output directory {:?}", args.out_dir))?;
    let tmp_dir = match &config.general.tmp_dir {
        Some(dir) => PathBuf::from(dir),
        None => args.out_dir.join("tmp"),
    };

    let queries = parse_fasta(&args.input)
        .with_context(|| format!("reading query sequences from {:?}", args.input))?;
    info!("Read {} query sequences", queries.len());

    let engine = DiamondAligner::locate(args.out_dir.clone(), tmp_dir)?
        .with_mode(aligner_mode)
        .with_format(format)
        .with_evalue(evalue)
        .with_threads(threads)
        .with_max_target_seqs(config.search.max_target_seqs);

    let mut cache = match &args.cache {
        Some(path) => {
            let seed = if path.exists() {
                parse_fasta(path).with_context(|| format!("reading cache from {:?}", path))?
            } else {
                Vec::new()
            };
            info!("Cache seeded with {} sequences", seed.len());
            Some(SequenceCache::new(seed, cache_size, &args.out_dir))
        }
        None => None,
    };

    let pipeline = AnnotationPipeline::new(config.search.score_column);
    let table = pipeline.annotate(&queries, &args.databases, cache.as_mut(), &engine)?;

    let table_path = args.out_dir.join("annotations.tsv");
    let mut writer = BufWriter::new(File::create(&table_path)?);
    table.write_tsv(&mut writer)?;
    writer.flush()?;
    info!(
        "Annotated {}/{} queries, results in {:?}",
        table.len(),
        queries.len(),
        table_path
    );

    // Persist the updated cache contents for the next run
    if let (Some(cache), Some(path)) = (&cache, &args.cache) {
        write_fasta(path, cache.sequences())
            .with_context(|| format!("writing cache to {:?}", path))?;
        info!("Cache rewritten with {} sequences", cache.len());
    }

    let summary = RunSummary {
        queries: queries.len(),
        annotated: table.len(),
        unmatched: queries.len() - table.len(),
        databases: args.databases.len(),
        cached: cache.as_ref().map(|c| c.len()),
    };
    fs::write(
        args.out_dir.join("summary.json"),
        serde_json::to_string_pretty(&summary)?,
    )?;

    Ok(())
}
