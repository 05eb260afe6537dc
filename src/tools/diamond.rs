//! DIAMOND aligner integration.
//!
//! Searches are staged the way the tool expects: `blastp`/`blastx` writes a
//! binary `.daa` archive, `view` renders it as BLAST tabular or SAM text, and
//! the text is parsed into [`HitRecord`]s. `makedb` formats a FASTA file into
//! a searchable `.dmnd` database.

use crate::bio::fasta::write_fasta;
use crate::bio::sequence::Sequence;
use crate::core::hits::HitRecord;
use crate::tools::traits::{Aligner, DatabaseFormatter};
use crate::{MicronotaError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use tracing::{debug, info};

/// Supported search modes. Each maps to a fixed subcommand; unknown modes are
/// rejected when configuration is read, not when the tool is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignerMode {
    /// Protein query against protein database
    Blastp,
    /// Translated nucleotide query against protein database
    Blastx,
}

impl AlignerMode {
    fn subcommand(&self) -> &'static str {
        match self {
            AlignerMode::Blastp => "blastp",
            AlignerMode::Blastx => "blastx",
        }
    }
}

impl FromStr for AlignerMode {
    type Err = MicronotaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "blastp" => Ok(AlignerMode::Blastp),
            "blastx" => Ok(AlignerMode::Blastx),
            _ => Err(MicronotaError::Config(format!("Unknown aligner: {}", s))),
        }
    }
}

impl std::fmt::Display for AlignerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.subcommand())
    }
}

/// Output format requested from `diamond view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Tab,
    Sam,
}

impl OutputFormat {
    fn flag_value(&self) -> &'static str {
        match self {
            OutputFormat::Tab => "tab",
            OutputFormat::Sam => "sam",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tab => "diamond",
            OutputFormat::Sam => "sam",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = MicronotaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tab" => Ok(OutputFormat::Tab),
            "sam" => Ok(OutputFormat::Sam),
            _ => Err(MicronotaError::Config(format!(
                "Unknown output format: {}",
                s
            ))),
        }
    }
}

/// DIAMOND wrapper. One instance drives every pass of a pipeline run;
/// per-pass files are named from the database file stem.
pub struct DiamondAligner {
    binary_path: PathBuf,
    out_dir: PathBuf,
    tmp_dir: PathBuf,
    mode: AlignerMode,
    format: OutputFormat,
    evalue: f64,
    threads: usize,
    max_target_seqs: Option<usize>,
    extra_args: Vec<String>,
}

impl DiamondAligner {
    pub fn new(binary_path: PathBuf, out_dir: PathBuf, tmp_dir: PathBuf) -> Result<Self> {
        if !binary_path.exists() {
            return Err(MicronotaError::Config(format!(
                "diamond binary not found at {:?}",
                binary_path
            )));
        }
        fs::create_dir_all(&out_dir)?;
        fs::create_dir_all(&tmp_dir)?;

        Ok(Self {
            binary_path,
            out_dir,
            tmp_dir,
            mode: AlignerMode::Blastp,
            format: OutputFormat::Tab,
            evalue: 0.001,
            threads: 1,
            max_target_seqs: None,
            extra_args: Vec::new(),
        })
    }

    /// Locate `diamond` on PATH.
    pub fn locate(out_dir: PathBuf, tmp_dir: PathBuf) -> Result<Self> {
        let binary_path = which::which("diamond")
            .map_err(|e| MicronotaError::Config(format!("diamond not found on PATH: {}", e)))?;
        Self::new(binary_path, out_dir, tmp_dir)
    }

    pub fn with_mode(mut self, mode: AlignerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_evalue(mut self, evalue: f64) -> Self {
        self.evalue = evalue;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_target_seqs(mut self, max: Option<usize>) -> Self {
        self.max_target_seqs = max;
        self
    }

    /// Opaque passthrough flags appended to every search invocation.
    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn check_version(&self) -> Result<String> {
        let output = Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .map_err(|e| MicronotaError::Search(format!("Failed to run diamond: {}", e)))?;

        if !output.status.success() {
            return Err(MicronotaError::Search(
                "diamond --version returned error".to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Spawn a subcommand and collapse a non-zero exit into an error message.
    fn run(&self, cmd: &mut Command) -> std::result::Result<(), String> {
        info!("Running: {:?}", cmd);

        let output = cmd
            .output()
            .map_err(|e| format!("failed to spawn diamond: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "diamond exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            ));
        }

        debug!("{}", String::from_utf8_lossy(&output.stderr).trim());
        Ok(())
    }

    /// Run `diamond blastp|blastx` producing a `.daa` archive.
    fn run_blast(&self, query: &Path, db: &Path, daa: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg(self.mode.subcommand())
            .arg("--query")
            .arg(query)
            .arg("--db")
            .arg(db)
            .arg("--daa")
            .arg(daa)
            .arg("--evalue")
            .arg(self.evalue.to_string())
            .arg("--threads")
            .arg(self.threads.to_string())
            .arg("--tmpdir")
            .arg(&self.tmp_dir);

        if let Some(max) = self.max_target_seqs {
            cmd.arg("--max-target-seqs").arg(max.to_string());
        }
        cmd.args(&self.extra_args);

        self.run(&mut cmd).map_err(MicronotaError::Search)
    }

    /// Run `diamond view` rendering a `.daa` archive as text.
    fn run_view(&self, daa: &Path, out: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("view")
            .arg("--daa")
            .arg(daa)
            .arg("--out")
            .arg(out)
            .arg("--outfmt")
            .arg(self.format.flag_value());

        self.run(&mut cmd).map_err(MicronotaError::Search)
    }
}

impl Aligner for DiamondAligner {
    fn search(&self, queries: &[Sequence], db: &Path) -> Result<Vec<HitRecord>> {
        let prefix = db
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("database");

        let query_path = self.tmp_dir.join(format!("{}.query.fasta", prefix));
        write_fasta(&query_path, queries)
            .map_err(|e| MicronotaError::Search(format!("writing query file: {}", e)))?;

        let daa_path = self.out_dir.join(format!("{}.daa", prefix));
        let out_path = self
            .out_dir
            .join(format!("{}.{}", prefix, self.format.extension()));

        self.run_blast(&query_path, db, &daa_path)?;
        self.run_view(&daa_path, &out_path)?;

        if !out_path.exists() {
            return Ok(Vec::new());
        }

        match self.format {
            OutputFormat::Tab => parse_tabular(&out_path),
            OutputFormat::Sam => parse_sam(&out_path),
        }
    }

    fn name(&self) -> &str {
        "diamond"
    }
}

impl DatabaseFormatter for DiamondAligner {
    fn format_db(&self, fasta: &Path, db: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("makedb")
            .arg("--in")
            .arg(fasta)
            .arg("--db")
            .arg(db)
            .arg("--threads")
            .arg(self.threads.to_string());

        self.run(&mut cmd).map_err(MicronotaError::CacheBuild)
    }
}

/// Parse BLAST tabular output. Fixed 12-column layout: qseqid, sseqid,
/// pident, length, mismatch, gapopen, qstart, qend, sstart, send, evalue,
/// bitscore.
pub fn parse_tabular(path: &Path) -> Result<Vec<HitRecord>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 12 {
            continue;
        }

        records.push(HitRecord {
            query_id: parts[0].to_string(),
            target_id: parts[1].to_string(),
            identity: parts[2].parse().unwrap_or(0.0),
            alignment_length: parts[3].parse().unwrap_or(0),
            mismatches: parts[4].parse().unwrap_or(0),
            gap_opens: parts[5].parse().unwrap_or(0),
            query_start: parts[6].parse().unwrap_or(0),
            query_end: parts[7].parse().unwrap_or(0),
            target_start: parts[8].parse().unwrap_or(0),
            target_end: parts[9].parse().unwrap_or(0),
            evalue: parts[10].parse().unwrap_or(1.0),
            bit_score: parts[11].parse().unwrap_or(0.0),
            aligned: None,
        });
    }

    Ok(records)
}

/// Parse SAM output. The aligned sequence text comes from the SEQ column;
/// identity, alignment length, target start, e-value, and bit score come from
/// the tool's ZI/ZL/ZS/ZE/ZR optional tags.
pub fn parse_sam(path: &Path) -> Result<Vec<HitRecord>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.starts_with('@') || line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 11 {
            continue;
        }

        let target_id = parts[2];
        if target_id == "*" {
            // Unaligned record
            continue;
        }

        let mut record = HitRecord::new(parts[0], target_id);
        record.query_start = parts[3].parse().unwrap_or(0);
        record.aligned = Some(parts[9].to_string());

        for tag in &parts[11..] {
            let mut fields = tag.splitn(3, ':');
            let name = fields.next().unwrap_or("");
            let _type = fields.next();
            let value = fields.next().unwrap_or("");

            match name {
                "ZI" => record.identity = value.parse().unwrap_or(0.0),
                "ZL" => record.alignment_length = value.parse().unwrap_or(0),
                "ZS" => record.target_start = value.parse().unwrap_or(0),
                "ZE" => record.evalue = value.parse().unwrap_or(1.0),
                "ZR" => record.bit_score = value.parse().unwrap_or(0.0),
                _ => {}
            }
        }

        records.push(record);
    }

    Ok(records)
}
