//! Prodigal gene-finder integration.

use crate::{MicronotaError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use tracing::{debug, info};

/// Gene-prediction procedure. `Single` fits a model to the input genome;
/// `Meta` uses pre-trained models and suits short or mixed-origin contigs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureMode {
    Single,
    Meta,
}

impl ProcedureMode {
    fn flag_value(&self) -> &'static str {
        match self {
            ProcedureMode::Single => "single",
            ProcedureMode::Meta => "meta",
        }
    }
}

impl FromStr for ProcedureMode {
    type Err = MicronotaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "single" => Ok(ProcedureMode::Single),
            "meta" => Ok(ProcedureMode::Meta),
            _ => Err(MicronotaError::Config(format!(
                "Unknown procedure mode: {}",
                s
            ))),
        }
    }
}

/// Format of the coordinate output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneFormat {
    Gbk,
    Gff,
}

impl GeneFormat {
    fn flag_value(&self) -> &'static str {
        match self {
            GeneFormat::Gbk => "gbk",
            GeneFormat::Gff => "gff",
        }
    }
}

impl FromStr for GeneFormat {
    type Err = MicronotaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gbk" => Ok(GeneFormat::Gbk),
            "gff" => Ok(GeneFormat::Gff),
            _ => Err(MicronotaError::Config(format!(
                "Unknown gene output format: {}",
                s
            ))),
        }
    }
}

/// Output files of one prediction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenePrediction {
    /// Gene coordinates (`<prefix>.gbk` or `<prefix>.gff`)
    pub genes: PathBuf,
    /// Translated protein sequences (`<prefix>.faa`)
    pub proteins: PathBuf,
    /// Nucleotide gene sequences (`<prefix>.fna`)
    pub nucleotides: PathBuf,
}

/// Prodigal wrapper.
#[derive(Debug)]
pub struct Prodigal {
    binary_path: PathBuf,
    mode: ProcedureMode,
    format: GeneFormat,
}

impl Prodigal {
    pub fn new(binary_path: PathBuf) -> Result<Self> {
        if !binary_path.exists() {
            return Err(MicronotaError::Config(format!(
                "prodigal binary not found at {:?}",
                binary_path
            )));
        }

        Ok(Self {
            binary_path,
            mode: ProcedureMode::Meta,
            format: GeneFormat::Gbk,
        })
    }

    /// Locate `prodigal` on PATH.
    pub fn locate() -> Result<Self> {
        let binary_path = which::which("prodigal")
            .map_err(|e| MicronotaError::Config(format!("prodigal not found on PATH: {}", e)))?;
        Self::new(binary_path)
    }

    pub fn with_mode(mut self, mode: ProcedureMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_format(mut self, format: GeneFormat) -> Self {
        self.format = format;
        self
    }

    /// Predict genes for `input`, writing `<prefix>.*` files into `out_dir`.
    pub fn predict(&self, input: &Path, out_dir: &Path, prefix: &str) -> Result<GenePrediction> {
        fs::create_dir_all(out_dir)?;

        let prediction = GenePrediction {
            genes: out_dir.join(format!("{}.{}", prefix, self.format.flag_value())),
            proteins: out_dir.join(format!("{}.faa", prefix)),
            nucleotides: out_dir.join(format!("{}.fna", prefix)),
        };

        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-i")
            .arg(input)
            .arg("-o")
            .arg(&prediction.genes)
            .arg("-a")
            .arg(&prediction.proteins)
            .arg("-d")
            .arg(&prediction.nucleotides)
            .arg("-p")
            .arg(self.mode.flag_value())
            .arg("-f")
            .arg(self.format.flag_value())
            .arg("-q");

        info!("Running: {:?}", cmd);
        let output = cmd
            .output()
            .map_err(|e| MicronotaError::Search(format!("failed to spawn prodigal: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MicronotaError::Search(format!(
                "prodigal exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        debug!("{}", String::from_utf8_lossy(&output.stderr).trim());
        Ok(prediction)
    }
}
