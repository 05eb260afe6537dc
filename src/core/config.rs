use crate::core::cache::DEFAULT_CACHE_SIZE;
use crate::core::hits::ScoreColumn;
use crate::tools::diamond::{AlignerMode, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Base directory for reference databases
    pub db_dir: Option<String>,
    /// Directory for intermediate files (query remainders, .daa output)
    pub tmp_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Aligner mode; unknown modes are rejected when the config is read
    pub aligner: AlignerMode,
    /// Alignment output format requested from the aligner
    pub format: OutputFormat,
    /// Column used to rank hits per query
    pub score_column: ScoreColumn,
    /// Threshold E-value passed to the aligner
    pub evalue: f64,
    /// Worker threads for the external aligner (0 = all available)
    pub threads: usize,
    /// Cap on target sequences per query, when set
    pub max_target_seqs: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of sequences retained across runs
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                db_dir: None,
                tmp_dir: None,
            },
            search: SearchConfig {
                aligner: AlignerMode::Blastp,
                format: OutputFormat::Tab,
                score_column: ScoreColumn::BitScore,
                evalue: 0.001,
                threads: 1,
                max_target_seqs: None,
            },
            cache: CacheConfig {
                max_size: DEFAULT_CACHE_SIZE,
            },
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, crate::MicronotaError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| crate::MicronotaError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), crate::MicronotaError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::MicronotaError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.aligner, AlignerMode::Blastp);
        assert_eq!(config.search.evalue, 0.001);
        assert_eq!(config.cache.max_size, DEFAULT_CACHE_SIZE);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("micronota.toml");

        let mut config = Config::default();
        config.search.aligner = AlignerMode::Blastx;
        config.search.threads = 8;
        config.cache.max_size = 500;

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded.search.aligner, AlignerMode::Blastx);
        assert_eq!(loaded.search.threads, 8);
        assert_eq!(loaded.cache.max_size, 500);
    }

    #[test]
    fn test_unknown_aligner_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("micronota.toml");
        let text = r#"
[general]

[search]
aligner = "tblastn"
format = "tab"
score_column = "bitscore"
evalue = 0.001
threads = 1

[cache]
max_size = 100
"#;
        std::fs::write(&path, text).unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, crate::MicronotaError::Config(_)));
    }
}
