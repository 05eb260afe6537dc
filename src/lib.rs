pub mod bio;
pub mod cli;
pub mod core;
pub mod tools;
pub mod utils;

pub use crate::core::cache::SequenceCache;
pub use crate::core::pipeline::AnnotationPipeline;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MicronotaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Cache build failed: {0}")]
    CacheBuild(String),

    #[error("Cache teardown failed for {path:?}: {source}")]
    CacheTeardown {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No alignment records to select best hits from")]
    EmptyInput,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MicronotaError>;
