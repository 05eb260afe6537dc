/// Traits for alignment tools
use crate::bio::sequence::Sequence;
use crate::core::hits::HitRecord;
use crate::Result;
use std::path::Path;

/// One search pass: the current query remainder against one database.
pub trait Aligner {
    /// Search `queries` against the database at `db`, returning the raw hit
    /// records. Zero hits is an empty vec, not an error; a failed tool
    /// invocation is `MicronotaError::Search`.
    fn search(&self, queries: &[Sequence], db: &Path) -> Result<Vec<HitRecord>>;

    /// Tool name for log lines.
    fn name(&self) -> &str;
}

/// Materialize a searchable database from a sequence file.
pub trait DatabaseFormatter {
    /// Build the database at `db` from the FASTA file at `fasta`. A failed
    /// formatter invocation is `MicronotaError::CacheBuild`.
    fn format_db(&self, fasta: &Path, db: &Path) -> Result<()>;
}

/// What the pipeline needs from one external tool: searching and formatting.
pub trait SearchEngine: Aligner + DatabaseFormatter {}

impl<T: Aligner + DatabaseFormatter> SearchEngine for T {}
