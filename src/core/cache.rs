//! Bounded, disk-backed store of recently unmatched sequences.
//!
//! The cache is searched before the static reference databases because it is
//! the cheapest match source. Eviction is a recency-biased FIFO: `update`
//! prepends and truncates by position, with no access-time tracking.

use crate::bio::fasta::write_fasta;
use crate::bio::sequence::Sequence;
use crate::tools::traits::DatabaseFormatter;
use crate::utils::naming::{unique_token, RandomTokens, TokenSource};
use crate::{MicronotaError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default capacity, in sequences.
pub const DEFAULT_CACHE_SIZE: usize = 200_000;

pub struct SequenceCache {
    seqs: Vec<Sequence>,
    fasta: PathBuf,
    db: PathBuf,
    max_size: usize,
}

impl SequenceCache {
    /// Create a cache over `out_dir` with randomly tokened artifact names.
    pub fn new(seqs: Vec<Sequence>, max_size: usize, out_dir: &Path) -> Self {
        Self::with_token_source(seqs, max_size, out_dir, &mut RandomTokens::new())
    }

    /// Create a cache with an injected token source. Artifact names are
    /// `<token>.fasta` and `<token>.dmnd`; the token is retried until neither
    /// exists in `out_dir`.
    pub fn with_token_source(
        mut seqs: Vec<Sequence>,
        max_size: usize,
        out_dir: &Path,
        tokens: &mut dyn TokenSource,
    ) -> Self {
        let token = unique_token(out_dir, tokens, &["fasta", "dmnd"]);
        seqs.truncate(max_size);

        Self {
            seqs,
            fasta: out_dir.join(format!("{}.fasta", token)),
            db: out_dir.join(format!("{}.dmnd", token)),
            max_size,
        }
    }

    /// True iff the cache holds no sequences. The pipeline skips searching an
    /// empty cache entirely.
    pub fn is_empty(&self) -> bool {
        self.seqs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seqs.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.seqs
    }

    /// Path of the searchable database produced by `build`.
    pub fn db_path(&self) -> &Path {
        &self.db
    }

    /// Path of the on-disk sequence file produced by `build`.
    pub fn fasta_path(&self) -> &Path {
        &self.fasta
    }

    /// Write the held sequences to disk and run the external database
    /// formatter over them. Must run before any search against the cache.
    pub fn build(&self, formatter: &dyn DatabaseFormatter) -> Result<()> {
        info!(
            "Building cache database from {} sequences at {:?}",
            self.seqs.len(),
            self.db
        );

        write_fasta(&self.fasta, &self.seqs)
            .map_err(|e| MicronotaError::CacheBuild(format!("writing {:?}: {}", self.fasta, e)))?;

        formatter.format_db(&self.fasta, &self.db)
    }

    /// Prepend newly unmatched sequences, then truncate to capacity. Oldest
    /// entries by position are evicted.
    pub fn update(&mut self, new_seqs: Vec<Sequence>) {
        debug!(
            "Updating cache: {} new, {} held, capacity {}",
            new_seqs.len(),
            self.seqs.len(),
            self.max_size
        );

        let mut seqs = new_seqs;
        seqs.append(&mut self.seqs);
        seqs.truncate(self.max_size);
        self.seqs = seqs;
    }

    /// Delete the on-disk artifacts. Idempotent: an artifact that is already
    /// gone (or was never built) is not an error.
    pub fn close(&self) -> Result<()> {
        for path in [&self.fasta, &self.db] {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed cache artifact {:?}", path),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(MicronotaError::CacheTeardown {
                        path: path.clone(),
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::naming::FixedTokens;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn seq(id: &str) -> Sequence {
        Sequence::new(id.to_string(), b"MKTAYIAK".to_vec())
    }

    fn ids(cache: &SequenceCache) -> Vec<&str> {
        cache.sequences().iter().map(|s| s.id.as_str()).collect()
    }

    /// Formatter that just records the call and touches the db file.
    struct TouchFormatter {
        called: Cell<usize>,
    }

    impl TouchFormatter {
        fn new() -> Self {
            Self {
                called: Cell::new(0),
            }
        }
    }

    impl DatabaseFormatter for TouchFormatter {
        fn format_db(&self, _fasta: &Path, db: &Path) -> Result<()> {
            self.called.set(self.called.get() + 1);
            fs::write(db, b"").map_err(MicronotaError::Io)
        }
    }

    struct FailingFormatter;

    impl DatabaseFormatter for FailingFormatter {
        fn format_db(&self, _fasta: &Path, _db: &Path) -> Result<()> {
            Err(MicronotaError::CacheBuild("makedb exited with 1".into()))
        }
    }

    #[test]
    fn test_update_prepends_and_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SequenceCache::new(vec![seq("x"), seq("y")], 2, dir.path());

        cache.update(vec![seq("z")]);

        assert_eq!(ids(&cache), vec!["z", "x"]);
    }

    #[test]
    fn test_update_bounds_hold_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = SequenceCache::new(Vec::new(), 3, dir.path());

        for batch in [vec![seq("a"), seq("b")], vec![seq("c")], vec![seq("d"), seq("e")]] {
            cache.update(batch);
            assert!(cache.len() <= cache.max_size());
        }

        // Most recent batch first, then the survivors of the previous one
        assert_eq!(ids(&cache), vec!["d", "e", "c"]);
    }

    #[test]
    fn test_seed_truncated_to_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SequenceCache::new(vec![seq("a"), seq("b"), seq("c")], 2, dir.path());
        assert_eq!(ids(&cache), vec!["a", "b"]);
    }

    #[test]
    fn test_build_writes_fasta_and_formats() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SequenceCache::with_token_source(
            vec![seq("a")],
            10,
            dir.path(),
            &mut FixedTokens::new(["CACHE1"]),
        );

        let formatter = TouchFormatter::new();
        cache.build(&formatter).unwrap();

        assert_eq!(formatter.called.get(), 1);
        assert_eq!(cache.fasta_path(), dir.path().join("CACHE1.fasta"));
        assert_eq!(cache.db_path(), dir.path().join("CACHE1.dmnd"));
        assert!(cache.fasta_path().exists());
        assert!(cache.db_path().exists());
    }

    #[test]
    fn test_build_failure_surfaces_as_cache_build() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SequenceCache::new(vec![seq("a")], 10, dir.path());

        let err = cache.build(&FailingFormatter).unwrap_err();
        assert!(matches!(err, MicronotaError::CacheBuild(_)));
    }

    #[test]
    fn test_close_removes_artifacts_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SequenceCache::new(vec![seq("a")], 10, dir.path());
        cache.build(&TouchFormatter::new()).unwrap();

        cache.close().unwrap();
        assert!(!cache.fasta_path().exists());
        assert!(!cache.db_path().exists());

        // Second close: artifacts are gone, still not an error
        cache.close().unwrap();
    }

    #[test]
    fn test_close_before_build_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SequenceCache::new(Vec::new(), 10, dir.path());
        cache.close().unwrap();
    }

    #[test]
    fn test_token_collision_retried() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("BUSY.fasta"), b"").unwrap();

        let cache = SequenceCache::with_token_source(
            Vec::new(),
            10,
            dir.path(),
            &mut FixedTokens::new(["BUSY", "OPEN"]),
        );

        assert_eq!(cache.db_path(), dir.path().join("OPEN.dmnd"));
    }
}
