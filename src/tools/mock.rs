//! Mock search engine for testing the pipeline without external binaries.

use crate::bio::sequence::Sequence;
use crate::core::hits::HitRecord;
use crate::tools::traits::{Aligner, DatabaseFormatter};
use crate::{MicronotaError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Canned per-database hits plus an invocation log. Keys are database file
/// stems, so tests can register `"db1"` and search `"db1.dmnd"`.
#[derive(Default)]
pub struct MockAligner {
    hits: HashMap<String, Vec<HitRecord>>,
    failing: Option<String>,
    searches: RefCell<Vec<(PathBuf, Vec<String>)>>,
}

impl MockAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the records returned for a database stem. Only records whose
    /// query id is in the searched remainder are returned, mirroring a real
    /// search over the query file.
    pub fn with_hits(mut self, db_stem: &str, records: Vec<HitRecord>) -> Self {
        self.hits.insert(db_stem.to_string(), records);
        self
    }

    /// Make searches against the given database stem fail.
    pub fn failing_on(mut self, db_stem: &str) -> Self {
        self.failing = Some(db_stem.to_string());
        self
    }

    /// Databases searched so far, in order.
    pub fn searched_databases(&self) -> Vec<PathBuf> {
        self.searches
            .borrow()
            .iter()
            .map(|(db, _)| db.clone())
            .collect()
    }

    /// Query ids passed to each search, in order.
    pub fn searched_queries(&self) -> Vec<Vec<String>> {
        self.searches
            .borrow()
            .iter()
            .map(|(_, ids)| ids.clone())
            .collect()
    }

    fn stem(db: &Path) -> String {
        db.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string()
    }
}

impl Aligner for MockAligner {
    fn search(&self, queries: &[Sequence], db: &Path) -> Result<Vec<HitRecord>> {
        let stem = Self::stem(db);
        self.searches.borrow_mut().push((
            db.to_path_buf(),
            queries.iter().map(|s| s.id.clone()).collect(),
        ));

        if self.failing.as_deref() == Some(stem.as_str()) {
            return Err(MicronotaError::Search(format!(
                "mock search failed against {:?}",
                db
            )));
        }

        let searched: Vec<&str> = queries.iter().map(|s| s.id.as_str()).collect();
        Ok(self
            .hits
            .get(&stem)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| searched.contains(&r.query_id.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

impl DatabaseFormatter for MockAligner {
    fn format_db(&self, _fasta: &Path, db: &Path) -> Result<()> {
        fs::write(db, b"").map_err(MicronotaError::Io)?;
        Ok(())
    }
}
