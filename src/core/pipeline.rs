//! Sequential multi-database search with result accumulation.
//!
//! Databases are searched in priority order against a shrinking remainder of
//! unmatched queries, so passes cannot be parallelized: each one depends on
//! the remainder left by the previous. The cache database, when present and
//! non-empty, is always searched first.

use crate::bio::sequence::Sequence;
use crate::core::cache::SequenceCache;
use crate::core::hits::{select_best_hits, ResultTable, ScoreColumn};
use crate::tools::traits::{Aligner, SearchEngine};
use crate::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct AnnotationPipeline {
    score_column: ScoreColumn,
}

impl Default for AnnotationPipeline {
    fn default() -> Self {
        Self::new(ScoreColumn::default())
    }
}

impl AnnotationPipeline {
    pub fn new(score_column: ScoreColumn) -> Self {
        Self { score_column }
    }

    /// Annotate `queries` against `databases` in order, accumulating one best
    /// hit per query. The first database in the effective order wins for a
    /// given query; later passes only ever see the still-unmatched remainder.
    ///
    /// A failed search aborts the whole run: skipping one database would
    /// yield a result table that looks complete but is not.
    pub fn annotate(
        &self,
        queries: &[Sequence],
        databases: &[PathBuf],
        mut cache: Option<&mut SequenceCache>,
        engine: &impl SearchEngine,
    ) -> Result<ResultTable> {
        let mut order: Vec<PathBuf> = Vec::with_capacity(databases.len() + 1);

        if let Some(cache) = cache.as_deref() {
            if cache.is_empty() {
                debug!("Cache is empty, skipping cache pass");
            } else {
                cache.build(engine)?;
                order.push(cache.db_path().to_path_buf());
            }
        }
        order.extend(databases.iter().cloned());

        let mut table = ResultTable::new();
        let mut remaining: Vec<Sequence> = queries.to_vec();

        for db in &order {
            if remaining.is_empty() {
                debug!("All queries matched, skipping remaining databases");
                break;
            }

            info!(
                "Searching {} queries against {:?} with {}",
                remaining.len(),
                db,
                engine.name()
            );
            let records = engine.search(&remaining, db)?;

            if records.is_empty() {
                // No matches in this database; the remainder carries over
                debug!("No hits against {:?}", db);
                continue;
            }

            let best = select_best_hits(&records, self.score_column)?;
            table.merge(best);
            remaining.retain(|seq| !table.contains(&seq.id));

            info!(
                "{} queries annotated so far, {} remaining",
                table.len(),
                remaining.len()
            );
        }

        if let Some(cache) = cache.as_deref_mut() {
            // What gets cached is the set unmatched by every database this
            // run; it seeds the cheapest search pass of future runs.
            cache.update(remaining);
            cache.close()?;
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hits::HitRecord;
    use crate::tools::mock::MockAligner;
    use pretty_assertions::assert_eq;

    fn seq(id: &str) -> Sequence {
        Sequence::new(id.to_string(), b"MKTAYIAK".to_vec())
    }

    fn hit(query: &str, target: &str, bit_score: f64) -> HitRecord {
        HitRecord::new(query, target).with_bit_score(bit_score)
    }

    #[test]
    fn test_empty_inputs_return_empty_table() {
        let engine = MockAligner::new();
        let table = AnnotationPipeline::default()
            .annotate(&[seq("a")], &[], None, &engine)
            .unwrap();

        assert!(table.is_empty());
        assert!(engine.searched_databases().is_empty());
    }

    #[test]
    fn test_search_error_propagates() {
        let engine = MockAligner::new().failing_on("bad_db");
        let err = AnnotationPipeline::default()
            .annotate(&[seq("a")], &[PathBuf::from("bad_db.dmnd")], None, &engine)
            .unwrap_err();

        assert!(matches!(err, crate::MicronotaError::Search(_)));
    }

    #[test]
    fn test_zero_hit_database_is_pass_through() {
        let engine = MockAligner::new()
            .with_hits("empty_db", Vec::new())
            .with_hits("real_db", vec![hit("a", "t1", 50.0)]);

        let table = AnnotationPipeline::default()
            .annotate(
                &[seq("a")],
                &[PathBuf::from("empty_db.dmnd"), PathBuf::from("real_db.dmnd")],
                None,
                &engine,
            )
            .unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("a").unwrap().target_id, "t1");
        assert_eq!(engine.searched_databases().len(), 2);
    }
}
