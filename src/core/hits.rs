//! Alignment hit records, best-hit selection, and the accumulated result table.

use crate::{MicronotaError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One row of aligner output in BLAST tabular layout.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub query_id: String,
    pub target_id: String,
    pub identity: f64,
    pub alignment_length: usize,
    pub mismatches: usize,
    pub gap_opens: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub evalue: f64,
    pub bit_score: f64,
    /// Aligned sequence text, present only for SAM-formatted output.
    pub aligned: Option<String>,
}

impl HitRecord {
    pub fn new(query_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            query_id: query_id.into(),
            target_id: target_id.into(),
            identity: 0.0,
            alignment_length: 0,
            mismatches: 0,
            gap_opens: 0,
            query_start: 0,
            query_end: 0,
            target_start: 0,
            target_end: 0,
            evalue: 1.0,
            bit_score: 0.0,
            aligned: None,
        }
    }

    pub fn with_bit_score(mut self, bit_score: f64) -> Self {
        self.bit_score = bit_score;
        self
    }

    pub fn with_evalue(mut self, evalue: f64) -> Self {
        self.evalue = evalue;
        self
    }

    pub fn with_identity(mut self, identity: f64) -> Self {
        self.identity = identity;
        self
    }
}

/// Column used to rank hits for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreColumn {
    BitScore,
    Identity,
    Evalue,
}

impl ScoreColumn {
    /// True iff `candidate` is strictly better than `incumbent` under this
    /// column. Ties never replace, so the first-encountered record wins.
    fn prefers(&self, candidate: &HitRecord, incumbent: &HitRecord) -> bool {
        match self {
            ScoreColumn::BitScore => candidate.bit_score > incumbent.bit_score,
            ScoreColumn::Identity => candidate.identity > incumbent.identity,
            ScoreColumn::Evalue => candidate.evalue < incumbent.evalue,
        }
    }
}

impl Default for ScoreColumn {
    fn default() -> Self {
        ScoreColumn::BitScore
    }
}

/// The winning record for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct BestHit {
    pub target_id: String,
    pub evalue: f64,
    pub bit_score: f64,
    pub aligned: Option<String>,
}

impl From<&HitRecord> for BestHit {
    fn from(rec: &HitRecord) -> Self {
        Self {
            target_id: rec.target_id.clone(),
            evalue: rec.evalue,
            bit_score: rec.bit_score,
            aligned: rec.aligned.clone(),
        }
    }
}

/// Pick the best record per distinct query id.
///
/// An empty record set is an error: callers deciding that "zero hits" means
/// "no matches" must check before calling.
pub fn select_best_hits(
    records: &[HitRecord],
    column: ScoreColumn,
) -> Result<IndexMap<String, BestHit>> {
    if records.is_empty() {
        return Err(MicronotaError::EmptyInput);
    }

    let mut best: IndexMap<String, &HitRecord> = IndexMap::new();
    for rec in records {
        match best.get(&rec.query_id) {
            Some(incumbent) if !column.prefers(rec, incumbent) => {}
            _ => {
                best.insert(rec.query_id.clone(), rec);
            }
        }
    }

    Ok(best
        .into_iter()
        .map(|(query_id, rec)| (query_id, BestHit::from(rec)))
        .collect())
}

/// Accumulated best hits across database passes, keyed by query id.
///
/// Append-only: one pipeline run owns and exclusively mutates one table.
/// `merge` never replaces an existing entry, so the first database in the
/// search order wins for a given query.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    rows: IndexMap<String, BestHit>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one pass's best hits, keeping earlier entries untouched.
    pub fn merge(&mut self, hits: IndexMap<String, BestHit>) {
        for (query_id, hit) in hits {
            self.rows.entry(query_id).or_insert(hit);
        }
    }

    pub fn contains(&self, query_id: &str) -> bool {
        self.rows.contains_key(query_id)
    }

    pub fn get(&self, query_id: &str) -> Option<&BestHit> {
        self.rows.get(query_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BestHit)> {
        self.rows.iter()
    }

    /// Render as tab-separated rows: query, target, evalue, bitscore.
    pub fn write_tsv<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (query_id, hit) in &self.rows {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                query_id, hit.target_id, hit.evalue, hit.bit_score
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(query: &str, target: &str, bit_score: f64) -> HitRecord {
        HitRecord::new(query, target).with_bit_score(bit_score)
    }

    #[test]
    fn test_select_picks_max_per_query() {
        let records = vec![
            rec("q1", "t1", 50.0),
            rec("q1", "t2", 80.0),
            rec("q2", "t3", 30.0),
            rec("q1", "t4", 60.0),
        ];

        let best = select_best_hits(&records, ScoreColumn::BitScore).unwrap();
        assert_eq!(best.len(), 2);
        assert_eq!(best["q1"].target_id, "t2");
        assert_eq!(best["q1"].bit_score, 80.0);
        assert_eq!(best["q2"].target_id, "t3");
    }

    #[test]
    fn test_select_tie_keeps_first_encountered() {
        let records = vec![
            rec("q1", "first", 75.0),
            rec("q1", "second", 75.0),
            rec("q1", "third", 75.0),
        ];

        let best = select_best_hits(&records, ScoreColumn::BitScore).unwrap();
        assert_eq!(best["q1"].target_id, "first");

        // Same input order, same winner
        let again = select_best_hits(&records, ScoreColumn::BitScore).unwrap();
        assert_eq!(again["q1"].target_id, "first");
    }

    #[test]
    fn test_select_empty_input_fails() {
        let err = select_best_hits(&[], ScoreColumn::BitScore).unwrap_err();
        assert!(matches!(err, MicronotaError::EmptyInput));
    }

    #[test]
    fn test_select_by_evalue_prefers_lower() {
        let records = vec![
            HitRecord::new("q1", "worse").with_evalue(1e-3),
            HitRecord::new("q1", "better").with_evalue(1e-9),
        ];

        let best = select_best_hits(&records, ScoreColumn::Evalue).unwrap();
        assert_eq!(best["q1"].target_id, "better");
    }

    #[test]
    fn test_select_by_identity() {
        let records = vec![
            HitRecord::new("q1", "lo").with_identity(45.0),
            HitRecord::new("q1", "hi").with_identity(99.2),
        ];

        let best = select_best_hits(&records, ScoreColumn::Identity).unwrap();
        assert_eq!(best["q1"].target_id, "hi");
    }

    #[test]
    fn test_merge_does_not_overwrite() {
        let mut table = ResultTable::new();

        let first = select_best_hits(&[rec("q1", "from_db1", 40.0)], ScoreColumn::BitScore).unwrap();
        table.merge(first);

        // Later pass with a higher score still loses: first database wins
        let second =
            select_best_hits(&[rec("q1", "from_db2", 90.0)], ScoreColumn::BitScore).unwrap();
        table.merge(second);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get("q1").unwrap().target_id, "from_db1");
    }

    #[test]
    fn test_write_tsv() {
        let mut table = ResultTable::new();
        table.merge(
            select_best_hits(
                &[rec("q1", "t1", 55.5).with_evalue(1e-5)],
                ScoreColumn::BitScore,
            )
            .unwrap(),
        );

        let mut out = Vec::new();
        table.write_tsv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "q1\tt1\t0.00001\t55.5\n");
    }
}
