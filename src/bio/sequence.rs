use serde::{Deserialize, Serialize};

/// A single biological sequence record. Immutable once read; ownership moves
/// with whichever collection currently holds it (query set, cache, remainder).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sequence {
    pub id: String,
    pub description: Option<String>,
    pub sequence: Vec<u8>,
}

impl Sequence {
    pub fn new(id: String, sequence: Vec<u8>) -> Self {
        Self {
            id,
            description: None,
            sequence,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// FASTA header line for this record (without trailing newline).
    pub fn header(&self) -> String {
        let mut header = format!(">{}", self.id);

        if let Some(desc) = &self.description {
            header.push(' ');
            header.push_str(desc);
        }

        header
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_construction() {
        let seq = Sequence::new("test_id".to_string(), b"MKTAYIAK".to_vec());
        assert_eq!(seq.id, "test_id");
        assert_eq!(seq.sequence, b"MKTAYIAK");
        assert!(seq.description.is_none());
        assert_eq!(seq.len(), 8);
        assert!(!seq.is_empty());
    }

    #[test]
    fn test_header_generation() {
        let seq = Sequence::new("seq1".to_string(), b"MKT".to_vec());
        assert_eq!(seq.header(), ">seq1");

        let seq = Sequence::new("seq2".to_string(), b"MKT".to_vec())
            .with_description("hypothetical protein".to_string());
        assert_eq!(seq.header(), ">seq2 hypothetical protein");
    }

    #[test]
    fn test_display() {
        let seq = Sequence::new("s".to_string(), b"MKTA".to_vec());
        assert_eq!(seq.to_string(), "MKTA");
    }
}
