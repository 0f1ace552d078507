/*!
Plain data types shared by every stage: quality-bearing reads and the alignments built from them.
```
use barcode_validator::quality_sequence::QualitySequence;
let trace = QualitySequence::new("trace1_1", b"ACGT".to_vec(), Some(vec![20, 30, 40, 30])).unwrap();
assert_eq!(trace.len(), 4);
assert!(trace.has_quality());

let no_quality = QualitySequence::without_quality("barcode1", b"ACGT".to_vec());
assert!(no_quality.qualities().is_none());
```
*/

use crate::errors::{BarcodeError, Result};

/// An identified read with optional per-base Phred qualities.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QualitySequence {
    /// The identifier, e.g. a trace file name or barcode name
    name: String,
    /// The sequence symbols
    sequence: Vec<u8>,
    /// Per-base qualities; None is a quality-less read, which is distinct from all-zero quality
    qualities: Option<Vec<i32>>
}

impl QualitySequence {
    /// Constructor
    /// # Arguments
    /// * `name` - the sequence identifier
    /// * `sequence` - the symbols
    /// * `qualities` - optional per-base Phred qualities
    /// # Errors
    /// * if qualities are provided and their length does not match the sequence
    pub fn new(name: &str, sequence: Vec<u8>, qualities: Option<Vec<i32>>) -> Result<QualitySequence> {
        if let Some(q) = qualities.as_ref() {
            if q.len() != sequence.len() {
                return Err(BarcodeError::InvalidInput(format!(
                    "sequence \"{name}\" has {} symbols but {} quality values", sequence.len(), q.len()
                )));
            }
        }
        Ok(QualitySequence {
            name: name.to_string(),
            sequence,
            qualities
        })
    }

    /// Constructor for reads that never had quality, such as reference barcodes
    pub fn without_quality(name: &str, sequence: Vec<u8>) -> QualitySequence {
        QualitySequence {
            name: name.to_string(),
            sequence,
            qualities: None
        }
    }

    /// Returns a copy of the sub-sequence `[start, end)`, carrying quality if present.
    /// # Errors
    /// * if the range is out of bounds
    pub fn slice(&self, start: usize, end: usize) -> Result<QualitySequence> {
        if start > end || end > self.len() {
            return Err(BarcodeError::InvalidInput(format!(
                "range {start}..{end} is invalid for \"{}\" of length {}", self.name, self.len()
            )));
        }
        Ok(QualitySequence {
            name: self.name.clone(),
            sequence: self.sequence[start..end].to_vec(),
            qualities: self.qualities.as_ref().map(|q| q[start..end].to_vec())
        })
    }

    /// Returns the sequence with every gap symbol removed, along with its qualities
    pub fn ungapped(&self, gap: u8) -> QualitySequence {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.sequence[i] != gap)
            .collect();
        QualitySequence {
            name: self.name.clone(),
            sequence: keep.iter().map(|&i| self.sequence[i]).collect(),
            qualities: self.qualities.as_ref().map(|q| keep.iter().map(|&i| q[i]).collect())
        }
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn qualities(&self) -> Option<&[i32]> {
        self.qualities.as_deref()
    }

    pub fn has_quality(&self) -> bool {
        self.qualities.is_some()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// A set of aligned reads that all share one column count.
/// Shorter reads are expected to be padded with the gap symbol by whatever built the alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// Optional name, usually the barcode the alignment was assembled for
    name: Option<String>,
    /// The aligned rows
    rows: Vec<QualitySequence>
}

impl Alignment {
    /// Constructor
    /// # Arguments
    /// * `name` - optional alignment name
    /// * `rows` - the aligned sequences
    /// # Errors
    /// * if there are no rows or the rows differ in length
    pub fn new(name: Option<&str>, rows: Vec<QualitySequence>) -> Result<Alignment> {
        let num_columns = match rows.first() {
            Some(r) => r.len(),
            None => return Err(BarcodeError::InvalidInput("alignment has no rows".to_string()))
        };
        if let Some(bad_row) = rows.iter().find(|r| r.len() != num_columns) {
            return Err(BarcodeError::InvalidInput(format!(
                "row \"{}\" has {} columns, expected {num_columns}", bad_row.name(), bad_row.len()
            )));
        }
        Ok(Alignment {
            name: name.map(|n| n.to_string()),
            rows
        })
    }

    // Getters
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn rows(&self) -> &[QualitySequence] {
        &self.rows
    }

    pub fn num_columns(&self) -> usize {
        // rows are guaranteed non-empty at construction
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_length_mismatch() {
        let result = QualitySequence::new("bad", b"ACGT".to_vec(), Some(vec![10, 10]));
        assert!(matches!(result, Err(BarcodeError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_vs_zero_quality() {
        let missing = QualitySequence::without_quality("a", b"AC".to_vec());
        let zero = QualitySequence::new("a", b"AC".to_vec(), Some(vec![0, 0])).unwrap();
        assert_ne!(missing, zero);
        assert!(!missing.has_quality());
        assert_eq!(zero.qualities(), Some(&[0, 0][..]));
    }

    #[test]
    fn test_slice_and_ungapped() {
        let seq = QualitySequence::new("s", b"AC-GT".to_vec(), Some(vec![1, 2, 3, 4, 5])).unwrap();
        let sliced = seq.slice(1, 4).unwrap();
        assert_eq!(sliced.sequence(), b"C-G");
        assert_eq!(sliced.qualities(), Some(&[2, 3, 4][..]));
        assert!(seq.slice(3, 6).is_err());

        let ungapped = seq.ungapped(b'-');
        assert_eq!(ungapped.sequence(), b"ACGT");
        assert_eq!(ungapped.qualities(), Some(&[1, 2, 4, 5][..]));
    }

    #[test]
    fn test_alignment_validation() {
        let r1 = QualitySequence::new("r1", b"ACGT".to_vec(), Some(vec![10; 4])).unwrap();
        let r2 = QualitySequence::new("r2", b"ACG".to_vec(), Some(vec![10; 3])).unwrap();
        assert!(Alignment::new(None, vec![]).is_err());
        assert!(Alignment::new(None, vec![r1.clone(), r2]).is_err());

        let alignment = Alignment::new(Some("barcode1"), vec![r1.clone(), r1]).unwrap();
        assert_eq!(alignment.num_columns(), 4);
        assert_eq!(alignment.name(), Some("barcode1"));
    }
}
