/*!
This module provides access to the QualityConsensus, which reduces an alignment of quality-bearing reads into a single consensus read.
Every column is a quality-weighted vote: the symbol(s) with the largest total quality win, ties resolve to an ambiguity code, and dissenting quality is subtracted from the result.

# Example usage
```rust
use barcode_validator::consensus::QualityConsensus;
use barcode_validator::quality_sequence::QualitySequence;

let sequences = [
    QualitySequence::new("trace1", b"ACGT".to_vec(), Some(vec![40, 40, 40, 40])).unwrap(),
    QualitySequence::new("trace2", b"ACCT".to_vec(), Some(vec![40, 40, 10, 40])).unwrap(),
    QualitySequence::new("trace3", b"ACTT".to_vec(), Some(vec![40, 40, 40, 40])).unwrap()
];

// add all the sequences
let mut consensus_builder = QualityConsensus::default();
for s in sequences.iter() {
    consensus_builder.add_sequence(s).unwrap();
}

// G and T tie at column 2, so the consensus uses K
let consensus = consensus_builder.consensus().unwrap();
assert_eq!(consensus.sequence(), b"ACKT");
assert_eq!(consensus.qualities().unwrap(), &[120, 120, 70, 120]);
```
*/

use itertools::Itertools;
use log::{debug, trace};

use crate::alphabet::{Alphabet, MAX_SYMBOLS};
use crate::errors::{BarcodeError, Result};
use crate::quality_sequence::{Alignment, QualitySequence};

/// The consensus outcome for a single column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsensusColumn {
    /// The chosen symbol, possibly an ambiguity code
    symbol: u8,
    /// Winning quality minus dissenting quality, can be negative
    quality: i64
}

impl ConsensusColumn {
    /// Constructor
    pub fn new(symbol: u8, quality: i64) -> ConsensusColumn {
        ConsensusColumn {
            symbol,
            quality
        }
    }

    // Getters
    pub fn symbol(&self) -> u8 {
        self.symbol
    }

    pub fn quality(&self) -> i64 {
        self.quality
    }
}

/// Core utility that will generate a quality-weighted consensus from aligned sequences.
/// All added sequences must have the same length, i.e. they are rows of one alignment.
#[derive(Debug, Default)]
pub struct QualityConsensus<'a> {
    /// Contains all the sequences that have been added to this consensus so far.
    sequences: Vec<&'a QualitySequence>,
    /// The alphabet used for voting and tie resolution
    alphabet: Alphabet,
    /// Name given to the output sequence
    name: Option<String>
}

impl<'a> QualityConsensus<'a> {
    /// Creates a new instance with a custom alphabet.
    /// # Arguments
    /// * `alphabet` - the symbols allowed in the rows, and the ambiguity codes used for ties
    pub fn with_alphabet(alphabet: Alphabet) -> QualityConsensus<'a> {
        QualityConsensus {
            sequences: vec![],
            alphabet,
            name: None
        }
    }

    /// Sets the name of the output sequence; the default is "consensus"
    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    /// Adds a new aligned sequence.
    /// # Arguments
    /// * `sequence` - the new row, quality is only checked when the consensus is built
    /// # Errors
    /// * if the sequence length differs from the rows already added
    pub fn add_sequence(&mut self, sequence: &'a QualitySequence) -> Result<()> {
        if let Some(first) = self.sequences.first() {
            if first.len() != sequence.len() {
                return Err(BarcodeError::InvalidInput(format!(
                    "row \"{}\" has {} columns, expected {}", sequence.name(), sequence.len(), first.len()
                )));
            }
        }
        self.sequences.push(sequence);
        Ok(())
    }

    /// Computes the consensus for a single column.
    /// # Arguments
    /// * `column` - the 0-based column index
    /// # Errors
    /// * if any row lacks quality, has a symbol outside the alphabet, or the column is out of bounds
    /// * if the tied symbols cannot be represented by the alphabet
    pub fn column(&self, column: usize) -> Result<ConsensusColumn> {
        let mut totals: [Option<i64>; MAX_SYMBOLS] = [None; MAX_SYMBOLS];
        for row in self.sequences.iter() {
            let qualities = row.qualities().ok_or_else(|| BarcodeError::MissingQuality {
                name: row.name().to_string()
            })?;
            let (&symbol, &quality) = row.sequence().get(column)
                .zip(qualities.get(column))
                .ok_or_else(|| BarcodeError::InvalidInput(format!(
                    "column {column} is out of bounds for row \"{}\"", row.name()
                )))?;
            let symbol_index = self.alphabet.index_of(symbol).ok_or_else(|| BarcodeError::InvalidInput(format!(
                "row \"{}\" has symbol '{}' at column {column}, which is not in the alphabet", row.name(), symbol as char
            )))?;
            *totals[symbol_index].get_or_insert(0) += quality as i64;
        }

        let max_total = match totals.iter().flatten().max() {
            Some(&m) => m,
            None => return Err(BarcodeError::InvalidInput("cannot build a consensus without sequences".to_string()))
        };
        let winners: Vec<usize> = totals.iter()
            .positions(|t| *t == Some(max_total))
            .collect();

        let winning: i64 = winners.len() as i64 * max_total;
        let dissenting: i64 = totals.iter().flatten().sum::<i64>() - winning;
        let resolved = self.alphabet.resolve(&winners)?;

        let result = ConsensusColumn::new(self.alphabet.symbol(resolved), winning - dissenting);
        trace!("column {column}: totals = {totals:?}, winners = {winners:?} => {result:?}");
        Ok(result)
    }

    /// The core function that gets called after adding all the sequences we care about.
    /// # Errors
    /// * `MissingQuality` if any row lacks quality, checked before any column is processed
    /// * if any column fails to resolve, see `column(...)`
    pub fn consensus(&self) -> Result<QualitySequence> {
        if self.sequences.is_empty() {
            return Err(BarcodeError::InvalidInput("cannot build a consensus without sequences".to_string()));
        }
        if let Some(row) = self.sequences.iter().find(|r| !r.has_quality()) {
            return Err(BarcodeError::MissingQuality { name: row.name().to_string() });
        }

        let num_columns = self.sequences[0].len();
        let columns: Vec<ConsensusColumn> = (0..num_columns)
            .map(|c| self.column(c))
            .collect::<Result<_>>()?;

        let sequence: Vec<u8> = columns.iter().map(|c| c.symbol()).collect();
        let qualities: Vec<i32> = columns.iter()
            .map(|c| i32::try_from(c.quality()).map_err(|_e| BarcodeError::InvalidInput(format!(
                "consensus quality {} does not fit in a Phred score", c.quality()
            ))))
            .collect::<Result<_>>()?;

        let name = self.name.as_deref().unwrap_or("consensus");
        debug!("Built consensus \"{name}\" from {} sequences over {num_columns} columns", self.sequences.len());
        QualitySequence::new(name, sequence, Some(qualities))
    }

    // Getters
    pub fn sequences(&self) -> &[&'a QualitySequence] {
        &self.sequences
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }
}

/// Builds the consensus of an alignment with the nucleotide alphabet.
/// The output is named "<alignment name> consensus", or just "consensus" for unnamed alignments.
/// # Errors
/// * `MissingQuality` if any row lacks quality
/// * `NoAmbiguitySymbol` if a tie cannot be represented
/// * `InvalidInput` for symbols outside the alphabet
pub fn build_consensus(alignment: &Alignment) -> Result<QualitySequence> {
    build_consensus_with_alphabet(alignment, Alphabet::nucleotide())
}

/// Same as `build_consensus(...)`, but with a custom alphabet.
pub fn build_consensus_with_alphabet(alignment: &Alignment, alphabet: Alphabet) -> Result<QualitySequence> {
    let mut consensus_builder = QualityConsensus::with_alphabet(alphabet);
    if let Some(name) = alignment.name() {
        consensus_builder.set_name(&format!("{name} consensus"));
    }
    for row in alignment.rows().iter() {
        consensus_builder.add_sequence(row)?;
    }
    consensus_builder.consensus()
}
