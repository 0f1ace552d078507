/*!
# barcode_validator
This library provides the quantitative core of a barcode validation pipeline for Sanger-style sequencing traces.

Key components:
* Quality-driven end trimming that removes unreliable bases from read ends
* Quality-weighted consensus voting with deterministic ambiguity-code resolution for ties
* Pluggable strategies for associating traces with their barcode (file name pattern, list file, metadata)
* A static registry of trace-level and barcode-level validation checks

Assembling trimmed traces into an alignment is left to an external assembler; this crate consumes the resulting `Alignment`.

# Example usage
```rust
use barcode_validator::consensus::build_consensus;
use barcode_validator::quality_sequence::{Alignment, QualitySequence};
use barcode_validator::trimmer::{trim, TrimPolicy};

let traces = vec![
    QualitySequence::new("trace1", b"TACGTA".to_vec(), Some(vec![5, 40, 40, 40, 40, 5])).unwrap(),
    QualitySequence::new("trace2", b"GACGTC".to_vec(), Some(vec![5, 40, 40, 40, 40, 5])).unwrap()
];

// trim the low quality ends
let trimmed: Vec<QualitySequence> = traces.iter()
    .map(|t| trim(t, TrimPolicy::Both, 0.05).unwrap().apply(t).unwrap())
    .collect();
assert_eq!(trimmed[0].sequence(), b"ACGT");

// run consensus and check the results
let alignment = Alignment::new(Some("barcode1"), trimmed).unwrap();
let consensus = build_consensus(&alignment).unwrap();
assert_eq!(consensus.sequence(), b"ACGT");
assert_eq!(consensus.qualities().unwrap(), &[80, 80, 80, 80]);
```
*/

/// Extended nucleotide alphabet with ambiguity codes
pub mod alphabet;
/// Configuration for trimming, validation, and the pipeline
pub mod config;
/// Main functionality for the quality-weighted consensus
pub mod consensus;
/// Error types
pub mod errors;
/// Utility for generating simulated traces
pub mod example_gen;
/// Strategies for associating traces with barcodes
pub mod mapping;
/// Batch driver over all of the components
pub mod pipeline;
/// Quality sequence and alignment data types
pub mod quality_sequence;
/// Basic pair-wise alignment utilities
pub mod sequence_alignment;
/// Quality-driven end trimming
pub mod trimmer;
/// Validation checks and their registry
pub mod validation;
