/*!
Quality-driven end trimming.
Each base scores `limit - 10^(-q/10)`, so bases more reliable than the limit score positive.
The start pass keeps the best-scoring suffix and the end pass then keeps the best-scoring prefix of what remains.

# Example usage
```rust
use barcode_validator::quality_sequence::QualitySequence;
use barcode_validator::trimmer::{trim, Trimmage, TrimPolicy};

let mut qualities = vec![10; 4];
qualities.extend(vec![60; 22]);
qualities.extend(vec![10; 4]);
let trace = QualitySequence::new("trace", vec![b'A'; 30], Some(qualities)).unwrap();

let trimmage = trim(&trace, TrimPolicy::Both, 0.05).unwrap();
assert_eq!(trimmage, Trimmage::new(4, 4));
assert_eq!(trimmage.apply(&trace).unwrap().len(), 22);
```
*/

use log::{debug, trace};

use crate::config::TrimConfig;
use crate::errors::{BarcodeError, Result};
use crate::quality_sequence::QualitySequence;

/// Fixed-point units of a score equal to the error probability limit
const LIMIT_UNITS: f64 = (1u64 << 40) as f64;
/// Lower bound for per-base scores, outweighs any run of up to 2^40 positive scores
const SCORE_FLOOR: f64 = -((1u128 << 80) as f64);

/// Selects which ends a trim call may shorten
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrimPolicy {
    /// Only the leading end
    Start,
    /// Only the trailing end
    End,
    /// Leading end first, then the trailing end of the remainder
    #[default]
    Both,
    /// No trimming
    Neither
}

impl TrimPolicy {
    fn trims_start(&self) -> bool {
        matches!(self, TrimPolicy::Start | TrimPolicy::Both)
    }

    fn trims_end(&self) -> bool {
        matches!(self, TrimPolicy::End | TrimPolicy::Both)
    }
}

/// Number of bases to discard from each end of a read.
/// If the whole read is discarded, all of it is attributed to the leading end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Trimmage {
    leading: usize,
    trailing: usize
}

impl Trimmage {
    /// Constructor
    pub fn new(leading: usize, trailing: usize) -> Trimmage {
        Trimmage {
            leading,
            trailing
        }
    }

    /// Returns the retained part of the sequence, `[leading, len - trailing)`.
    /// # Errors
    /// * if the trimmage does not fit the sequence
    pub fn apply(&self, sequence: &QualitySequence) -> Result<QualitySequence> {
        let end = sequence.len().checked_sub(self.trailing)
            .filter(|&e| e >= self.leading)
            .ok_or_else(|| BarcodeError::InvalidInput(format!(
                "trimmage {}+{} exceeds the length {} of \"{}\"", self.leading, self.trailing, sequence.len(), sequence.name()
            )))?;
        sequence.slice(self.leading, end)
    }

    // Getters
    pub fn leading(&self) -> usize {
        self.leading
    }

    pub fn trailing(&self) -> usize {
        self.trailing
    }

    pub fn total(&self) -> usize {
        self.leading + self.trailing
    }
}

/// Computes how many bases to trim from each end of a quality sequence.
/// # Arguments
/// * `sequence` - the read to trim, must carry quality
/// * `policy` - which ends may get shortened
/// * `error_probability_limit` - the per-base error probability that retained bases should beat, in (0, 1)
/// # Errors
/// * if the limit is outside (0, 1) or the sequence has no quality
pub fn trim(sequence: &QualitySequence, policy: TrimPolicy, error_probability_limit: f64) -> Result<Trimmage> {
    if !(error_probability_limit > 0.0 && error_probability_limit < 1.0) {
        return Err(BarcodeError::InvalidInput(format!(
            "error probability limit must be in (0, 1), found {error_probability_limit}"
        )));
    }
    let qualities = sequence.qualities().ok_or_else(|| BarcodeError::InvalidInput(format!(
        "cannot trim \"{}\" without quality values", sequence.name()
    )))?;

    // fixed-point scores relative to the limit so that equal sums compare exactly regardless of summation order
    let scores: Vec<i128> = qualities.iter()
        .map(|&q| {
            let error_probability = 10.0_f64.powf(-(q as f64) / 10.0).min(1.0);
            ((1.0 - error_probability / error_probability_limit) * LIMIT_UNITS).max(SCORE_FLOOR).round() as i128
        })
        .collect();

    let leading = if policy.trims_start() {
        best_suffix_start(&scores)
    } else {
        0
    };
    let end = if policy.trims_end() {
        leading + best_prefix_end(&scores[leading..])
    } else {
        scores.len()
    };

    // an empty result is attributed entirely to the leading end
    let trimmage = if end == leading {
        Trimmage::new(scores.len(), 0)
    } else {
        Trimmage::new(leading, scores.len() - end)
    };
    debug!("Trimmed \"{}\" (len {}) with {policy:?}: {trimmage:?}", sequence.name(), sequence.len());
    Ok(trimmage)
}

/// Wrapper for `trim(...)` that pulls the parameters from a config
pub fn trim_with_config(sequence: &QualitySequence, config: &TrimConfig) -> Result<Trimmage> {
    trim(sequence, config.policy, config.error_probability_limit)
}

/// Returns the start index of the suffix with the largest score sum.
/// Ties go to the smallest index, and the empty suffix only wins if every other suffix sums below zero.
fn best_suffix_start(scores: &[i128]) -> usize {
    let mut running = 0;
    let mut best: Option<(usize, i128)> = None;
    for (i, &s) in scores.iter().enumerate().rev() {
        running += s;
        // >= so that an equal sum further left wins
        if best.map_or(true, |(_bi, bs)| running >= bs) {
            best = Some((i, running));
        }
    }
    trace!("best_suffix_start: {best:?}");
    match best {
        Some((i, sum)) if sum >= 0 => i,
        _ => scores.len()
    }
}

/// Returns the exclusive end of the prefix with the largest score sum.
/// Ties go to the longest prefix, and the empty prefix only wins if every other prefix sums below zero.
fn best_prefix_end(scores: &[i128]) -> usize {
    let mut running = 0;
    let mut best: Option<(usize, i128)> = None;
    for (i, &s) in scores.iter().enumerate() {
        running += s;
        if best.map_or(true, |(_bi, bs)| running >= bs) {
            best = Some((i + 1, running));
        }
    }
    trace!("best_prefix_end: {best:?}");
    match best {
        Some((end, sum)) if sum >= 0 => end,
        _ => 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::example_gen::generate_traces;

    fn quality_run(runs: &[(i32, usize)]) -> QualitySequence {
        let qualities: Vec<i32> = runs.iter()
            .flat_map(|&(q, count)| std::iter::repeat(q).take(count))
            .collect();
        QualitySequence::new("test", vec![b'A'; qualities.len()], Some(qualities)).unwrap()
    }

    #[test]
    fn test_trim_both_ends() {
        let sequence = quality_run(&[(10, 4), (60, 22), (10, 4)]);
        assert_eq!(trim(&sequence, TrimPolicy::Both, 0.05).unwrap(), Trimmage::new(4, 4));
        assert_eq!(trim(&sequence, TrimPolicy::Start, 0.05).unwrap(), Trimmage::new(4, 0));
        assert_eq!(trim(&sequence, TrimPolicy::End, 0.05).unwrap(), Trimmage::new(0, 4));
        assert_eq!(trim(&sequence, TrimPolicy::Neither, 0.05).unwrap(), Trimmage::new(0, 0));
    }

    #[test]
    fn test_trim_one_sided_runs() {
        let sequence = quality_run(&[(10, 10), (60, 20)]);
        assert_eq!(trim(&sequence, TrimPolicy::Both, 0.05).unwrap(), Trimmage::new(10, 0));

        let reversed = quality_run(&[(60, 20), (10, 10)]);
        assert_eq!(trim(&reversed, TrimPolicy::Both, 0.05).unwrap(), Trimmage::new(0, 10));
    }

    #[test]
    fn test_trim_uniform_runs() {
        // error probability of q20 is 0.01, below the limit everywhere
        let good = quality_run(&[(20, 30)]);
        assert_eq!(trim(&good, TrimPolicy::Both, 0.05).unwrap(), Trimmage::new(0, 0));

        // q10 is 0.1 everywhere, so it all goes and the start takes the blame
        let bad = quality_run(&[(10, 30)]);
        let trimmage = trim(&bad, TrimPolicy::Both, 0.05).unwrap();
        assert_eq!(trimmage, Trimmage::new(30, 0));
        assert!(trimmage.apply(&bad).unwrap().is_empty());

        // the end pass alone also finds nothing worth keeping, still attributed to the start
        assert_eq!(trim(&bad, TrimPolicy::End, 0.05).unwrap(), Trimmage::new(30, 0));
        assert_eq!(trim(&bad, TrimPolicy::Start, 0.05).unwrap(), Trimmage::new(30, 0));
    }

    #[test]
    fn test_tiny_limits() {
        // q125 is ~3.2e-13, still worse than the limit
        let sequence = quality_run(&[(125, 10)]);
        assert_eq!(trim(&sequence, TrimPolicy::Both, 1e-13).unwrap(), Trimmage::new(10, 0));
        assert_eq!(trim(&sequence, TrimPolicy::Both, 1e-12).unwrap(), Trimmage::new(0, 0));

        // q10 scores fall far below the floor here, but still count as bad bases
        let mixed = quality_run(&[(10, 3), (3100, 5), (10, 2)]);
        assert_eq!(trim(&mixed, TrimPolicy::Both, 1e-300).unwrap(), Trimmage::new(3, 2));
        assert_eq!(trim(&mixed, TrimPolicy::Both, 1e-311).unwrap(), Trimmage::new(10, 0));
    }

    #[test]
    fn test_long_reads() {
        let sequence = quality_run(&[(60, 10_000_000)]);
        assert_eq!(trim(&sequence, TrimPolicy::Both, 0.99).unwrap(), Trimmage::new(0, 0));

        let long_tail = quality_run(&[(60, 10_000_000), (2, 3)]);
        assert_eq!(trim(&long_tail, TrimPolicy::End, 0.5).unwrap(), Trimmage::new(0, 3));
    }

    #[test]
    fn test_sums_beyond_i64() {
        let big = i64::MAX as i128;
        assert_eq!(best_suffix_start(&[-1, big, big]), 1);
        assert_eq!(best_prefix_end(&[big, big, -1]), 2);
    }

    #[test]
    fn test_empty_sequence() {
        let empty = QualitySequence::new("empty", vec![], Some(vec![])).unwrap();
        assert_eq!(trim(&empty, TrimPolicy::Both, 0.05).unwrap(), Trimmage::new(0, 0));
    }

    #[test]
    fn test_invalid_inputs() {
        let sequence = quality_run(&[(20, 5)]);
        for limit in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(trim(&sequence, TrimPolicy::Both, limit), Err(BarcodeError::InvalidInput(_))));
        }

        let no_quality = QualitySequence::without_quality("nq", b"ACGT".to_vec());
        assert!(matches!(trim(&no_quality, TrimPolicy::Both, 0.05), Err(BarcodeError::InvalidInput(_))));
    }

    #[test]
    fn test_trim_with_config() {
        let sequence = quality_run(&[(10, 4), (60, 22), (10, 4)]);
        let config = TrimConfig { policy: TrimPolicy::Start, ..Default::default() };
        assert_eq!(trim_with_config(&sequence, &config).unwrap(), Trimmage::new(4, 0));
    }

    #[test_log::test]
    fn test_trim_bounds_and_idempotence() {
        let (_barcode, traces) = generate_traces(200, 20, 0.02, 0);
        for limit in [0.001, 0.01, 0.05, 0.2] {
            for t in traces.iter() {
                let trimmage = trim(t, TrimPolicy::Both, limit).unwrap();
                assert!(trimmage.total() <= t.len());

                // trimming again should not find anything else to remove
                let trimmed = trimmage.apply(t).unwrap();
                assert_eq!(trim(&trimmed, TrimPolicy::Both, limit).unwrap(), Trimmage::new(0, 0));
            }
        }
    }
}
