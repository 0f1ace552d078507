use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};

use crate::quality_sequence::QualitySequence;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Creates a barcode and a set of simulated traces we can verify against.
/// Traces only carry substitutions, so they are already aligned to the barcode column-for-column.
/// Each trace has a low quality run at both ends, and every substituted base gets a low quality.
/// # Arguments
/// * `seq_len` - the length of the barcode and of each trace
/// * `num_traces` - the number of traces to generate from the barcode
/// * `error_rate` - the substitution rate in the high quality body of each trace
/// * `seed` - seed for the random generator, so outputs are reproducible
pub fn generate_traces(seq_len: usize, num_traces: usize, error_rate: f64, seed: u64) -> (QualitySequence, Vec<QualitySequence>) {
    assert!((0.0..=1.0).contains(&error_rate));

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let base_distribution = Uniform::new(0, BASES.len());
    let sub_distribution = Uniform::new(1, BASES.len());
    let error_distribution = Uniform::new(0.0, 1.0);
    let high_quality = Uniform::new_inclusive(30, 60);
    let low_quality = Uniform::new_inclusive(2, 12);
    let end_distribution = Uniform::new_inclusive(0, seq_len / 10);

    let barcode_indices: Vec<usize> = (0..seq_len)
        .map(|_i| rng.sample(base_distribution))
        .collect();
    let barcode = QualitySequence::without_quality(
        "barcode",
        barcode_indices.iter().map(|&b| BASES[b]).collect()
    );

    let traces: Vec<QualitySequence> = (0..num_traces)
        .map(|trace_index| {
            let head = rng.sample(end_distribution);
            let tail = seq_len - rng.sample(end_distribution);

            let mut sequence = Vec::with_capacity(seq_len);
            let mut qualities = Vec::with_capacity(seq_len);
            for (i, &b) in barcode_indices.iter().enumerate() {
                let in_body = i >= head && i < tail;
                let error_chance = if in_body { error_rate } else { 0.5 };
                if rng.sample(error_distribution) < error_chance {
                    // substitution
                    let alt = (b + rng.sample(sub_distribution)) % BASES.len();
                    sequence.push(BASES[alt]);
                    qualities.push(rng.sample(low_quality));
                } else {
                    sequence.push(BASES[b]);
                    qualities.push(if in_body { rng.sample(high_quality) } else { rng.sample(low_quality) });
                }
            }

            assert_eq!(sequence.len(), qualities.len());
            QualitySequence::new(&format!("trace{trace_index}"), sequence, Some(qualities))
                .expect("simulated trace lengths match")
        })
        .collect();

    (barcode, traces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_traces() {
        let (barcode, traces) = generate_traces(100, 5, 0.01, 0);
        assert_eq!(barcode.len(), 100);
        assert!(!barcode.has_quality());
        assert_eq!(traces.len(), 5);
        for (i, t) in traces.iter().enumerate() {
            assert_eq!(t.name(), format!("trace{i}"));
            assert_eq!(t.len(), 100);
            assert_eq!(t.qualities().unwrap().len(), 100);
        }

        // seeded, so repeat calls match
        let (barcode2, traces2) = generate_traces(100, 5, 0.01, 0);
        assert_eq!(barcode, barcode2);
        assert_eq!(traces, traces2);
    }
}
