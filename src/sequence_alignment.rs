use std::cmp::{max, min};

use crate::alphabet::{Alphabet, GAP};

/// Returns the full edit distance between two sequences using exact symbol equality.
/// # Arguments
/// * `v1` - the first sequence
/// * `v2` - the second sequence
/// # Examples
/// ```rust
/// use barcode_validator::sequence_alignment::wfa_ed;
/// assert_eq!(wfa_ed(b"ACGTT", b"ACGTT"), 0);
/// assert_eq!(wfa_ed(b"ACGTT", b"ACCTT"), 1);
/// assert_eq!(wfa_ed(b"ACGTT", b"CGAT"), 2);
/// ```
pub fn wfa_ed(v1: &[u8], v2: &[u8]) -> usize {
    wfa_ed_config(v1, v2, true, |a, b| a == b)
}

/// Returns the edit distance between a consensus and its barcode.
/// Gaps are removed from the consensus first, and ambiguity codes match any base they may represent.
/// # Arguments
/// * `consensus` - the consensus symbols, possibly gapped
/// * `barcode` - the reference barcode symbols
/// * `alphabet` - decides which symbols are compatible
/// # Examples
/// ```rust
/// use barcode_validator::alphabet::Alphabet;
/// use barcode_validator::sequence_alignment::barcode_edit_distance;
/// let alphabet = Alphabet::nucleotide();
/// assert_eq!(barcode_edit_distance(b"AC-GRT", b"ACGAT", &alphabet), 0);
/// assert_eq!(barcode_edit_distance(b"ACGYT", b"ACGAT", &alphabet), 1);
/// ```
pub fn barcode_edit_distance(consensus: &[u8], barcode: &[u8], alphabet: &Alphabet) -> usize {
    let ungapped: Vec<u8> = consensus.iter()
        .copied()
        .filter(|&s| s != GAP)
        .collect();
    wfa_ed_config(&ungapped, barcode, true, |a, b| alphabet.compatible(a, b))
}

/// Returns the edit distance between two sequences by using a version of WFA.
/// If `require_both_end` is true, it requires the full end-to-end edit distance. If false, then it only requires that `v2` is at the end.
/// # Arguments
/// * `v1` - the first sequence
/// * `v2` - the second sequence
/// * `require_both_end` - if true, it requires the full end-to-end edit distance; if false, then it only requires that `v2` is at the end
/// * `matches` - returns true when two symbols should be treated as equal
/// # Examples
/// ```rust
/// use barcode_validator::sequence_alignment::wfa_ed_config;
/// let v1 = b"ACGTA";
/// let v2 = b"ACGT";
/// assert_eq!(wfa_ed_config(v1, v2, false, |a, b| a == b), 0);
/// assert_eq!(wfa_ed_config(v1, v2, true, |a, b| a == b), 1);
/// ```
pub fn wfa_ed_config<F>(v1: &[u8], v2: &[u8], require_both_end: bool, matches: F) -> usize
where
    F: Fn(u8, u8) -> bool
{
    let l1 = v1.len();
    let l2 = v2.len();

    // furthest reaching (i, j) on each diagonal of the current edit distance
    let mut curr_wf: Vec<(usize, usize)> = vec![(0, 0)];
    let mut edits = 0;

    loop {
        let mut next_wf: Vec<(usize, usize)> = vec![(0, 0); curr_wf.len() + 2];
        for (wf_index, &(start_i, start_j)) in curr_wf.iter().enumerate() {
            // slide along the diagonal while the symbols match
            let (mut i, mut j) = (start_i, start_j);
            while i < l1 && j < l2 && matches(v1[i], v2[j]) {
                i += 1;
                j += 1;
            }

            if (i == l1 || !require_both_end) && j == l2 {
                return edits;
            }

            // deletion, mismatch, and insertion; an exhausted side cannot advance
            let next_i = min(i + 1, l1);
            let next_j = min(j + 1, l2);
            next_wf[wf_index] = max(next_wf[wf_index], (next_i, j));
            next_wf[wf_index + 1] = max(next_wf[wf_index + 1], (next_i, next_j));
            next_wf[wf_index + 2] = max(next_wf[wf_index + 2], (i, next_j));
        }

        edits += 1;
        curr_wf = next_wf;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wfa_ed() {
        assert_eq!(wfa_ed(b"", b""), 0);
        assert_eq!(wfa_ed(b"ACGT", b""), 4);
        assert_eq!(wfa_ed(b"", b"ACG"), 3);
        assert_eq!(wfa_ed(b"ACGTACGT", b"ACGTTACGT"), 1);
        assert_eq!(wfa_ed(b"AAAA", b"TTTT"), 4);
    }

    #[test]
    fn test_barcode_edit_distance() {
        let alphabet = Alphabet::nucleotide();
        assert_eq!(barcode_edit_distance(b"ACGT", b"ACGT", &alphabet), 0);
        assert_eq!(barcode_edit_distance(b"acgt", b"ACGT", &alphabet), 0);
        assert_eq!(barcode_edit_distance(b"ANNT", b"ACGT", &alphabet), 0);
        assert_eq!(barcode_edit_distance(b"--ACGT--", b"ACGT", &alphabet), 0);
        assert_eq!(barcode_edit_distance(b"ACGT", b"ACGTAA", &alphabet), 2);
        assert_eq!(barcode_edit_distance(b"ACKT", b"ACCT", &alphabet), 1);
    }
}
