/*!
Contains the extended nucleotide alphabet used for consensus voting and barcode comparison.
Every symbol carries a canonical base set, which is how ties between voting symbols get resolved to an ambiguity code.
```
use barcode_validator::alphabet::Alphabet;
let alphabet = Alphabet::nucleotide();
let a = alphabet.index_of(b'A').unwrap();
let c = alphabet.index_of(b'c').unwrap();
let resolved = alphabet.resolve(&[a, c]).unwrap();
assert_eq!(alphabet.symbol(resolved), b'M');
```
*/

use itertools::Itertools;

use crate::errors::{BarcodeError, Result};

/// Maximum number of symbols an alphabet can hold, this bounds the vote table in consensus
pub const MAX_SYMBOLS: usize = 16;
/// The gap symbol used to pad aligned reads
pub const GAP: u8 = b'-';

pub const BASE_A: u8 = 0b0001;
pub const BASE_C: u8 = 0b0010;
pub const BASE_G: u8 = 0b0100;
pub const BASE_T: u8 = 0b1000;
const ALL_BASES: u8 = BASE_A | BASE_C | BASE_G | BASE_T;

/// The full IUPAC nucleotide alphabet; the gap has an empty base set
const NUCLEOTIDE_SYMBOLS: [(u8, u8); 16] = [
    (b'A', BASE_A),
    (b'C', BASE_C),
    (b'G', BASE_G),
    (b'T', BASE_T),
    (b'R', BASE_A | BASE_G),
    (b'Y', BASE_C | BASE_T),
    (b'S', BASE_C | BASE_G),
    (b'W', BASE_A | BASE_T),
    (b'K', BASE_G | BASE_T),
    (b'M', BASE_A | BASE_C),
    (b'B', BASE_C | BASE_G | BASE_T),
    (b'D', BASE_A | BASE_G | BASE_T),
    (b'H', BASE_A | BASE_C | BASE_T),
    (b'V', BASE_A | BASE_C | BASE_G),
    (b'N', ALL_BASES),
    (GAP, 0)
];

/// A small closed alphabet where each symbol maps to the set of bases it may represent.
#[derive(Clone, Debug, PartialEq)]
pub struct Alphabet {
    /// The upper-case symbols in alphabet order
    symbols: Vec<u8>,
    /// For each symbol, a bitmask over A, C, G, T
    base_sets: Vec<u8>,
    /// Byte to symbol index lookup, covers both cases
    lookup: [Option<u8>; 256]
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::nucleotide()
    }
}

impl Alphabet {
    /// The IUPAC nucleotide alphabet with all ambiguity codes and a gap.
    pub fn nucleotide() -> Alphabet {
        // the constant table is well-formed, so this cannot fail
        Self::build(&NUCLEOTIDE_SYMBOLS)
    }

    /// Creates a custom alphabet from (symbol, base set) pairs.
    /// # Arguments
    /// * `entries` - the symbols and their base sets, a base set of 0 marks a gap-like symbol
    /// # Errors
    /// * if there are more than `MAX_SYMBOLS` entries, duplicated symbols, or base sets outside of ACGT
    pub fn new(entries: &[(u8, u8)]) -> Result<Alphabet> {
        if entries.is_empty() || entries.len() > MAX_SYMBOLS {
            return Err(BarcodeError::InvalidInput(format!(
                "alphabet must have between 1 and {MAX_SYMBOLS} symbols, found {}", entries.len()
            )));
        }
        if !entries.iter().map(|(s, _b)| s.to_ascii_uppercase()).all_unique() {
            return Err(BarcodeError::InvalidInput("alphabet symbols must be unique".to_string()));
        }
        if let Some((s, b)) = entries.iter().find(|(_s, b)| b & !ALL_BASES != 0) {
            return Err(BarcodeError::InvalidInput(format!(
                "symbol '{}' has an invalid base set {b:#06b}", *s as char
            )));
        }
        Ok(Self::build(entries))
    }

    fn build(entries: &[(u8, u8)]) -> Alphabet {
        let mut lookup = [None; 256];
        for (index, &(symbol, _base_set)) in entries.iter().enumerate() {
            lookup[symbol.to_ascii_uppercase() as usize] = Some(index as u8);
            lookup[symbol.to_ascii_lowercase() as usize] = Some(index as u8);
        }
        Alphabet {
            symbols: entries.iter().map(|(s, _b)| s.to_ascii_uppercase()).collect(),
            base_sets: entries.iter().map(|(_s, b)| *b).collect(),
            lookup
        }
    }

    /// Returns the symbol index for a raw byte, case-insensitive
    pub fn index_of(&self, symbol: u8) -> Option<usize> {
        self.lookup[symbol as usize].map(|i| i as usize)
    }

    /// Returns the upper-case symbol at an index
    pub fn symbol(&self, index: usize) -> u8 {
        self.symbols[index]
    }

    pub fn base_set(&self, index: usize) -> u8 {
        self.base_sets[index]
    }

    pub fn is_gap(&self, index: usize) -> bool {
        self.base_sets[index] == 0
    }

    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Resolves a set of tied symbols to the single symbol that best represents all of them.
    /// A lone winner is returned as-is. Otherwise, this finds the symbol with the smallest base set
    /// that covers every winner; gaps contribute nothing to the covered set.
    /// # Arguments
    /// * `winners` - the symbol indices that tied, must be non-empty
    /// # Errors
    /// * if no symbol in the alphabet covers the union of the winners
    pub fn resolve(&self, winners: &[usize]) -> Result<usize> {
        match winners {
            [] => Err(BarcodeError::InvalidInput("cannot resolve an empty set of symbols".to_string())),
            [single] => Ok(*single),
            _ => {
                let union = winners.iter().fold(0, |acc, &w| acc | self.base_sets[w]);
                let candidate = if union == 0 {
                    // only gaps tied
                    self.base_sets.iter().position(|&b| b == 0)
                } else {
                    self.base_sets.iter()
                        .enumerate()
                        .filter(|&(_i, &b)| b != 0 && b & union == union)
                        .min_by_key(|&(i, &b)| (b.count_ones(), i))
                        .map(|(i, _b)| i)
                };
                candidate.ok_or_else(|| BarcodeError::NoAmbiguitySymbol {
                    symbols: winners.iter().map(|&w| self.symbols[w] as char).collect()
                })
            }
        }
    }

    /// Returns true if two raw symbols could represent the same base.
    /// Gaps only match gaps, and symbols outside the alphabet only match themselves.
    pub fn compatible(&self, s1: u8, s2: u8) -> bool {
        match (self.index_of(s1), self.index_of(s2)) {
            (Some(i1), Some(i2)) => {
                let (b1, b2) = (self.base_sets[i1], self.base_sets[i2]);
                if b1 == 0 || b2 == 0 {
                    b1 == b2
                } else {
                    b1 & b2 != 0
                }
            },
            _ => s1 == s2
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let alphabet = Alphabet::nucleotide();
        assert_eq!(alphabet.len(), 16);
        assert_eq!(alphabet.index_of(b'g'), alphabet.index_of(b'G'));
        assert_eq!(alphabet.index_of(b'X'), None);
        assert!(alphabet.is_gap(alphabet.index_of(GAP).unwrap()));
    }

    #[test]
    fn test_resolve_ties() {
        let alphabet = Alphabet::nucleotide();
        let idx = |s: u8| alphabet.index_of(s).unwrap();

        assert_eq!(alphabet.symbol(alphabet.resolve(&[idx(b'T')]).unwrap()), b'T');
        assert_eq!(alphabet.symbol(alphabet.resolve(&[idx(b'A'), idx(b'G')]).unwrap()), b'R');
        assert_eq!(alphabet.symbol(alphabet.resolve(&[idx(b'C'), idx(b'T')]).unwrap()), b'Y');
        assert_eq!(alphabet.symbol(alphabet.resolve(&[idx(b'A'), idx(b'C'), idx(b'G')]).unwrap()), b'V');
        assert_eq!(alphabet.symbol(alphabet.resolve(&[idx(b'A'), idx(b'C'), idx(b'G'), idx(b'T')]).unwrap()), b'N');
        // an ambiguity code tied with one of its own bases collapses to the code
        assert_eq!(alphabet.symbol(alphabet.resolve(&[idx(b'R'), idx(b'A')]).unwrap()), b'R');
        // gaps add nothing to the union
        assert_eq!(alphabet.symbol(alphabet.resolve(&[idx(b'A'), idx(GAP)]).unwrap()), b'A');
    }

    #[test]
    fn test_reduced_alphabet_has_no_ambiguity() {
        let alphabet = Alphabet::new(&[
            (b'A', BASE_A), (b'C', BASE_C), (b'G', BASE_G), (b'T', BASE_T), (GAP, 0)
        ]).unwrap();
        let result = alphabet.resolve(&[0, 1]);
        assert_eq!(result, Err(BarcodeError::NoAmbiguitySymbol { symbols: "AC".to_string() }));
    }

    #[test]
    fn test_invalid_alphabets() {
        assert!(Alphabet::new(&[]).is_err());
        assert!(Alphabet::new(&[(b'A', BASE_A), (b'a', BASE_A)]).is_err());
        assert!(Alphabet::new(&[(b'A', 0b10000)]).is_err());
    }

    #[test]
    fn test_compatible() {
        let alphabet = Alphabet::nucleotide();
        assert!(alphabet.compatible(b'A', b'a'));
        assert!(alphabet.compatible(b'R', b'G'));
        assert!(alphabet.compatible(b'N', b'T'));
        assert!(!alphabet.compatible(b'Y', b'A'));
        assert!(!alphabet.compatible(GAP, b'A'));
        assert!(alphabet.compatible(GAP, GAP));
    }
}
