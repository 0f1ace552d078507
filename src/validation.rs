/*!
Validation checks and the static registry that provides them.
Checks are registered explicitly per scope, and results always come back in registration order.

# Example usage
```rust
use barcode_validator::config::ValidationConfig;
use barcode_validator::quality_sequence::QualitySequence;
use barcode_validator::validation::{Outcome, Scope, ValidationRegistry};

let registry = ValidationRegistry::builtin();
assert_eq!(registry.check_names(Scope::Trace), vec!["trace_length", "trace_quality"]);

let config = ValidationConfig { min_trace_length: 4, ..Default::default() };
let suite = registry.instantiate(&config);
let trace = QualitySequence::new("trace1", b"ACGT".to_vec(), Some(vec![40; 4])).unwrap();
let results = suite.run_trace(&trace);
assert!(results.iter().all(|r| r.outcome() == &Outcome::Pass));
```
*/

use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::alphabet::Alphabet;
use crate::config::ValidationConfig;
use crate::errors::{BarcodeError, Result};
use crate::quality_sequence::QualitySequence;
use crate::sequence_alignment::barcode_edit_distance;

/// Which kind of input a check operates on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One trimmed trace
    Trace,
    /// One consensus and its barcode
    Barcode
}

impl FromStr for Scope {
    type Err = BarcodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "trace" => Ok(Scope::Trace),
            "barcode" => Ok(Scope::Barcode),
            _ => Err(BarcodeError::InvalidInput(format!("unknown validation scope \"{s}\"")))
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scope::Trace => write!(f, "trace"),
            Scope::Barcode => write!(f, "barcode")
        }
    }
}

/// Result of running one check
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Warning(String),
    Fail(String)
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }
}

/// One (scope, check name, outcome) entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    scope: Scope,
    check_name: &'static str,
    /// The input that was checked, trace name or barcode name
    subject: String,
    outcome: Outcome
}

impl ValidationResult {
    // Getters
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn check_name(&self) -> &'static str {
        self.check_name
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
}

/// A check over one trimmed trace
pub trait TraceCheck: Send + Sync {
    fn run(&self, trace: &QualitySequence) -> Outcome;
}

/// A check over one consensus and the barcode it should reconstruct
pub trait BarcodeCheck: Send + Sync {
    fn run(&self, consensus: &QualitySequence, barcode: &QualitySequence) -> Outcome;
}

pub type TraceCheckFactory = fn(&ValidationConfig) -> Box<dyn TraceCheck>;
pub type BarcodeCheckFactory = fn(&ValidationConfig) -> Box<dyn BarcodeCheck>;

/// Ordered, per-scope list of check factories
#[derive(Clone, Default)]
pub struct ValidationRegistry {
    trace_factories: Vec<(&'static str, TraceCheckFactory)>,
    barcode_factories: Vec<(&'static str, BarcodeCheckFactory)>
}

impl ValidationRegistry {
    /// Registry with all of the built-in checks
    pub fn builtin() -> ValidationRegistry {
        let mut registry = ValidationRegistry::default();
        registry.trace_factories.push(("trace_length", trace_length_check));
        registry.trace_factories.push(("trace_quality", trace_quality_check));
        registry.barcode_factories.push(("barcode_match", barcode_match_check));
        registry.barcode_factories.push(("consensus_support", consensus_support_check));
        registry
    }

    /// Adds a trace-scope check after the ones already registered.
    /// # Errors
    /// * if a trace check with the same name exists
    pub fn register_trace(&mut self, name: &'static str, factory: TraceCheckFactory) -> Result<()> {
        if self.trace_factories.iter().any(|(n, _f)| *n == name) {
            return Err(BarcodeError::InvalidInput(format!("trace check \"{name}\" is already registered")));
        }
        self.trace_factories.push((name, factory));
        Ok(())
    }

    /// Adds a barcode-scope check after the ones already registered.
    /// # Errors
    /// * if a barcode check with the same name exists
    pub fn register_barcode(&mut self, name: &'static str, factory: BarcodeCheckFactory) -> Result<()> {
        if self.barcode_factories.iter().any(|(n, _f)| *n == name) {
            return Err(BarcodeError::InvalidInput(format!("barcode check \"{name}\" is already registered")));
        }
        self.barcode_factories.push((name, factory));
        Ok(())
    }

    /// Returns the registered check names for a scope, in registration order
    pub fn check_names(&self, scope: Scope) -> Vec<&'static str> {
        match scope {
            Scope::Trace => self.trace_factories.iter().map(|(n, _f)| *n).collect(),
            Scope::Barcode => self.barcode_factories.iter().map(|(n, _f)| *n).collect()
        }
    }

    /// Builds only the checks of a named scope (`"trace"` or `"barcode"`), in registration order.
    /// The returned suite produces no results for the other scope.
    /// # Errors
    /// * if the scope name is unknown
    pub fn instantiate_scope(&self, scope: &str, config: &ValidationConfig) -> Result<ValidationSuite> {
        let scope: Scope = scope.parse()?;
        let mut suite = self.instantiate(config);
        match scope {
            Scope::Trace => suite.barcode_checks.clear(),
            Scope::Barcode => suite.trace_checks.clear()
        };
        Ok(suite)
    }

    /// Builds every registered check with the given thresholds
    pub fn instantiate(&self, config: &ValidationConfig) -> ValidationSuite {
        ValidationSuite {
            trace_checks: self.trace_factories.iter()
                .map(|(name, factory)| (*name, factory(config)))
                .collect(),
            barcode_checks: self.barcode_factories.iter()
                .map(|(name, factory)| (*name, factory(config)))
                .collect()
        }
    }
}

/// A set of instantiated checks, ready to run
pub struct ValidationSuite {
    trace_checks: Vec<(&'static str, Box<dyn TraceCheck>)>,
    barcode_checks: Vec<(&'static str, Box<dyn BarcodeCheck>)>
}

impl ValidationSuite {
    /// Returns the instantiated check names for a scope, in registration order
    pub fn check_names(&self, scope: Scope) -> Vec<&'static str> {
        match scope {
            Scope::Trace => self.trace_checks.iter().map(|(n, _c)| *n).collect(),
            Scope::Barcode => self.barcode_checks.iter().map(|(n, _c)| *n).collect()
        }
    }

    /// Runs every trace check over one trimmed trace
    pub fn run_trace(&self, trace: &QualitySequence) -> Vec<ValidationResult> {
        self.trace_checks.iter()
            .map(|(name, check)| {
                let outcome = check.run(trace);
                debug!("{name}(\"{}\") => {outcome:?}", trace.name());
                ValidationResult {
                    scope: Scope::Trace,
                    check_name: *name,
                    subject: trace.name().to_string(),
                    outcome
                }
            })
            .collect()
    }

    /// Runs every barcode check over a consensus and its barcode
    pub fn run_barcode(&self, consensus: &QualitySequence, barcode: &QualitySequence) -> Vec<ValidationResult> {
        self.barcode_checks.iter()
            .map(|(name, check)| {
                let outcome = check.run(consensus, barcode);
                debug!("{name}(\"{}\") => {outcome:?}", barcode.name());
                ValidationResult {
                    scope: Scope::Barcode,
                    check_name: *name,
                    subject: barcode.name().to_string(),
                    outcome
                }
            })
            .collect()
    }
}

fn trace_length_check(config: &ValidationConfig) -> Box<dyn TraceCheck> {
    Box::new(TraceLengthCheck { min_length: config.min_trace_length })
}

fn trace_quality_check(config: &ValidationConfig) -> Box<dyn TraceCheck> {
    Box::new(TraceQualityCheck {
        threshold: config.high_quality_threshold,
        min_fraction: config.min_high_quality_fraction
    })
}

fn barcode_match_check(config: &ValidationConfig) -> Box<dyn BarcodeCheck> {
    Box::new(BarcodeMatchCheck {
        max_edits: config.max_barcode_edits,
        alphabet: Alphabet::nucleotide()
    })
}

fn consensus_support_check(_config: &ValidationConfig) -> Box<dyn BarcodeCheck> {
    Box::new(ConsensusSupportCheck)
}

/// Fails traces that are too short after trimming
struct TraceLengthCheck {
    min_length: usize
}

impl TraceCheck for TraceLengthCheck {
    fn run(&self, trace: &QualitySequence) -> Outcome {
        if trace.len() >= self.min_length {
            Outcome::Pass
        } else {
            Outcome::Fail(format!("trimmed length {} is below {}", trace.len(), self.min_length))
        }
    }
}

/// Fails traces with too few high quality bases
struct TraceQualityCheck {
    threshold: i32,
    min_fraction: f64
}

impl TraceCheck for TraceQualityCheck {
    fn run(&self, trace: &QualitySequence) -> Outcome {
        let Some(qualities) = trace.qualities() else {
            return Outcome::Warning("trace has no quality values".to_string());
        };
        if qualities.is_empty() {
            return Outcome::Fail("trace is empty".to_string());
        }
        let high = qualities.iter().filter(|&&q| q >= self.threshold).count();
        let fraction = high as f64 / qualities.len() as f64;
        if fraction >= self.min_fraction {
            Outcome::Pass
        } else {
            Outcome::Fail(format!(
                "{:.1}% of bases are at least Q{}, expected {:.1}%", 100.0 * fraction, self.threshold, 100.0 * self.min_fraction
            ))
        }
    }
}

/// Compares the consensus to its barcode, ambiguity codes match any base they cover
struct BarcodeMatchCheck {
    max_edits: usize,
    alphabet: Alphabet
}

impl BarcodeCheck for BarcodeMatchCheck {
    fn run(&self, consensus: &QualitySequence, barcode: &QualitySequence) -> Outcome {
        let edits = barcode_edit_distance(consensus.sequence(), barcode.sequence(), &self.alphabet);
        if edits == 0 {
            Outcome::Pass
        } else if edits <= self.max_edits {
            Outcome::Warning(format!("consensus differs from the barcode by {edits} edits"))
        } else {
            Outcome::Fail(format!("consensus differs from the barcode by {edits} edits, more than {}", self.max_edits))
        }
    }
}

/// Warns when consensus columns have no net support
struct ConsensusSupportCheck;

impl BarcodeCheck for ConsensusSupportCheck {
    fn run(&self, consensus: &QualitySequence, _barcode: &QualitySequence) -> Outcome {
        let Some(qualities) = consensus.qualities() else {
            return Outcome::Warning("consensus has no quality values".to_string());
        };
        let unsupported = qualities.iter().filter(|&&q| q <= 0).count();
        if unsupported == 0 {
            Outcome::Pass
        } else {
            Outcome::Warning(format!("{unsupported} of {} consensus columns have no net support", qualities.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysWarn;

    impl TraceCheck for AlwaysWarn {
        fn run(&self, _trace: &QualitySequence) -> Outcome {
            Outcome::Warning("always".to_string())
        }
    }

    fn always_warn(_config: &ValidationConfig) -> Box<dyn TraceCheck> {
        Box::new(AlwaysWarn)
    }

    fn qs(name: &str, sequence: &[u8], qualities: &[i32]) -> QualitySequence {
        QualitySequence::new(name, sequence.to_vec(), Some(qualities.to_vec())).unwrap()
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("trace".parse::<Scope>().unwrap(), Scope::Trace);
        assert_eq!("barcode".parse::<Scope>().unwrap(), Scope::Barcode);
        assert!("contig".parse::<Scope>().is_err());
        assert_eq!(Scope::Barcode.to_string(), "barcode");
    }

    #[test]
    fn test_registration_order() {
        let mut registry = ValidationRegistry::builtin();
        registry.register_trace("always_warn", always_warn).unwrap();
        assert!(registry.register_trace("trace_length", always_warn).is_err());
        assert_eq!(registry.check_names(Scope::Trace), vec!["trace_length", "trace_quality", "always_warn"]);
        assert_eq!(registry.check_names(Scope::Barcode), vec!["barcode_match", "consensus_support"]);
        assert!(ValidationRegistry::default().check_names(Scope::Trace).is_empty());

        let suite = registry.instantiate(&ValidationConfig { min_trace_length: 2, ..Default::default() });
        let results = suite.run_trace(&qs("t1", b"ACGT", &[40; 4]));
        let names: Vec<&str> = results.iter().map(|r| r.check_name()).collect();
        assert_eq!(names, vec!["trace_length", "trace_quality", "always_warn"]);
        assert_eq!(results[2].outcome(), &Outcome::Warning("always".to_string()));
        assert!(results.iter().all(|r| r.scope() == Scope::Trace && r.subject() == "t1"));
    }

    #[test]
    fn test_instantiate_scope() {
        let mut registry = ValidationRegistry::builtin();
        registry.register_trace("always_warn", always_warn).unwrap();
        let config = ValidationConfig { min_trace_length: 2, ..Default::default() };

        let trace_suite = registry.instantiate_scope("trace", &config).unwrap();
        assert_eq!(trace_suite.check_names(Scope::Trace), vec!["trace_length", "trace_quality", "always_warn"]);
        assert!(trace_suite.check_names(Scope::Barcode).is_empty());
        let barcode = QualitySequence::without_quality("barcode1", b"ACGT".to_vec());
        assert!(trace_suite.run_barcode(&qs("c", b"ACGT", &[40; 4]), &barcode).is_empty());
        let results = trace_suite.run_trace(&qs("t1", b"ACGT", &[40; 4]));
        assert_eq!(results.len(), 3);
        assert_eq!(results[2].outcome(), &Outcome::Warning("always".to_string()));

        let barcode_suite = registry.instantiate_scope("barcode", &config).unwrap();
        assert_eq!(barcode_suite.check_names(Scope::Barcode), vec!["barcode_match", "consensus_support"]);
        assert!(barcode_suite.check_names(Scope::Trace).is_empty());
        assert!(barcode_suite.run_trace(&qs("t1", b"ACGT", &[40; 4])).is_empty());

        assert!(matches!(registry.instantiate_scope("contig", &config), Err(BarcodeError::InvalidInput(_))));
    }

    #[test]
    fn test_trace_checks() {
        let config = ValidationConfig {
            min_trace_length: 5,
            high_quality_threshold: 20,
            min_high_quality_fraction: 0.5,
            ..Default::default()
        };
        let suite = ValidationRegistry::builtin().instantiate(&config);

        let short = suite.run_trace(&qs("short", b"ACGT", &[40; 4]));
        assert!(short[0].outcome().is_fail());
        assert!(short[1].outcome().is_pass());

        let low_quality = suite.run_trace(&qs("low", b"ACGTACG", &[10, 10, 10, 10, 40, 40, 40]));
        assert!(low_quality[0].outcome().is_pass());
        assert!(low_quality[1].outcome().is_fail());

        let no_quality = suite.run_trace(&QualitySequence::without_quality("nq", b"ACGTA".to_vec()));
        assert!(matches!(no_quality[1].outcome(), Outcome::Warning(_)));
    }

    #[test]
    fn test_barcode_checks() {
        let config = ValidationConfig { max_barcode_edits: 1, ..Default::default() };
        let suite = ValidationRegistry::builtin().instantiate(&config);
        let barcode = QualitySequence::without_quality("barcode1", b"ACGTACGT".to_vec());

        let exact = suite.run_barcode(&qs("c", b"-ACGTRCGT-", &[5, 60, 60, 60, 60, 30, 60, 60, 60, 5]), &barcode);
        assert_eq!(exact[0].outcome(), &Outcome::Pass);
        assert_eq!(exact[1].outcome(), &Outcome::Pass);
        assert_eq!(exact[0].subject(), "barcode1");

        let one_off = suite.run_barcode(&qs("c", b"ACGTCCGT", &[60, 60, 60, 60, -10, 60, 60, 60]), &barcode);
        assert!(matches!(one_off[0].outcome(), Outcome::Warning(_)));
        assert_eq!(one_off[1].outcome(), &Outcome::Warning("1 of 8 consensus columns have no net support".to_string()));

        let far_off = suite.run_barcode(&qs("c", b"TTTTTTTT", &[60; 8]), &barcode);
        assert!(far_off[0].outcome().is_fail());
    }
}
