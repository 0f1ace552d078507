/*!
Batch driver that ties association, trimming, consensus, and validation together.
Assembly happens outside of this crate: callers take the `AssemblyRequest`s, build an `Alignment` for each, and hand the results back as `AssembledGroup`s.
Independent traces and barcode groups are processed in parallel, and outputs keep the input order.
*/

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap as HashMap;

use crate::config::PipelineConfig;
use crate::consensus::build_consensus;
use crate::errors::Result;
use crate::mapping::{Association, MappingStrategy, TraceMapper};
use crate::quality_sequence::{Alignment, QualitySequence};
use crate::trimmer::{trim_with_config, Trimmage};
use crate::validation::{ValidationRegistry, ValidationResult, ValidationSuite};

/// A trace after end trimming
#[derive(Clone, Debug, PartialEq)]
pub struct TrimmedTrace {
    /// The bases that were removed from each end
    trimmage: Trimmage,
    /// The retained part of the trace, same name as the original
    trimmed: QualitySequence
}

impl TrimmedTrace {
    // Getters
    pub fn trimmage(&self) -> Trimmage {
        self.trimmage
    }

    pub fn trimmed(&self) -> &QualitySequence {
        &self.trimmed
    }
}

/// The traces that should get assembled for one barcode
#[derive(Clone, Debug, PartialEq)]
pub struct AssemblyRequest {
    pub barcode: QualitySequence,
    pub traces: Vec<TrimmedTrace>
}

/// One barcode with its trimmed traces and the alignment assembled from them
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledGroup {
    pub barcode: QualitySequence,
    pub traces: Vec<QualitySequence>,
    pub alignment: Alignment
}

/// Everything produced for one barcode group
#[derive(Clone, Debug, PartialEq)]
pub struct BarcodeReport {
    /// The barcode name
    barcode: String,
    /// The consensus derived from the alignment
    consensus: QualitySequence,
    /// Barcode results first, then trace results in trace order
    results: Vec<ValidationResult>
}

impl BarcodeReport {
    // Getters
    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    pub fn consensus(&self) -> &QualitySequence {
        &self.consensus
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    /// Returns true if no check failed; warnings are allowed
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| !r.outcome().is_fail())
    }
}

/// A configured validation run
pub struct Pipeline {
    config: PipelineConfig,
    strategy: MappingStrategy,
    registry: ValidationRegistry
}

impl Pipeline {
    /// Creates a pipeline with the built-in validation checks.
    /// # Arguments
    /// * `config` - trimming and validation thresholds
    /// * `strategy` - how traces get associated with barcodes
    pub fn new(config: PipelineConfig, strategy: MappingStrategy) -> Pipeline {
        Self::with_registry(config, strategy, ValidationRegistry::builtin())
    }

    /// Creates a pipeline with a custom set of validation checks
    pub fn with_registry(config: PipelineConfig, strategy: MappingStrategy, registry: ValidationRegistry) -> Pipeline {
        Pipeline {
            config,
            strategy,
            registry
        }
    }

    /// Groups the traces under their barcodes with the configured strategy
    /// # Errors
    /// * if the mapping configuration is malformed
    pub fn associate(&self, barcodes: &[QualitySequence], traces: &[QualitySequence]) -> Result<Association> {
        self.strategy.map(barcodes, traces)
    }

    /// Trims every trace in parallel; output order matches the input.
    /// # Errors
    /// * if any trace cannot be trimmed, in which case nothing is returned
    pub fn trim_traces(&self, traces: &[QualitySequence]) -> Result<Vec<TrimmedTrace>> {
        traces.par_iter()
            .map(|t| -> Result<TrimmedTrace> {
                let trimmage = trim_with_config(t, &self.config.trim)?;
                Ok(TrimmedTrace {
                    trimmage,
                    trimmed: trimmage.apply(t)?
                })
            })
            .collect()
    }

    /// Collects the trimmed traces for each associated barcode, in barcode input order.
    /// Barcodes without any associated trace are left out.
    pub fn assembly_requests(&self, association: &Association, barcodes: &[QualitySequence], trimmed: &[TrimmedTrace]) -> Vec<AssemblyRequest> {
        let trimmed_by_name: HashMap<&str, &TrimmedTrace> = trimmed.iter()
            .map(|t| (t.trimmed.name(), t))
            .collect();

        barcodes.iter()
            .filter_map(|barcode| {
                let names = association.traces(barcode.name())?;
                let traces: Vec<TrimmedTrace> = names.iter()
                    .filter_map(|n| trimmed_by_name.get(n.as_str()).map(|&t| t.clone()))
                    .collect();
                if traces.is_empty() {
                    None
                } else {
                    Some(AssemblyRequest {
                        barcode: barcode.clone(),
                        traces
                    })
                }
            })
            .collect()
    }

    /// Builds the consensus for one group and runs every registered check over it.
    /// # Errors
    /// * if the consensus cannot be built
    pub fn validate_group(&self, group: &AssembledGroup) -> Result<BarcodeReport> {
        let suite = self.registry.instantiate(&self.config.validation);
        validate_with_suite(&suite, group)
    }

    /// Validates every group in parallel, one task per barcode; output order matches the input.
    pub fn validate_groups(&self, groups: &[AssembledGroup]) -> Vec<Result<BarcodeReport>> {
        let suite = self.registry.instantiate(&self.config.validation);
        groups.par_iter()
            .map(|group| validate_with_suite(&suite, group))
            .collect()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

fn validate_with_suite(suite: &ValidationSuite, group: &AssembledGroup) -> Result<BarcodeReport> {
    let consensus = build_consensus(&group.alignment)?;
    let mut results = suite.run_barcode(&consensus, &group.barcode);
    for t in group.traces.iter() {
        results.extend(suite.run_trace(t));
    }
    debug!(
        "Validated \"{}\": {} results, {} failed",
        group.barcode.name(), results.len(), results.iter().filter(|r| r.outcome().is_fail()).count()
    );
    Ok(BarcodeReport {
        barcode: group.barcode.name().to_string(),
        consensus,
        results
    })
}
