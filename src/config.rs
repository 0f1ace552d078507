/*!
Contains configuration information for trimming, validation, and the batch pipeline.
Typical usage is to the use the builders to construct the config, e.g.
```
use barcode_validator::config::{TrimConfig, TrimConfigBuilder};
use barcode_validator::trimmer::TrimPolicy;
let config: TrimConfig = TrimConfigBuilder::default()
    .policy(TrimPolicy::Start)
    .error_probability_limit(0.01)
    .build()
    .unwrap();
```
*/

use crate::trimmer::TrimPolicy;

/// Configuration for end trimming.
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct TrimConfig {
    /// Which ends of the read are allowed to get shortened
    pub policy: TrimPolicy,
    /// Per-base error probability that a retained base should beat, must be in (0, 1)
    pub error_probability_limit: f64
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            policy: TrimPolicy::Both,
            // roughly Phred 13, which keeps most usable Sanger signal
            error_probability_limit: 0.05
        }
    }
}

/// Configuration for the built-in validation checks.
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct ValidationConfig {
    /// Minimum length of a trimmed trace
    pub min_trace_length: usize,
    /// Phred quality at which a base counts as high quality
    pub high_quality_threshold: i32,
    /// Minimum fraction of high quality bases in a trimmed trace
    pub min_high_quality_fraction: f64,
    /// Consensus to barcode edit distance tolerated with a warning, anything above fails
    pub max_barcode_edits: usize
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_trace_length: 100,
            high_quality_threshold: 20,
            min_high_quality_fraction: 0.5,
            max_barcode_edits: 3
        }
    }
}

/// Top-level configuration for a pipeline run.
#[derive(derive_builder::Builder, Clone, Debug, Default, PartialEq)]
#[builder(default)]
pub struct PipelineConfig {
    /// Trimming applied to every trace before validation
    pub trim: TrimConfig,
    /// Thresholds for the registered checks
    pub validation: ValidationConfig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfigBuilder::default()
            .validation(ValidationConfigBuilder::default().min_trace_length(20).build().unwrap())
            .build().unwrap();
        assert_eq!(config.trim, TrimConfig::default());
        assert_eq!(config.validation.min_trace_length, 20);
        assert_eq!(config.validation.max_barcode_edits, 3);
    }
}
