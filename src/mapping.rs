/*!
Strategies for associating traces with their barcode.
Every strategy produces the same `Association` shape, so the rest of the pipeline does not care which one was configured.
Traces that nothing matches are left out of the association, use `Association::unmapped(...)` to find them.

# Example usage
```rust
use barcode_validator::mapping::{FilenamePatternMapper, MappingStrategy, TraceMapper};
use barcode_validator::quality_sequence::QualitySequence;

let barcodes = vec![
    QualitySequence::without_quality("1_barcode1", b"ACGT".to_vec()),
    QualitySequence::without_quality("2_barcode2", b"ACGT".to_vec())
];
let traces: Vec<QualitySequence> = ["trace1_1", "trace2_1", "trace3_2", "orphan"].iter()
    .map(|name| QualitySequence::without_quality(name, b"ACGT".to_vec()))
    .collect();

// trace keys are the part after '_', barcode keys are the part before it
let strategy = MappingStrategy::FilenamePattern(FilenamePatternMapper::from_separator('_', 1, 0).unwrap());
let association = strategy.map(&barcodes, &traces).unwrap();
assert_eq!(association.traces("1_barcode1").unwrap(), &["trace1_1", "trace2_1"]);
assert_eq!(association.traces("2_barcode2").unwrap(), &["trace3_2"]);
assert_eq!(association.unmapped(&traces).len(), 1);
```
*/

use log::{debug, trace, warn};
use regex::Regex;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use serde::Deserialize;

use crate::errors::{BarcodeError, Result};
use crate::quality_sequence::QualitySequence;

/// Barcode to trace grouping; every trace belongs to at most one barcode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Association {
    /// For each barcode, the sorted trace identifiers
    barcode_traces: HashMap<String, Vec<String>>,
    /// Reverse lookup from trace to barcode
    trace_barcode: HashMap<String, String>
}

impl Association {
    /// Assigns a trace to a barcode.
    /// Returns false, and leaves the association unchanged, if the trace is already assigned to a different barcode.
    pub fn insert(&mut self, barcode: &str, trace: &str) -> bool {
        if let Some(existing) = self.trace_barcode.get(trace) {
            if existing != barcode {
                warn!("Trace \"{trace}\" matches \"{barcode}\" but is already assigned to \"{existing}\", ignoring");
                return false;
            }
            return true;
        }

        self.trace_barcode.insert(trace.to_string(), barcode.to_string());
        let traces = self.barcode_traces.entry(barcode.to_string()).or_default();
        if let Err(position) = traces.binary_search_by(|t| t.as_str().cmp(trace)) {
            traces.insert(position, trace.to_string());
        }
        true
    }

    /// Returns the sorted traces for a barcode, or None if nothing was assigned to it
    pub fn traces(&self, barcode: &str) -> Option<&[String]> {
        self.barcode_traces.get(barcode).map(|t| t.as_slice())
    }

    /// Returns the barcode a trace was assigned to
    pub fn barcode_of(&self, trace: &str) -> Option<&str> {
        self.trace_barcode.get(trace).map(|b| b.as_str())
    }

    /// Returns the barcodes with at least one trace, sorted
    pub fn barcodes(&self) -> Vec<&str> {
        let mut barcodes: Vec<&str> = self.barcode_traces.keys().map(|b| b.as_str()).collect();
        barcodes.sort_unstable();
        barcodes
    }

    /// Returns the traces from `traces` that are not assigned to any barcode, in input order
    pub fn unmapped<'t>(&self, traces: &'t [QualitySequence]) -> Vec<&'t QualitySequence> {
        traces.iter()
            .filter(|t| !self.trace_barcode.contains_key(t.name()))
            .collect()
    }

    /// Number of barcodes with at least one trace
    pub fn len(&self) -> usize {
        self.barcode_traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcode_traces.is_empty()
    }

    /// Total number of assigned traces
    pub fn num_traces(&self) -> usize {
        self.trace_barcode.len()
    }
}

/// Shared interface for all association strategies.
/// Implementations never fail because of unmatched items, only because of bad configuration.
pub trait TraceMapper {
    /// Groups the traces under the barcodes they belong to.
    /// # Arguments
    /// * `barcodes` - the reference barcodes, identified by name
    /// * `traces` - the traces to assign, identified by name
    /// # Errors
    /// * `InvalidMappingConfiguration` if the strategy's configuration is malformed
    fn map(&self, barcodes: &[QualitySequence], traces: &[QualitySequence]) -> Result<Association>;
}

/// The configured association strategy for a run
#[derive(Clone, Debug)]
pub enum MappingStrategy {
    /// Match keys extracted from trace and barcode names
    FilenamePattern(FilenamePatternMapper),
    /// Look up pairs from an external list file
    ListFile(ListFileMapper),
    /// Follow trace references in barcode metadata
    MetadataFile(MetadataFileMapper)
}

impl TraceMapper for MappingStrategy {
    fn map(&self, barcodes: &[QualitySequence], traces: &[QualitySequence]) -> Result<Association> {
        let association = match self {
            MappingStrategy::FilenamePattern(m) => m.map(barcodes, traces),
            MappingStrategy::ListFile(m) => m.map(barcodes, traces),
            MappingStrategy::MetadataFile(m) => m.map(barcodes, traces)
        }?;
        debug!(
            "Mapped {} of {} traces to {} of {} barcodes",
            association.num_traces(), traces.len(), association.len(), barcodes.len()
        );
        Ok(association)
    }
}

/// Associates traces and barcodes whose names produce the same key under a pair of extraction patterns.
#[derive(Clone, Debug)]
pub struct FilenamePatternMapper {
    trace_pattern: Regex,
    trace_group: usize,
    barcode_pattern: Regex,
    barcode_group: usize
}

impl FilenamePatternMapper {
    /// Creates a mapper from two regular expressions and the capture group holding the key in each.
    /// # Arguments
    /// * `trace_pattern` - regex applied to trace names
    /// * `trace_group` - capture group index of the key in `trace_pattern`, 0 is the whole match
    /// * `barcode_pattern` - regex applied to barcode names
    /// * `barcode_group` - capture group index of the key in `barcode_pattern`
    /// # Errors
    /// * if either regex is invalid or a group index does not exist in its pattern
    pub fn new(trace_pattern: &str, trace_group: usize, barcode_pattern: &str, barcode_group: usize) -> Result<FilenamePatternMapper> {
        Ok(FilenamePatternMapper {
            trace_pattern: compile_pattern(trace_pattern, trace_group)?,
            trace_group,
            barcode_pattern: compile_pattern(barcode_pattern, barcode_group)?,
            barcode_group
        })
    }

    /// Creates a mapper that splits names on a separator and uses one part as the key.
    /// # Arguments
    /// * `separator` - the character separating name parts
    /// * `trace_part` - 0-based part of the trace name to use as the key
    /// * `barcode_part` - 0-based part of the barcode name to use as the key
    pub fn from_separator(separator: char, trace_part: usize, barcode_part: usize) -> Result<FilenamePatternMapper> {
        let escaped = regex::escape(&separator.to_string());
        let part_pattern = |part: usize| format!("^(?:[^{escaped}]*{escaped}){{{part}}}([^{escaped}]*)");
        Self::new(&part_pattern(trace_part), 1, &part_pattern(barcode_part), 1)
    }

    /// Returns the key for a trace name, if the pattern matches
    pub fn trace_key<'n>(&self, name: &'n str) -> Option<&'n str> {
        extract_key(&self.trace_pattern, self.trace_group, name)
    }

    /// Returns the key for a barcode name, if the pattern matches
    pub fn barcode_key<'n>(&self, name: &'n str) -> Option<&'n str> {
        extract_key(&self.barcode_pattern, self.barcode_group, name)
    }
}

impl TraceMapper for FilenamePatternMapper {
    fn map(&self, barcodes: &[QualitySequence], traces: &[QualitySequence]) -> Result<Association> {
        let mut barcodes_by_key: HashMap<&str, &str> = Default::default();
        for barcode in barcodes.iter() {
            let Some(key) = self.barcode_key(barcode.name()) else {
                debug!("Barcode \"{}\" does not match the barcode pattern", barcode.name());
                continue;
            };
            if let Some(existing) = barcodes_by_key.get(key) {
                warn!("Barcodes \"{existing}\" and \"{}\" share the key \"{key}\", keeping the first", barcode.name());
                continue;
            }
            barcodes_by_key.insert(key, barcode.name());
        }

        let mut association = Association::default();
        for t in traces.iter() {
            match self.trace_key(t.name()).and_then(|key| barcodes_by_key.get(key)) {
                Some(barcode) => {
                    trace!("\"{}\" => \"{barcode}\"", t.name());
                    association.insert(barcode, t.name());
                },
                None => debug!("Trace \"{}\" does not match any barcode", t.name())
            }
        }
        Ok(association)
    }
}

fn compile_pattern(pattern: &str, group: usize) -> Result<Regex> {
    let regex = Regex::new(pattern).map_err(|e| BarcodeError::InvalidMappingConfiguration(
        format!("invalid pattern \"{pattern}\": {e}")
    ))?;
    if group >= regex.captures_len() {
        return Err(BarcodeError::InvalidMappingConfiguration(format!(
            "pattern \"{pattern}\" has no capture group {group}"
        )));
    }
    Ok(regex)
}

fn extract_key<'n>(regex: &Regex, group: usize, name: &'n str) -> Option<&'n str> {
    regex.captures(name)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str())
        .filter(|k| !k.is_empty())
}

/// Layout of an external list file
#[derive(derive_builder::Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct ListFileFormat {
    /// Field delimiter
    pub delimiter: u8,
    /// If true, the first record is a header and gets skipped
    pub has_headers: bool,
    /// 0-based column holding the barcode name
    pub barcode_column: usize,
    /// 0-based column holding the trace name
    pub trace_column: usize
}

impl Default for ListFileFormat {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            has_headers: false,
            barcode_column: 0,
            trace_column: 1
        }
    }
}

/// Associates traces and barcodes from explicit (barcode, trace) records in a list file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListFileMapper {
    /// Parsed (barcode name, trace name) records in file order
    records: Vec<(String, String)>
}

impl ListFileMapper {
    /// Parses the list file contents. Lines starting with '#' are comments.
    /// # Arguments
    /// * `contents` - the full text of the list file
    /// * `format` - the delimiter and column layout
    /// # Errors
    /// * if a record cannot be parsed or is missing the barcode or trace column
    pub fn parse(contents: &str, format: &ListFileFormat) -> Result<ListFileMapper> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(format.delimiter)
            .has_headers(format.has_headers)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let mut records = vec![];
        for row in csv_reader.records() {
            let record = row.map_err(|e| BarcodeError::InvalidMappingConfiguration(format!("list file: {e}")))?;
            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            let line = record.position().map_or(0, |p| p.line());
            let barcode = record.get(format.barcode_column).filter(|f| !f.is_empty());
            let trace = record.get(format.trace_column).filter(|f| !f.is_empty());
            match (barcode, trace) {
                (Some(b), Some(t)) => records.push((b.to_string(), t.to_string())),
                _ => return Err(BarcodeError::InvalidMappingConfiguration(format!(
                    "list file line {line}: expected a barcode in column {} and a trace in column {}",
                    format.barcode_column, format.trace_column
                )))
            }
        }
        debug!("Parsed {} list file records", records.len());
        Ok(ListFileMapper { records })
    }

    pub fn records(&self) -> &[(String, String)] {
        &self.records
    }
}

impl TraceMapper for ListFileMapper {
    fn map(&self, barcodes: &[QualitySequence], traces: &[QualitySequence]) -> Result<Association> {
        let barcode_names: HashSet<&str> = barcodes.iter().map(|b| b.name()).collect();
        let trace_names: HashSet<&str> = traces.iter().map(|t| t.name()).collect();

        let mut association = Association::default();
        for (barcode, t) in self.records.iter() {
            if barcode_names.contains(barcode.as_str()) && trace_names.contains(t.as_str()) {
                association.insert(barcode, t);
            } else {
                debug!("Skipping list record (\"{barcode}\", \"{t}\"), not in the inputs");
            }
        }
        Ok(association)
    }
}

/// Barcode metadata document, only the trace references are used
#[derive(Debug, Default, Deserialize)]
struct BarcodeMetadata {
    #[serde(default)]
    traces: Vec<String>
}

/// Associates traces referenced by name in JSON barcode metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataFileMapper {
    /// For each barcode name, the referenced trace names in document order
    references: HashMap<String, Vec<String>>
}

impl MetadataFileMapper {
    /// Parses a shared sidecar document of the form `{"<barcode>": {"traces": ["<trace>", ...]}, ...}`.
    /// # Errors
    /// * if the document is not valid metadata JSON
    pub fn from_sidecar(document: &str) -> Result<MetadataFileMapper> {
        let parsed: HashMap<String, BarcodeMetadata> = serde_json::from_str(document)
            .map_err(|e| BarcodeError::InvalidMappingConfiguration(format!("metadata sidecar: {e}")))?;
        Ok(MetadataFileMapper {
            references: parsed.into_iter()
                .map(|(barcode, metadata)| (barcode, metadata.traces))
                .collect()
        })
    }

    /// Parses one document per barcode, each of the form `{"traces": ["<trace>", ...]}`.
    /// # Arguments
    /// * `documents` - pairs of barcode name and its metadata document
    /// # Errors
    /// * if any document is not valid metadata JSON
    /// * if a barcode has more than one document
    pub fn from_documents<I, B, D>(documents: I) -> Result<MetadataFileMapper>
    where
        I: IntoIterator<Item = (B, D)>,
        B: Into<String>,
        D: AsRef<str>
    {
        let mut references: HashMap<String, Vec<String>> = Default::default();
        for (barcode, document) in documents {
            let barcode: String = barcode.into();
            let metadata: BarcodeMetadata = serde_json::from_str(document.as_ref())
                .map_err(|e| BarcodeError::InvalidMappingConfiguration(format!("metadata for \"{barcode}\": {e}")))?;
            if references.contains_key(&barcode) {
                return Err(BarcodeError::InvalidMappingConfiguration(format!("multiple metadata documents for \"{barcode}\"")));
            }
            references.insert(barcode, metadata.traces);
        }
        Ok(MetadataFileMapper { references })
    }

    /// Returns the trace references for a barcode
    pub fn references(&self, barcode: &str) -> Option<&[String]> {
        self.references.get(barcode).map(|r| r.as_slice())
    }
}

impl TraceMapper for MetadataFileMapper {
    fn map(&self, barcodes: &[QualitySequence], traces: &[QualitySequence]) -> Result<Association> {
        let trace_names: HashSet<&str> = traces.iter().map(|t| t.name()).collect();

        let mut association = Association::default();
        for barcode in barcodes.iter() {
            let Some(references) = self.references.get(barcode.name()) else {
                debug!("Barcode \"{}\" has no metadata", barcode.name());
                continue;
            };
            for r in references.iter() {
                if trace_names.contains(r.as_str()) {
                    association.insert(barcode.name(), r);
                } else {
                    debug!("Barcode \"{}\" references unknown trace \"{r}\"", barcode.name());
                }
            }
        }
        Ok(association)
    }
}
