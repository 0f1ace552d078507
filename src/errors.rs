/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, BarcodeError>;

/// All of the typed failures the validation core can report.
/// None of these are retried internally, and a failed call never returns a partial result.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BarcodeError {
    /// Malformed numeric parameters or inconsistent input values
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Quality was required but the named sequence does not carry any
    #[error("Sequence \"{name}\" does not have quality values")]
    MissingQuality {
        name: String
    },

    /// The alphabet has no symbol that can represent a tie between these symbols
    #[error("No ambiguity symbol covers the tied symbols \"{symbols}\"")]
    NoAmbiguitySymbol {
        symbols: String
    },

    /// Malformed pattern, list file, or metadata configuration
    #[error("Invalid mapping configuration: {0}")]
    InvalidMappingConfiguration(String)
}
