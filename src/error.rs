use thiserror::Error;

/// Integrity violations in a maqam catalog. Any of these makes every score
/// computed against the catalog meaningless.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("catalog has no templates")]
    Empty,

    #[error("duplicate template id: {0}")]
    DuplicateId(String),

    #[error("template {id}: needs at least 2 intervals, found {found}")]
    TooFewIntervals { id: String, found: usize },

    #[error("template {id}: first interval must be 0 cents, found {found}")]
    MissingRoot { id: String, found: f64 },

    #[error("template {id}: last interval must be 1200 cents, found {found}")]
    MissingOctave { id: String, found: f64 },

    #[error("template {id}: intervals not strictly increasing at index {index}")]
    NotIncreasing { id: String, index: usize },

    #[error("template {id}: characteristic interval {cents} is not in the scale")]
    CharacteristicNotInScale { id: String, cents: f64 },

    #[error("template {id}: {field} of {cents} cents is outside 0..=1200")]
    OutOfRange {
        id: String,
        field: &'static str,
        cents: f64,
    },

    #[error("template {id}: dominant region [{lo}, {hi}] is inverted")]
    InvertedRegion { id: String, lo: f64, hi: f64 },
}

/// Bad caller input at the analysis entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("unknown grid subdivision: {0} (expected 1/4, 1/8, 1/16 or 1/32)")]
    UnknownGrid(String),

    #[error("unknown maqam template: {0}")]
    UnknownTemplate(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("tempo must be positive, got {0}")]
    InvalidTempo(f64),

    #[error("unknown scale direction: {0}")]
    UnknownDirection(String),
}
