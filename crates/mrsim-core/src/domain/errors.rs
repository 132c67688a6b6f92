pub type SimResult<T> = Result<T, SimError>;

/// Fatal configuration and precondition violations surfaced at the public
/// entry. Out-of-grid sideband offsets and sub-threshold rotor rates are
/// designed limits, not errors, and never appear here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("integration density must be at least 1, got {density}")]
    InvalidIntegrationDensity { density: usize },
    #[error("number of sidebands must be at least 1, got {count}")]
    InvalidSidebandCount { count: usize },
    #[error("only 1 or 2 spectral dimensions are supported, got {count}")]
    UnsupportedDimensionCount { count: usize },
    #[error("spectral dimension {index} must have a positive point count")]
    EmptyDimensionGrid { index: usize },
    #[error("spectral dimension {index} has a non-finite or zero increment ({increment})")]
    InvalidDimensionIncrement { index: usize, increment: f64 },
    #[error("spectral dimension {index} must contain at least one event")]
    EmptyEventList { index: usize },
    #[error("output buffer length {actual} does not match the spectral grid size {expected}")]
    OutputBufferMismatch { expected: usize, actual: usize },
    #[error("spin system must contain at least one site")]
    EmptySpinSystem,
    #[error("coupling {coupling} references site {site} outside the {site_count}-site system")]
    CouplingSiteOutOfRange {
        coupling: usize,
        site: usize,
        site_count: usize,
    },
    #[error(
        "transition buffer length {actual} does not match {expected} \
         (2 x number of sites x total events)"
    )]
    TransitionBufferMismatch { expected: usize, actual: usize },
    #[error("fourth-rank rotation requested from a scheme built without fourth-rank tables")]
    FourthRankTablesUnavailable,
}
