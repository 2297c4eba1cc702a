//! Error types shared by every stage of the pipeline.
//!
//! Raised errors fall into two classes (see [`ErrorKind`]):
//!
//! - **Configuration**: the caller asked for something impossible
//!   (bad bounds, unknown strategy, invalid cover). Never retried.
//! - **Data**: the inputs cannot support the request (missing columns,
//!   too few points, malformed dataset). Carries the sample id / column
//!   needed to repair the upstream data.
//!
//! Numerical degeneracy is not an error. It is attached to results as
//! [`Diagnostic`](crate::Diagnostic) values.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Data,
}

#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    #[error("parameter '{0}' is already defined (or is a reserved column name)")]
    DuplicateName(String),

    #[error("parameter '{name}' has invalid bounds [{lower}, {upper}]")]
    InvalidBounds { name: String, lower: f64, upper: f64 },

    #[error("unknown sampling strategy '{0}'")]
    UnknownStrategy(String),

    #[error("invalid sample count {0}: must be positive")]
    InvalidSampleCount(i64),

    #[error("strategy '{strategy}' supports at most {max} dimensions, got {requested}")]
    UnsupportedDimension {
        strategy: String,
        max: usize,
        requested: usize,
    },

    #[error("invalid cover: {0}")]
    InvalidCover(String),

    #[error("max homology dimension {max_dimension} must be below the point count {points}")]
    InvalidDimension { max_dimension: usize, points: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Data errors
    #[error("value {value} for parameter '{parameter}' is outside [{lower}, {upper}]")]
    OutOfBounds {
        parameter: String,
        value: f64,
        lower: f64,
        upper: f64,
    },

    #[error("point has {actual} coordinates, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("column '{0}' is neither a parameter nor a metric of the dataset")]
    MissingColumn(String),

    #[error("need at least {required} points, got {actual}")]
    InsufficientPoints { required: usize, actual: usize },

    #[error("sample id {0} is not part of the design")]
    UnknownSample(usize),

    #[error("malformed dataset at line {line}: {message}")]
    MalformedDataset { line: usize, message: String },

    #[error("invalid lens: {0}")]
    InvalidLens(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DuplicateName(_)
            | Error::InvalidBounds { .. }
            | Error::UnknownStrategy(_)
            | Error::InvalidSampleCount(_)
            | Error::UnsupportedDimension { .. }
            | Error::InvalidCover(_)
            | Error::InvalidDimension { .. }
            | Error::InvalidConfig(_) => ErrorKind::Configuration,
            Error::OutOfBounds { .. }
            | Error::DimensionMismatch { .. }
            | Error::MissingColumn(_)
            | Error::InsufficientPoints { .. }
            | Error::UnknownSample(_)
            | Error::MalformedDataset { .. }
            | Error::InvalidLens(_)
            | Error::Io(_)
            | Error::Json(_) => ErrorKind::Data,
        }
    }
}
