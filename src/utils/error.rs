use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailError {
    #[error("Domain error: {field} = {value} violates {constraint}")]
    DomainError {
        field: String,
        value: String,
        constraint: String,
    },

    #[error(
        "Precision error: {digits} decimal digits cannot resolve {quantity} (resolution {resolution:e})"
    )]
    PrecisionError {
        digits: u32,
        quantity: String,
        resolution: f64,
    },

    #[error(
        "Consistency error: cached harmonic sum {cached} disagrees with recomputed {recomputed} (tolerance {tolerance:e})"
    )]
    ConsistencyError {
        cached: f64,
        recomputed: f64,
        tolerance: f64,
    },

    #[error("Missing envelope data for modulus q={modulus}")]
    MissingDataError { modulus: u64 },

    #[error("Configuration error: {field}: {message}")]
    ConfigError { field: String, message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TailError {
    pub fn domain(field: &str, value: impl ToString, constraint: &str) -> Self {
        TailError::DomainError {
            field: field.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }

    /// Engine errors always exit 3; codes 0/1/2 are reserved for the
    /// Pass/Fail/Indeterminate verdicts.
    pub fn exit_code(&self) -> i32 {
        3
    }
}

pub type Result<T> = std::result::Result<T, TailError>;
