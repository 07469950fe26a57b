//! Domain-specific error types following panic-free policy.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in domain operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid field value
    #[error("Invalid {field}: {value} (expected {expected})")]
    InvalidFieldValue {
        field: String,
        value: String,
        expected: String,
    },

    /// Parse error for incoming data
    #[error("Failed to parse {field}: {reason}")]
    ParseError { field: String, reason: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors raised by a temperature sensor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    /// The ADC attribute could not be read
    #[error("Failed to read ADC at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// The ADC attribute did not contain an integer sample
    #[error("Malformed ADC sample at {path}: {content:?}")]
    Malformed { path: PathBuf, content: String },

    /// The raw sample cannot be converted (open or shorted thermistor)
    #[error("ADC sample {raw} outside convertible range 1..{max}")]
    OutOfRange { raw: u32, max: u32 },
}
