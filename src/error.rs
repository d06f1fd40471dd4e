//! Error types for the MDoF vibration solver.
//!
//! This module provides a unified error type [`MdofError`] that covers
//! all error conditions that can occur while validating a system, decomposing
//! it into modes, integrating the modal equations, and exporting results.

use thiserror::Error;

/// Result type alias using [`MdofError`].
pub type Result<T> = std::result::Result<T, MdofError>;

/// Broad classification of an [`MdofError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, detected before any numerical work.
    Configuration,
    /// Numerically invalid intermediate result.
    Domain,
    /// Reading a system description or writing a response failed.
    Io,
}

/// Unified error type for all MDoF operations.
#[derive(Error, Debug)]
pub enum MdofError {
    // ============ Configuration Errors ============
    /// A matrix or vector does not have the expected dimension
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A matrix is not square (or has ragged rows)
    #[error("{what} must be square, got {rows}x{cols}")]
    NotSquare {
        what: &'static str,
        rows: usize,
        cols: usize,
    },

    /// Mass matrix has a non-zero off-diagonal entry
    #[error("Mass matrix must be diagonal: entry ({row}, {col}) is {value}")]
    NonDiagonalMass { row: usize, col: usize, value: f64 },

    /// Mass matrix has a zero or negative diagonal entry
    #[error("Mass {index} must be positive, got {value}")]
    NonPositiveMass { index: usize, value: f64 },

    /// An input value is NaN or infinite
    #[error("Input {what} contains a non-finite value")]
    NonFiniteInput { what: &'static str },

    /// System has no degrees of freedom
    #[error("System has no degrees of freedom")]
    EmptySystem,

    /// Simulation horizon is not a positive finite number
    #[error("Simulation horizon must be positive and finite, got {horizon}")]
    InvalidHorizon { horizon: f64 },

    /// Invalid solver parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    // ============ Domain Errors ============
    /// Square root of a negative diagonal entry
    #[error("Negative value {value:.6e} under square root at diagonal {index} ({stage})")]
    NegativeSqrt {
        stage: &'static str,
        index: usize,
        value: f64,
    },

    /// A matrix required to be symmetric is not
    #[error("Matrix is not symmetric at ({row}, {col}) in {stage} (deviation: {deviation:.2e})")]
    AsymmetricMatrix {
        stage: &'static str,
        row: usize,
        col: usize,
        deviation: f64,
    },

    /// The stiffness operator has a negative eigenvalue (unstable system)
    #[error("Mode {mode} has negative eigenvalue {value:.6e} - system is unstable")]
    NegativeEigenvalue { mode: usize, value: f64 },

    /// A NaN or infinity was produced during computation
    #[error("Non-finite value produced during {stage}")]
    NonFinite { stage: &'static str },

    // ============ I/O Errors ============
    /// Error reading a system description file
    #[error("Failed to read system file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// System description could not be decoded
    #[error("Invalid system description: {message}")]
    InputFormatError { message: String },

    /// Error writing the response
    #[error("Output error: {message}")]
    OutputError { message: String },

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl MdofError {
    /// Create a dimension mismatch error
    pub fn dimension(what: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            found,
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidSimulationParam {
            message: message.into(),
        }
    }

    /// Create a non-finite result error for the given stage
    pub fn non_finite(stage: &'static str) -> Self {
        Self::NonFinite { stage }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DimensionMismatch { .. }
            | Self::NotSquare { .. }
            | Self::NonDiagonalMass { .. }
            | Self::NonPositiveMass { .. }
            | Self::NonFiniteInput { .. }
            | Self::EmptySystem
            | Self::InvalidHorizon { .. }
            | Self::InvalidSimulationParam { .. } => ErrorKind::Configuration,

            Self::NegativeSqrt { .. }
            | Self::AsymmetricMatrix { .. }
            | Self::NegativeEigenvalue { .. }
            | Self::NonFinite { .. } => ErrorKind::Domain,

            Self::FileReadError { .. } | Self::InputFormatError { .. } | Self::OutputError { .. } => {
                ErrorKind::Io
            }

            #[cfg(feature = "wasm")]
            Self::WasmError { .. } => ErrorKind::Io,
        }
    }

    /// True for malformed-input errors.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// True for numerically invalid intermediate results.
    pub fn is_domain(&self) -> bool {
        self.kind() == ErrorKind::Domain
    }
}
