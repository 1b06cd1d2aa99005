use std::fmt;

use thiserror::Error;

use crate::backend::EntryPoint;

/// Non-success status codes reported by a BLAS backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlasStatus {
    /// The library or handle was not initialized.
    NotInitialized,
    /// Resource allocation failed inside the library.
    AllocFailed,
    /// An unsupported value or parameter was passed.
    InvalidValue,
    /// The function requires a feature absent from the device architecture.
    ArchMismatch,
    /// The GPU program failed to execute.
    ExecutionFailed,
    /// The requested type or operation combination is not supported.
    NotSupported,
    /// An internal library operation failed.
    InternalError,
}

impl fmt::Display for BlasStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BlasStatus::NotInitialized => "not initialized",
            BlasStatus::AllocFailed => "allocation failed",
            BlasStatus::InvalidValue => "invalid value",
            BlasStatus::ArchMismatch => "architecture mismatch",
            BlasStatus::ExecutionFailed => "execution failed",
            BlasStatus::NotSupported => "not supported",
            BlasStatus::InternalError => "internal error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlasError {
    #[error("{entry} failed: {status}")]
    Status { entry: EntryPoint, status: BlasStatus },
    #[error("gemm run before init: no backend handle")]
    NotInitialized,
    #[error("{operand} buffer too small: need {needed} elements, got {got}")]
    BufferTooSmall {
        operand: &'static str,
        needed: usize,
        got: usize,
    },
}

impl BlasError {
    /// Shorthand for a failed backend call.
    pub fn status(entry: EntryPoint, status: BlasStatus) -> Self {
        BlasError::Status { entry, status }
    }
}

pub type Result<T> = std::result::Result<T, BlasError>;
