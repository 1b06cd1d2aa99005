use thiserror::Error;

use crate::dtype::DType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("dtype mismatch for {name}: expected {expected}, got {got}")]
    DTypeMismatch {
        name: String,
        expected: DType,
        got: DType,
    },
    #[error("invalid axis {axis} for tensor with {ndim} dimensions")]
    InvalidAxis { axis: usize, ndim: usize },
    #[error("invalid dimension range {start}..{end} for tensor with {ndim} dimensions")]
    InvalidRange { start: usize, end: usize, ndim: usize },
}

pub type Result<T> = std::result::Result<T, TensorError>;
