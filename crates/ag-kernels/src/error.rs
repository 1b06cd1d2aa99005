use ag_blas::BlasError;
use ag_tensor::TensorError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
    #[error("blas error: {0}")]
    Blas(#[from] BlasError),
    #[error("x_w ({x_w}) must be equal to y_h ({y_h})")]
    ContractionMismatch { x_w: usize, y_h: usize },
    #[error("int8 mul needs exactly one weight scale, got {0}")]
    WeightScaleCount(usize),
}

pub type Result<T> = std::result::Result<T, KernelError>;
