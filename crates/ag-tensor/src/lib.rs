//! `ag-tensor` - Operand types for the accel-gemm kernels.
//!
//! This crate provides:
//! - A `Tensor` type over contiguous f32 or i8 storage
//! - Shape utilities, including the split-at-axis flattening used by `mul`
//! - Data type definitions and the `Element` trait for typed access

pub mod dtype;
pub mod error;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use dtype::{DType, Element};
pub use error::{Result, TensorError};
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
