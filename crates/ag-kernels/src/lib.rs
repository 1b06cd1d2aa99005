//! `ag-kernels` - `mul` operator kernels for accel-gemm.
//!
//! `mul` flattens X and Y to matrices (splitting each at its
//! `num_col_dims`) and multiplies them on the accelerator. Two precisions are
//! provided: f32, and int8 inputs with an f32 output rescaled by the product
//! of the input and weight quantization scales. Both kernels re-initialize
//! their GEMM engine only when the flattened problem size changes.

pub mod error;
pub mod kernel;
pub mod mul;
pub mod param;

pub use error::{KernelError, Result};
pub use kernel::{DataLayout, Kernel, KernelDescriptor, Precision, Target, TensorSlot};
pub use mul::{GemmShape, MulCompute, MulComputeInt8, MulKernel, MulShape, MUL_FLOAT, MUL_INT8};
pub use param::{MulAttrs, MulParam};
