//! `ag-blas` - GEMM engine over a vendor BLAS backend.
//!
//! This crate provides:
//! - A `BlasBackend` trait describing the vendor library surface
//! - `BlasHandle`, an owned library session bound to one execution stream
//! - `DeviceContext` with a cached compute-capability query
//! - `DispatchTable`, the capability-gated choice of int8 entry point
//! - `Gemm<T, Out>`, the row-major GEMM engine for f32 and i8 inputs
//! - A reference `CpuBlas` backend implementing the column-major contract

pub mod backend;
pub mod capability;
pub mod context;
pub mod cpu;
pub mod dispatch;
pub mod error;
pub mod gemm;
pub mod handle;

// Re-export primary types at the crate root for convenience.
pub use backend::{
    BlasBackend, ColumnMajorCall, DataType, EntryPoint, GemmAlgo, MixedTypes, Operation,
    RawHandle, StreamId, ToolchainVersion,
};
pub use capability::ComputeCapability;
pub use context::DeviceContext;
pub use cpu::CpuBlas;
pub use dispatch::{DispatchTable, Int8Route, Int8Rule};
pub use error::{BlasError, BlasStatus, Result};
pub use gemm::{Gemm, GemmConfig, GemmElement, Int8GemmEngine, SgemmEngine};
pub use handle::BlasHandle;
