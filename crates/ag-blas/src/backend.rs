use std::fmt::{self, Debug};

use crate::capability::ComputeCapability;
use crate::error::Result;

/// Opaque identifier of a backend handle (a BLAS library session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

/// Opaque identifier of an execution stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

/// Backend-facing transpose flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operation {
    #[default]
    NoTranspose,
    Transpose,
}

impl Operation {
    /// Translates a logical transpose flag.
    pub fn from_flag(transpose: bool) -> Self {
        if transpose {
            Operation::Transpose
        } else {
            Operation::NoTranspose
        }
    }
}

/// Element type tags passed to the mixed-precision entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Signed 8-bit integer, real.
    R8I,
    /// 32-bit float, real.
    R32F,
}

/// Algorithm selector for `gemm_ex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GemmAlgo {
    #[default]
    Default,
}

/// Storage types of the A, B and C operands of a mixed-precision call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MixedTypes {
    pub a: DataType,
    pub b: DataType,
    pub c: DataType,
}

impl MixedTypes {
    /// i8 x i8 -> f32.
    pub const I8_I8_F32: MixedTypes = MixedTypes {
        a: DataType::R8I,
        b: DataType::R8I,
        c: DataType::R32F,
    };
}

/// Backend calls the engine can issue. Used for error reporting and for the
/// host backend's call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    DeviceQuery,
    CreateStream,
    Synchronize,
    CreateHandle,
    DestroyHandle,
    SetStream,
    Sgemm,
    GemmEx,
    SgemmEx,
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryPoint::DeviceQuery => "device_query",
            EntryPoint::CreateStream => "create_stream",
            EntryPoint::Synchronize => "synchronize",
            EntryPoint::CreateHandle => "create_handle",
            EntryPoint::DestroyHandle => "destroy_handle",
            EntryPoint::SetStream => "set_stream",
            EntryPoint::Sgemm => "sgemm",
            EntryPoint::GemmEx => "gemm_ex",
            EntryPoint::SgemmEx => "sgemm_ex",
        };
        write!(f, "{}", s)
    }
}

/// Version of the toolchain the backend library was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToolchainVersion {
    pub major: u32,
    pub minor: u32,
}

impl ToolchainVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        ToolchainVersion { major, minor }
    }
}

/// Arguments of one column-major GEMM call:
/// `C[m x n] = alpha * op_a(A)[m x k] * op_b(B)[k x n] + beta * C`.
///
/// Built from a row-major `GemmConfig` by `GemmConfig::column_major_call`,
/// never by hand.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMajorCall<'a, T> {
    pub op_a: Operation,
    pub op_b: Operation,
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub alpha: f32,
    pub a: &'a [T],
    pub lda: usize,
    pub b: &'a [T],
    pub ldb: usize,
    pub beta: f32,
    pub ldc: usize,
}

/// A vendor BLAS library bound to an accelerator.
///
/// Mirrors the subset of the library surface the GEMM engine needs. Every
/// method maps a non-success status to `BlasError::Status`. Matrix operands
/// are column-major; GEMM calls enqueue work on the stream bound to the
/// handle and return without waiting for it.
pub trait BlasBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu", "cuda").
    fn name(&self) -> &str;

    /// Toolchain version the library was built with.
    fn toolchain(&self) -> ToolchainVersion;

    /// Queries the compute capability of a device.
    fn device_capability(&self, device_id: usize) -> Result<ComputeCapability>;

    /// Creates a new execution stream on a device.
    fn create_stream(&self, device_id: usize) -> Result<StreamId>;

    /// Blocks until all work enqueued on `stream` has completed.
    fn synchronize(&self, stream: StreamId) -> Result<()>;

    /// Creates a library handle.
    fn create_handle(&self) -> Result<RawHandle>;

    /// Releases a library handle.
    fn destroy_handle(&self, handle: RawHandle) -> Result<()>;

    /// Binds a handle to an execution stream.
    fn set_stream(&self, handle: RawHandle, stream: StreamId) -> Result<()>;

    /// f32 x f32 -> f32 GEMM.
    fn sgemm(&self, handle: RawHandle, call: &ColumnMajorCall<'_, f32>, c: &mut [f32])
        -> Result<()>;

    /// Extended GEMM with explicit storage and compute types.
    fn gemm_ex(
        &self,
        handle: RawHandle,
        call: &ColumnMajorCall<'_, i8>,
        types: MixedTypes,
        compute: DataType,
        algo: GemmAlgo,
        c: &mut [f32],
    ) -> Result<()>;

    /// Extended single-precision GEMM: mixed storage types, f32 compute.
    fn sgemm_ex(
        &self,
        handle: RawHandle,
        call: &ColumnMajorCall<'_, i8>,
        types: MixedTypes,
        c: &mut [f32],
    ) -> Result<()>;
}
