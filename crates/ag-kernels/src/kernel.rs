use std::fmt;

use ag_blas::DeviceContext;
use ag_tensor::DType;

use crate::error::Result;

/// Memory space a kernel's tensors live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Cuda,
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Target::Cuda => "cuda",
        }
    }
}

/// Precision class a kernel is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Float,
    Int8,
}

impl Precision {
    pub fn name(&self) -> &'static str {
        match self {
            Precision::Float => "float",
            Precision::Int8 => "int8",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLayout {
    Nchw,
}

impl DataLayout {
    pub fn name(&self) -> &'static str {
        match self {
            DataLayout::Nchw => "nchw",
        }
    }
}

/// A named kernel input or output and its element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TensorSlot {
    pub name: &'static str,
    pub dtype: DType,
}

/// Registration metadata for a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelDescriptor {
    pub op: &'static str,
    pub target: Target,
    pub precision: Precision,
    pub layout: DataLayout,
    pub alias: &'static str,
    pub inputs: &'static [TensorSlot],
    pub outputs: &'static [TensorSlot],
}

impl fmt::Display for KernelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.op,
            self.target.name(),
            self.precision.name(),
            self.layout.name(),
            self.alias
        )
    }
}

/// A kernel with a one-time setup step and a per-invocation step.
pub trait Kernel {
    /// Operands and attributes the kernel consumes.
    type Param<'a>;

    fn descriptor(&self) -> &'static KernelDescriptor;

    /// One-time setup before the first `run`.
    fn prepare(&mut self, ctx: &DeviceContext, param: &Self::Param<'_>) -> Result<()>;

    /// Enqueues one invocation on the context's execution stream.
    fn run(&mut self, ctx: &DeviceContext, param: &mut Self::Param<'_>) -> Result<()>;
}
