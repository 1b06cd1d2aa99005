use ag_blas::{DeviceContext, Gemm, GemmElement, Int8GemmEngine, SgemmEngine};
use ag_tensor::{DType, Shape};
use log::debug;

use crate::error::{KernelError, Result};
use crate::kernel::{DataLayout, Kernel, KernelDescriptor, Precision, Target, TensorSlot};
use crate::param::{MulAttrs, MulParam};

pub static MUL_FLOAT: KernelDescriptor = KernelDescriptor {
    op: "mul",
    target: Target::Cuda,
    precision: Precision::Float,
    layout: DataLayout::Nchw,
    alias: "def",
    inputs: &[
        TensorSlot {
            name: "X",
            dtype: DType::F32,
        },
        TensorSlot {
            name: "Y",
            dtype: DType::F32,
        },
    ],
    outputs: &[TensorSlot {
        name: "Out",
        dtype: DType::F32,
    }],
};

pub static MUL_INT8: KernelDescriptor = KernelDescriptor {
    op: "mul",
    target: Target::Cuda,
    precision: Precision::Int8,
    layout: DataLayout::Nchw,
    alias: "def",
    inputs: &[
        TensorSlot {
            name: "X",
            dtype: DType::I8,
        },
        TensorSlot {
            name: "Y",
            dtype: DType::I8,
        },
    ],
    outputs: &[TensorSlot {
        name: "Out",
        dtype: DType::F32,
    }],
};

/// The 2-D view of X and Y after splitting each at its `num_col_dims`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulShape {
    pub x_h: usize,
    pub x_w: usize,
    pub y_h: usize,
    pub y_w: usize,
}

impl MulShape {
    pub fn resolve(x: &Shape, y: &Shape, attrs: &MulAttrs) -> Result<Self> {
        let (x_h, x_w) = x.flatten_to_2d(attrs.x_num_col_dims)?;
        let (y_h, y_w) = y.flatten_to_2d(attrs.y_num_col_dims)?;
        Ok(MulShape { x_h, x_w, y_h, y_w })
    }

    /// X's column count must equal Y's row count.
    pub fn check_contraction(&self) -> Result<()> {
        if self.x_w != self.y_h {
            return Err(KernelError::ContractionMismatch {
                x_w: self.x_w,
                y_h: self.y_h,
            });
        }
        Ok(())
    }

    pub fn gemm_shape(&self) -> GemmShape {
        GemmShape {
            m: self.x_h,
            n: self.y_w,
            k: self.y_h,
        }
    }
}

/// Problem size a GEMM engine is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GemmShape {
    pub m: usize,
    pub n: usize,
    pub k: usize,
}

/// A GEMM engine and the shape it was last configured with.
///
/// `shape` is only updated after `init` succeeds, so it always matches the
/// engine's configuration.
#[derive(Debug)]
struct CachedGemm<T, Out> {
    gemm: Gemm<T, Out>,
    shape: Option<GemmShape>,
}

impl<T: GemmElement<Out>, Out> CachedGemm<T, Out> {
    fn new() -> Self {
        CachedGemm {
            gemm: Gemm::new(),
            shape: None,
        }
    }

    /// Re-initializes the engine only when `shape` differs from the cache.
    fn configure(&mut self, shape: GemmShape, ctx: &DeviceContext) -> Result<()> {
        if self.shape == Some(shape) {
            return Ok(());
        }
        self.gemm.init(false, false, shape.m, shape.n, shape.k, ctx)?;
        if let Some(previous) = self.shape {
            debug!("mul shape changed {:?} -> {:?}", previous, shape);
        }
        self.shape = Some(shape);
        Ok(())
    }
}

/// f32 `mul`: `Out = flatten(X) * flatten(Y)`.
#[derive(Debug)]
pub struct MulCompute {
    inner: CachedGemm<f32, f32>,
}

impl MulCompute {
    pub fn new() -> Self {
        MulCompute {
            inner: CachedGemm::new(),
        }
    }

    pub fn gemm(&self) -> &SgemmEngine {
        &self.inner.gemm
    }

    pub fn cached_shape(&self) -> Option<GemmShape> {
        self.inner.shape
    }
}

impl Default for MulCompute {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for MulCompute {
    type Param<'a> = MulParam<'a>;

    fn descriptor(&self) -> &'static KernelDescriptor {
        &MUL_FLOAT
    }

    fn prepare(&mut self, ctx: &DeviceContext, param: &MulParam<'_>) -> Result<()> {
        let shape = MulShape::resolve(param.x.shape(), param.y.shape(), &param.attrs)?;
        self.inner.configure(shape.gemm_shape(), ctx)
    }

    fn run(&mut self, ctx: &DeviceContext, param: &mut MulParam<'_>) -> Result<()> {
        param.x.expect_dtype("X", DType::F32)?;
        param.y.expect_dtype("Y", DType::F32)?;
        let shape = MulShape::resolve(param.x.shape(), param.y.shape(), &param.attrs)?;
        shape.check_contraction()?;
        let out_shape = param.output_shape()?;

        self.inner.configure(shape.gemm_shape(), ctx)?;

        let x = param.x.data::<f32>()?;
        let y = param.y.data::<f32>()?;
        param.output.resize(out_shape);
        let out = param.output.mutable_data::<f32>();
        self.inner.gemm.run(1.0, 0.0, x, y, out, ctx)?;
        Ok(())
    }
}

/// Quantized `mul`: i8 X and Y, f32 output scaled by
/// `input_scale * weight_scale[0]`.
#[derive(Debug)]
pub struct MulComputeInt8 {
    inner: CachedGemm<i8, f32>,
}

impl MulComputeInt8 {
    pub fn new() -> Self {
        MulComputeInt8 {
            inner: CachedGemm::new(),
        }
    }

    pub fn gemm(&self) -> &Int8GemmEngine {
        &self.inner.gemm
    }

    pub fn cached_shape(&self) -> Option<GemmShape> {
        self.inner.shape
    }

    /// Combined dequantization multiplier. Only per-tensor weight scales are
    /// supported.
    pub fn alpha(attrs: &MulAttrs) -> Result<f32> {
        match attrs.weight_scale.as_slice() {
            [weight_scale] => Ok(attrs.input_scale * weight_scale),
            other => Err(KernelError::WeightScaleCount(other.len())),
        }
    }
}

impl Default for MulComputeInt8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for MulComputeInt8 {
    type Param<'a> = MulParam<'a>;

    fn descriptor(&self) -> &'static KernelDescriptor {
        &MUL_INT8
    }

    fn prepare(&mut self, ctx: &DeviceContext, param: &MulParam<'_>) -> Result<()> {
        let shape = MulShape::resolve(param.x.shape(), param.y.shape(), &param.attrs)?;
        self.inner.configure(shape.gemm_shape(), ctx)
    }

    fn run(&mut self, ctx: &DeviceContext, param: &mut MulParam<'_>) -> Result<()> {
        param.x.expect_dtype("X", DType::I8)?;
        param.y.expect_dtype("Y", DType::I8)?;
        let shape = MulShape::resolve(param.x.shape(), param.y.shape(), &param.attrs)?;
        shape.check_contraction()?;
        let alpha = Self::alpha(&param.attrs)?;
        let out_shape = param.output_shape()?;

        self.inner.configure(shape.gemm_shape(), ctx)?;

        let x = param.x.data::<i8>()?;
        let y = param.y.data::<i8>()?;
        param.output.resize(out_shape);
        let out = param.output.mutable_data::<f32>();
        self.inner.gemm.run(alpha, 0.0, x, y, out, ctx)?;
        Ok(())
    }
}

/// Picks the `mul` kernel matching `MulAttrs::enable_int8`.
#[derive(Debug)]
pub enum MulKernel {
    Float(MulCompute),
    Int8(MulComputeInt8),
}

impl MulKernel {
    pub fn for_attrs(attrs: &MulAttrs) -> Self {
        if attrs.enable_int8 {
            MulKernel::Int8(MulComputeInt8::new())
        } else {
            MulKernel::Float(MulCompute::new())
        }
    }
}

impl Kernel for MulKernel {
    type Param<'a> = MulParam<'a>;

    fn descriptor(&self) -> &'static KernelDescriptor {
        match self {
            MulKernel::Float(k) => k.descriptor(),
            MulKernel::Int8(k) => k.descriptor(),
        }
    }

    fn prepare(&mut self, ctx: &DeviceContext, param: &MulParam<'_>) -> Result<()> {
        match self {
            MulKernel::Float(k) => k.prepare(ctx, param),
            MulKernel::Int8(k) => k.prepare(ctx, param),
        }
    }

    fn run(&mut self, ctx: &DeviceContext, param: &mut MulParam<'_>) -> Result<()> {
        match self {
            MulKernel::Float(k) => k.run(ctx, param),
            MulKernel::Int8(k) => k.run(ctx, param),
        }
    }
}
