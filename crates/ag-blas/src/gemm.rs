use std::marker::PhantomData;

use log::{debug, trace};

use crate::backend::{ColumnMajorCall, DataType, EntryPoint, GemmAlgo, MixedTypes, Operation};
use crate::context::DeviceContext;
use crate::dispatch::Int8Route;
use crate::error::{BlasError, Result};
use crate::handle::BlasHandle;

/// Shape and transpose configuration of a row-major GEMM
/// `C[m x n] = alpha * op(A)[m x k] * op(B)[k x n] + beta * C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GemmConfig {
    m: usize,
    n: usize,
    k: usize,
    trans_a: bool,
    trans_b: bool,
    lda: usize,
    ldb: usize,
    ldc: usize,
    op_a: Operation,
    op_b: Operation,
}

impl GemmConfig {
    /// Derives leading dimensions and backend transpose flags.
    ///
    /// Leading dimensions are row strides of the row-major operands as
    /// stored: A is `m x k` (or `k x m` when transposed), B is `k x n` (or
    /// `n x k`), C is `m x n`.
    pub fn new(trans_a: bool, trans_b: bool, m: usize, n: usize, k: usize) -> Self {
        GemmConfig {
            m,
            n,
            k,
            trans_a,
            trans_b,
            lda: if trans_a { m } else { k },
            ldb: if trans_b { k } else { n },
            ldc: n,
            op_a: Operation::from_flag(trans_a),
            op_b: Operation::from_flag(trans_b),
        }
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn trans_a(&self) -> bool {
        self.trans_a
    }

    pub fn trans_b(&self) -> bool {
        self.trans_b
    }

    pub fn lda(&self) -> usize {
        self.lda
    }

    pub fn ldb(&self) -> usize {
        self.ldb
    }

    pub fn ldc(&self) -> usize {
        self.ldc
    }

    pub fn op_a(&self) -> Operation {
        self.op_a
    }

    pub fn op_b(&self) -> Operation {
        self.op_b
    }

    /// Maps this row-major problem onto a column-major backend call.
    ///
    /// A row-major matrix read column-major is its transpose, so
    /// `C^T = op(B)^T * op(A)^T` is issued instead: B goes first with `op_b`
    /// and `ldb`, A second with `op_a` and `lda`, and the row/column counts
    /// become `n`/`m`. The transpose flags are not inverted. The column-major
    /// `n x m` result occupies memory exactly like the row-major `m x n` C.
    pub fn column_major_call<'a, T>(
        &self,
        alpha: f32,
        beta: f32,
        a: &'a [T],
        b: &'a [T],
    ) -> ColumnMajorCall<'a, T> {
        ColumnMajorCall {
            op_a: self.op_b,
            op_b: self.op_a,
            m: self.n,
            n: self.m,
            k: self.k,
            alpha,
            a: b,
            lda: self.ldb,
            b: a,
            ldb: self.lda,
            beta,
            ldc: self.ldc,
        }
    }

    fn check_buffers(&self, a_len: usize, b_len: usize, c_len: usize) -> Result<()> {
        for (operand, needed, got) in [
            ("a", self.m * self.k, a_len),
            ("b", self.k * self.n, b_len),
            ("c", self.m * self.n, c_len),
        ] {
            if got < needed {
                return Err(BlasError::BufferTooSmall {
                    operand,
                    needed,
                    got,
                });
            }
        }
        Ok(())
    }
}

/// Input element types the engine can multiply, paired with the output type.
///
/// Each implementation picks the backend entry point for its precision.
pub trait GemmElement<Out>: Copy + Send + Sync + 'static {
    /// Issues exactly one backend GEMM call and returns the entry point used.
    fn launch(
        ctx: &DeviceContext,
        handle: &BlasHandle,
        call: &ColumnMajorCall<'_, Self>,
        c: &mut [Out],
    ) -> Result<EntryPoint>;
}

impl GemmElement<f32> for f32 {
    fn launch(
        _ctx: &DeviceContext,
        handle: &BlasHandle,
        call: &ColumnMajorCall<'_, f32>,
        c: &mut [f32],
    ) -> Result<EntryPoint> {
        handle.backend().sgemm(handle.raw(), call, c)?;
        Ok(EntryPoint::Sgemm)
    }
}

impl GemmElement<f32> for i8 {
    fn launch(
        ctx: &DeviceContext,
        handle: &BlasHandle,
        call: &ColumnMajorCall<'_, i8>,
        c: &mut [f32],
    ) -> Result<EntryPoint> {
        let backend = handle.backend();
        let capability = ctx.capability()?;
        let route = ctx.dispatch().int8_route(capability, backend.toolchain());
        trace!("int8 gemm on capability {} routed to {}", capability, route.entry());
        match route {
            Int8Route::GemmEx => backend.gemm_ex(
                handle.raw(),
                call,
                MixedTypes::I8_I8_F32,
                DataType::R32F,
                GemmAlgo::Default,
                c,
            )?,
            Int8Route::SgemmEx => {
                backend.sgemm_ex(handle.raw(), call, MixedTypes::I8_I8_F32, c)?
            }
        }
        Ok(route.entry())
    }
}

/// A GEMM engine for one precision pair, owning its backend handle.
///
/// `init` configures shape and transposes (creating the handle on first
/// use); `run` multiplies row-major buffers with that configuration.
#[derive(Debug)]
pub struct Gemm<T, Out> {
    handle: Option<BlasHandle>,
    config: GemmConfig,
    init_count: usize,
    _marker: PhantomData<fn(&[T]) -> Out>,
}

/// f32 x f32 -> f32.
pub type SgemmEngine = Gemm<f32, f32>;

/// i8 x i8 -> f32, accumulated in f32.
pub type Int8GemmEngine = Gemm<i8, f32>;

impl<T: GemmElement<Out>, Out> Gemm<T, Out> {
    pub fn new() -> Self {
        Gemm {
            handle: None,
            config: GemmConfig::default(),
            init_count: 0,
            _marker: PhantomData,
        }
    }

    /// Configures the engine for an `m x k` by `k x n` product.
    ///
    /// The first call creates the backend handle and binds it to the
    /// context's execution stream; later calls only recompute the derived
    /// configuration.
    pub fn init(
        &mut self,
        trans_a: bool,
        trans_b: bool,
        m: usize,
        n: usize,
        k: usize,
        ctx: &DeviceContext,
    ) -> Result<()> {
        if self.handle.is_none() {
            self.handle = Some(BlasHandle::create(ctx)?);
        }
        self.config = GemmConfig::new(trans_a, trans_b, m, n, k);
        self.init_count += 1;
        debug!(
            "gemm configured: m={} n={} k={} trans_a={} trans_b={}",
            m, n, k, trans_a, trans_b
        );
        Ok(())
    }

    /// Computes `C = alpha * op(A) * op(B) + beta * C` on the bound stream.
    ///
    /// All buffers are row-major. With `beta == 0` the prior contents of `c`
    /// are never read.
    pub fn run(
        &self,
        alpha: f32,
        beta: f32,
        a: &[T],
        b: &[T],
        c: &mut [Out],
        ctx: &DeviceContext,
    ) -> Result<()> {
        let handle = self.handle.as_ref().ok_or(BlasError::NotInitialized)?;
        self.config.check_buffers(a.len(), b.len(), c.len())?;
        let call = self.config.column_major_call(alpha, beta, a, b);
        let entry = T::launch(ctx, handle, &call, c)?;
        trace!(
            "gemm {}x{}x{} enqueued via {} on stream {:?} (alpha={}, beta={})",
            self.config.m,
            self.config.n,
            self.config.k,
            entry,
            handle.stream(),
            alpha,
            beta
        );
        Ok(())
    }

    pub fn config(&self) -> &GemmConfig {
        &self.config
    }

    /// Number of successful `init` calls.
    pub fn init_count(&self) -> usize {
        self.init_count
    }

    pub fn handle(&self) -> Option<&BlasHandle> {
        self.handle.as_ref()
    }
}

impl<T: GemmElement<Out>, Out> Default for Gemm<T, Out> {
    fn default() -> Self {
        Self::new()
    }
}
