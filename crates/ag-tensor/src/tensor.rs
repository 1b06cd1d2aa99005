use crate::dtype::{DType, Element};
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A dense, contiguous, row-major tensor.
///
/// The element type is carried by the storage; typed access goes through
/// `data::<T>()` and `mutable_data::<T>()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
}

impl Tensor {
    /// Create a new f32 tensor from data and a shape.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn new(data: Vec<f32>, shape: Shape) -> Self {
        Self::from_vec(data, shape)
    }

    /// Create a tensor of any supported element type.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn from_vec<T: Element>(data: Vec<T>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {:?} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Tensor {
            storage: CpuStorage::from_vec(data),
            shape,
        }
    }

    /// Create a zero-filled tensor with the given shape and dtype.
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        Tensor {
            storage: CpuStorage::zeros(dtype, shape.numel()),
            shape,
        }
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Returns the elements as a typed slice.
    ///
    /// # Errors
    /// Returns `DTypeMismatch` if the storage does not hold `T`.
    pub fn data<T: Element>(&self) -> Result<&[T]> {
        T::slice(&self.storage).ok_or_else(|| TensorError::DTypeMismatch {
            name: "tensor".to_string(),
            expected: T::DTYPE,
            got: self.storage.dtype(),
        })
    }

    /// Returns the elements as a mutable typed slice, (re)allocating zeroed
    /// storage of type `T` when the current storage has another dtype or does
    /// not match the shape's element count.
    pub fn mutable_data<T: Element>(&mut self) -> &mut [T] {
        let numel = self.shape.numel();
        if self.storage.dtype() != T::DTYPE || self.storage.len() != numel {
            self.storage = CpuStorage::from_vec(vec![T::default(); numel]);
        }
        match T::slice_mut(&mut self.storage) {
            Some(slice) => slice,
            None => unreachable!("storage was just allocated as {}", T::DTYPE),
        }
    }

    /// Sets a new shape without touching storage. The next `mutable_data`
    /// call reallocates if the element count changed.
    pub fn resize(&mut self, shape: Shape) {
        self.shape = shape;
    }

    /// Fails with `DTypeMismatch` naming the operand if the dtype is not
    /// `expected`.
    pub fn expect_dtype(&self, name: &str, expected: DType) -> Result<()> {
        if self.dtype() != expected {
            return Err(TensorError::DTypeMismatch {
                name: name.to_string(),
                expected,
                got: self.dtype(),
            });
        }
        Ok(())
    }
}
