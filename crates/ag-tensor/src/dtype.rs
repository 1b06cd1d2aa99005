use std::fmt;

use crate::storage::CpuStorage;

/// Supported element types for tensor storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point.
    F32,
    /// Signed 8-bit integer, the storage type of quantized operands.
    I8,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "f32"),
            DType::I8 => write!(f, "i8"),
        }
    }
}

/// A Rust scalar type that can live in a `CpuStorage`.
///
/// Used by `Tensor::data` and `Tensor::mutable_data` to hand out typed slices
/// without one accessor per dtype.
pub trait Element: Copy + Default + Send + Sync + 'static {
    /// The dtype tag matching this scalar type.
    const DTYPE: DType;

    fn slice(storage: &CpuStorage) -> Option<&[Self]>;

    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]>;

    fn wrap(data: Vec<Self>) -> CpuStorage;
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    fn slice(storage: &CpuStorage) -> Option<&[Self]> {
        match storage {
            CpuStorage::F32(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]> {
        match storage {
            CpuStorage::F32(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(data: Vec<Self>) -> CpuStorage {
        CpuStorage::F32(data)
    }
}

impl Element for i8 {
    const DTYPE: DType = DType::I8;

    fn slice(storage: &CpuStorage) -> Option<&[Self]> {
        match storage {
            CpuStorage::I8(v) => Some(v),
            _ => None,
        }
    }

    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]> {
        match storage {
            CpuStorage::I8(v) => Some(v),
            _ => None,
        }
    }

    fn wrap(data: Vec<Self>) -> CpuStorage {
        CpuStorage::I8(data)
    }
}
