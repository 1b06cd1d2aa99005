use crate::dtype::{DType, Element};

/// Contiguous element storage backing a `Tensor`.
///
/// The host reference BLAS backend reads and writes these buffers directly,
/// so this is also what "device-resident" means for it.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    /// 32-bit floating point storage.
    F32(Vec<f32>),
    /// Signed 8-bit integer storage.
    I8(Vec<i8>),
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            CpuStorage::F32(v) => v.len(),
            CpuStorage::I8(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create zero-filled storage for the given dtype and element count.
    pub fn zeros(dtype: DType, n: usize) -> Self {
        match dtype {
            DType::F32 => CpuStorage::F32(vec![0.0; n]),
            DType::I8 => CpuStorage::I8(vec![0; n]),
        }
    }

    /// Create storage from a typed vector.
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        T::wrap(data)
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::I8(_) => DType::I8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec() {
        let s = CpuStorage::from_vec(vec![1.0f32, 2.0, 3.0]);
        assert_eq!(s.len(), 3);
        assert!(!s.is_empty());
        assert_eq!(s.dtype(), DType::F32);
        assert_eq!(f32::slice(&s).unwrap(), &[1.0, 2.0, 3.0]);
        assert!(i8::slice(&s).is_none());
    }

    #[test]
    fn test_zeros() {
        let s = CpuStorage::zeros(DType::I8, 4);
        assert_eq!(s, CpuStorage::I8(vec![0; 4]));
        let f = CpuStorage::zeros(DType::F32, 2);
        assert_eq!(f, CpuStorage::F32(vec![0.0; 2]));
    }

    #[test]
    fn test_mut_slice() {
        let mut s = CpuStorage::from_vec(vec![1i8, 2]);
        i8::slice_mut(&mut s).unwrap()[0] = -7;
        assert_eq!(i8::slice(&s).unwrap(), &[-7, 2]);
    }
}
