use crate::error::{Result, TensorError};
use std::fmt;

/// A tensor shape, wrapping a vector of dimension sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Create a shape from a slice of dimensions.
    pub fn from_slice(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= ndim()`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the sub-shape made of dimensions `start..end`.
    ///
    /// An empty range yields a rank-0 shape, whose `numel` is 1.
    pub fn slice(&self, start: usize, end: usize) -> Result<Shape> {
        if start > end || end > self.dims.len() {
            return Err(TensorError::InvalidRange {
                start,
                end,
                ndim: self.dims.len(),
            });
        }
        Ok(Shape::from_slice(&self.dims[start..end]))
    }

    /// Flattens the shape to a matrix by splitting at `num_col_dims`.
    ///
    /// Returns `(rows, cols)` where `rows` is the product of the first
    /// `num_col_dims` dimensions and `cols` the product of the rest. For
    /// `[2, 3, 4, 5]` split at 2 this is `(6, 20)`.
    pub fn flatten_to_2d(&self, num_col_dims: usize) -> Result<(usize, usize)> {
        if num_col_dims > self.dims.len() {
            return Err(TensorError::InvalidAxis {
                axis: num_col_dims,
                ndim: self.dims.len(),
            });
        }
        let rows = self.slice(0, num_col_dims)?.numel();
        let cols = self.slice(num_col_dims, self.dims.len())?.numel();
        Ok((rows, cols))
    }

    /// Concatenates the dimensions of `self` and `other`.
    pub fn concat(&self, other: &Shape) -> Shape {
        let mut dims = Vec::with_capacity(self.ndim() + other.ndim());
        dims.extend_from_slice(&self.dims);
        dims.extend_from_slice(&other.dims);
        Shape::new(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::from_slice(dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_shape() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.ndim(), 3);
        assert_eq!(s.numel(), 24);
        assert_eq!(s.dim(0), 2);
        assert_eq!(s.dim(1), 3);
        assert_eq!(s.dim(2), 4);
    }

    #[test]
    fn test_scalar_shape() {
        let s = Shape::new(vec![]);
        assert_eq!(s.ndim(), 0);
        assert_eq!(s.numel(), 1); // product of empty = 1
    }

    #[test]
    fn test_slice() {
        let s = Shape::new(vec![2, 3, 4, 5]);
        assert_eq!(s.slice(1, 3).unwrap().dims(), &[3, 4]);
        assert_eq!(s.slice(2, 2).unwrap().numel(), 1);
        assert!(s.slice(3, 2).is_err());
        assert!(s.slice(0, 5).is_err());
    }

    #[test]
    fn test_flatten_to_2d() {
        let s = Shape::new(vec![2, 3, 4, 5]);
        assert_eq!(s.flatten_to_2d(1).unwrap(), (2, 60));
        assert_eq!(s.flatten_to_2d(2).unwrap(), (6, 20));
        assert_eq!(s.flatten_to_2d(4).unwrap(), (120, 1));
        assert_eq!(s.flatten_to_2d(0).unwrap(), (1, 120));
    }

    #[test]
    fn test_flatten_axis_out_of_range() {
        let s = Shape::new(vec![2, 3]);
        let err = s.flatten_to_2d(3).unwrap_err();
        assert_eq!(err, TensorError::InvalidAxis { axis: 3, ndim: 2 });
    }

    #[test]
    fn test_concat_and_display() {
        let a = Shape::new(vec![2, 3]);
        let b = Shape::new(vec![4]);
        let c = a.concat(&b);
        assert_eq!(c.dims(), &[2, 3, 4]);
        assert_eq!(c.to_string(), "[2, 3, 4]");
    }
}
