use ag_tensor::{Shape, Tensor};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Attributes of a `mul` operator.
///
/// Populated by the surrounding framework, usually from serialized model
/// metadata. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MulAttrs {
    /// Axis at which X's dimensions split into rows and columns.
    pub x_num_col_dims: usize,
    /// Axis at which Y's dimensions split into rows and columns.
    pub y_num_col_dims: usize,
    /// Selects the int8 kernel.
    pub enable_int8: bool,
    /// Quantization scale of X.
    pub input_scale: f32,
    /// Quantization scale of Y. Only per-tensor scales (one element) are
    /// supported.
    pub weight_scale: Vec<f32>,
}

impl Default for MulAttrs {
    fn default() -> Self {
        MulAttrs {
            x_num_col_dims: 1,
            y_num_col_dims: 1,
            enable_int8: false,
            input_scale: 1.0,
            weight_scale: Vec::new(),
        }
    }
}

/// Operands and attributes of one `mul` invocation.
#[derive(Debug)]
pub struct MulParam<'a> {
    pub x: &'a Tensor,
    pub y: &'a Tensor,
    pub output: &'a mut Tensor,
    pub attrs: MulAttrs,
}

impl<'a> MulParam<'a> {
    pub fn new(x: &'a Tensor, y: &'a Tensor, output: &'a mut Tensor) -> Self {
        MulParam {
            x,
            y,
            output,
            attrs: MulAttrs::default(),
        }
    }

    pub fn with_attrs(mut self, attrs: MulAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// `x.dims[..x_num_col_dims] ++ y.dims[y_num_col_dims..]`.
    pub fn output_shape(&self) -> Result<Shape> {
        let x = self.x.shape();
        let y = self.y.shape();
        let lead = x.slice(0, self.attrs.x_num_col_dims)?;
        let tail = y.slice(self.attrs.y_num_col_dims, y.ndim())?;
        Ok(lead.concat(&tail))
    }
}
