//! Model tensor shapes

use std::fmt;

use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::model::session::InferenceSession;

/// Channel count and spatial extent of one `(1, C, W, H)` model tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorShape {
    pub channels: usize,
    pub width: usize,
    pub height: usize,
}

impl TensorShape {
    pub fn new(channels: usize, width: usize, height: usize) -> Self {
        Self {
            channels,
            width,
            height,
        }
    }

    /// Reads a declared `[N, C, W, H]` tensor shape. Dynamic or otherwise
    /// non-positive dimensions are rejected; the batch axis is not checked.
    pub fn from_dims(tensor: &str, dims: &[i64]) -> Result<Self> {
        if dims.len() != 4 {
            return Err(PipelineError::ModelIntrospection(format!(
                "tensor '{tensor}' has rank {} (expected 4): {dims:?}",
                dims.len()
            )));
        }
        let axis = |i: usize| -> Result<usize> {
            usize::try_from(dims[i])
                .ok()
                .filter(|&d| d > 0)
                .ok_or_else(|| {
                    PipelineError::ModelIntrospection(format!(
                        "tensor '{tensor}' has non-fixed dimension {} at axis {i}: {dims:?}",
                        dims[i]
                    ))
                })
        };
        Ok(Self::new(axis(1)?, axis(2)?, axis(3)?))
    }

    pub fn len(&self) -> usize {
        self.channels * self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.channels, self.width, self.height)
    }
}

/// Input and output tensor shapes, captured once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
    pub input: TensorShape,
    pub output: TensorShape,
}

impl ModelShape {
    pub fn new(input: TensorShape, output: TensorShape) -> Self {
        Self { input, output }
    }

    pub fn inspect<S: InferenceSession + ?Sized>(session: &S) -> Result<Self> {
        let shape = Self::new(session.input_shape()?, session.output_shape()?);
        debug!(input = %shape.input, output = %shape.output, "Model shape");
        Ok(shape)
    }
}
