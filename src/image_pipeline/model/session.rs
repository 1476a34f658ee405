use ndarray::Array4;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::model::shape::TensorShape;

/// A loaded model that maps one fixed-shape `(1, C, W, H)` tensor to another.
pub trait InferenceSession {
    fn input_shape(&self) -> Result<TensorShape>;
    fn output_shape(&self) -> Result<TensorShape>;
    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>>;
}
