//! In-memory sessions for tests.

use ndarray::Array4;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::model::session::InferenceSession;
use crate::image_pipeline::model::shape::TensorShape;

/// Output channel `k` is input channel `k % C_in` plus `k * class_offset`.
/// With matching shapes and no offset this is the identity model.
#[derive(Debug, Clone)]
pub struct MockSession {
    pub input: TensorShape,
    pub output: TensorShape,
    pub class_offset: f32,
    pub fail_at_call: Option<usize>,
    pub calls: usize,
}

impl MockSession {
    pub fn identity(channels: usize, width: usize, height: usize) -> Self {
        let shape = TensorShape::new(channels, width, height);
        Self {
            input: shape,
            output: shape,
            class_offset: 0.0,
            fail_at_call: None,
            calls: 0,
        }
    }

    pub fn classes(input: TensorShape, classes: usize, class_offset: f32) -> Self {
        Self {
            input,
            output: TensorShape::new(classes, input.width, input.height),
            class_offset,
            fail_at_call: None,
            calls: 0,
        }
    }

    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at_call = Some(call);
        self
    }
}

impl InferenceSession for MockSession {
    fn input_shape(&self) -> Result<TensorShape> {
        Ok(self.input)
    }

    fn output_shape(&self) -> Result<TensorShape> {
        Ok(self.output)
    }

    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>> {
        self.calls += 1;
        if self.fail_at_call == Some(self.calls) {
            return Err(PipelineError::Inference(format!(
                "mock failure on call {}",
                self.calls
            )));
        }
        let in_channels = input.dim().1;
        let out = self.output;
        let offset = self.class_offset;
        Ok(Array4::from_shape_fn(
            (1, out.channels, out.width, out.height),
            |(_, k, x, y)| input[[0, k % in_channels, x, y]] + k as f32 * offset,
        ))
    }
}

/// Session whose shape metadata cannot be read.
pub struct BrokenSession;

impl InferenceSession for BrokenSession {
    fn input_shape(&self) -> Result<TensorShape> {
        Err(PipelineError::ModelIntrospection(
            "model declares no tensor named 'input'".to_string(),
        ))
    }

    fn output_shape(&self) -> Result<TensorShape> {
        Err(PipelineError::ModelIntrospection(
            "model declares no tensor named 'target'".to_string(),
        ))
    }

    fn run(&mut self, _input: Array4<f32>) -> Result<Array4<f32>> {
        Err(PipelineError::Inference("broken session".to_string()))
    }
}
