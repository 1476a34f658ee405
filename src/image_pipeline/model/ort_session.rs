//! ONNX Runtime backed inference session.
//!
//! Loads a model file with the `ort` crate and exposes its named input and
//! output tensors through [`InferenceSession`]. Only models whose input and
//! output are declared with fixed `[N, C, W, H]` shapes can be inspected.

use std::path::Path;

use ndarray::Array4;
use ort::{
    session::{Session, SessionOutputs},
    value::{Value, ValueType},
};
use tracing::{debug, info};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::model::session::InferenceSession;
use crate::image_pipeline::model::shape::TensorShape;

/// Default name of the model's image input tensor.
pub const DEFAULT_INPUT_TENSOR: &str = "input";

/// Default name of the model's probability map output tensor.
pub const DEFAULT_OUTPUT_TENSOR: &str = "target";

pub struct OrtSession {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OrtSession {
    /// Opens the model at `model_path`.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the `.onnx` file
    /// * `input_name` - Name of the declared input tensor to feed
    /// * `output_name` - Name of the declared output tensor to read back
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Inference` if ONNX Runtime cannot load the model.
    pub fn open<P: AsRef<Path>>(model_path: P, input_name: &str, output_name: &str) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!("Loading ONNX model from {}", model_path.display());

        let session = Session::builder()?.commit_from_file(model_path)?;

        debug!(
            inputs = ?session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            outputs = ?session.outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
            "Model loaded"
        );

        Ok(Self {
            session,
            input_name: input_name.to_string(),
            output_name: output_name.to_string(),
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

fn tensor_shape(name: &str, value_type: Option<&ValueType>) -> Result<TensorShape> {
    match value_type {
        Some(ValueType::Tensor { shape, .. }) => {
            let dims: Vec<i64> = shape.iter().copied().collect();
            TensorShape::from_dims(name, &dims)
        }
        Some(other) => Err(PipelineError::ModelIntrospection(format!(
            "'{name}' is not a tensor: {other:?}"
        ))),
        None => Err(PipelineError::ModelIntrospection(format!(
            "model declares no tensor named '{name}'"
        ))),
    }
}

impl InferenceSession for OrtSession {
    fn input_shape(&self) -> Result<TensorShape> {
        let input = self
            .session
            .inputs
            .iter()
            .find(|i| i.name == self.input_name)
            .map(|i| &i.input_type);
        tensor_shape(&self.input_name, input)
    }

    fn output_shape(&self) -> Result<TensorShape> {
        let output = self
            .session
            .outputs
            .iter()
            .find(|o| o.name == self.output_name)
            .map(|o| &o.output_type);
        tensor_shape(&self.output_name, output)
    }

    fn run(&mut self, input: Array4<f32>) -> Result<Array4<f32>> {
        let input_tensor = Value::from_array(input)?;
        let outputs: SessionOutputs = self.session.run(ort::inputs![&*self.input_name => input_tensor])?;

        let (shape, data) = outputs[self.output_name.as_str()].try_extract_tensor::<f32>()?;

        let dims = shape
            .iter()
            .map(|&d| usize::try_from(d).ok())
            .collect::<Option<Vec<usize>>>()
            .filter(|dims| dims.len() == 4)
            .ok_or_else(|| {
                PipelineError::ShapeMismatch(format!(
                    "output '{}' has shape {:?}, expected rank 4",
                    self.output_name,
                    shape.iter().collect::<Vec<_>>()
                ))
            })?;

        Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec())
            .map_err(|e| PipelineError::ShapeMismatch(e.to_string()))
    }
}
