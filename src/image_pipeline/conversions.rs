//! Pipeline conversions module
//!
//! This module contains the orchestration that runs a model over whole
//! hyperstacks, in memory or file to file.

mod onnx_model;
#[cfg(test)]
mod tests;
pub mod types;

pub use onnx_model::{OnnxModelPipeline, run_model};
pub use types::{DEFAULT_TILE_OVERLAP, InferenceConfig, InferenceConfigBuilder};
