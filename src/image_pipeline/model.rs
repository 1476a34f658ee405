//! Model loading and introspection
//!
//! The pipeline talks to models only through the [`InferenceSession`] trait;
//! [`OrtSession`] is the ONNX Runtime implementation.

#[cfg(test)]
pub(crate) mod mock;
mod ort_session;
mod session;
pub mod shape;

pub use ort_session::{DEFAULT_INPUT_TENSOR, DEFAULT_OUTPUT_TENSOR, OrtSession};
pub use session::InferenceSession;
pub use shape::{ModelShape, TensorShape};
