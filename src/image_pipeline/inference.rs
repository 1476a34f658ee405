//! Slice inference module
//!
//! Drives the model across every depth slice and time frame of an image.

mod slice_loop;

pub use slice_loop::SliceInferenceLoop;
