//! Tensor codec
//!
//! Converts hyperstack slices to model input tensors and model output tensors
//! back to quantized, optionally class-filtered images.

mod decode;
mod encode;
pub mod selection;

pub use decode::{decode_output, quantize_u16, quantize_u8};
pub use encode::encode_slice;
pub use selection::{ClassSelection, selected_channel_count};
