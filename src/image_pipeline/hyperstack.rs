//! Hyperstack image container
//!
//! Multi-channel, multi-slice, multi-frame images with typed sample storage.

mod buffer;
mod image;
pub mod types;

pub use buffer::{PixelBuffer, RegionMut};
pub use image::Image;
pub use types::{BitDepth, Dimensions};
