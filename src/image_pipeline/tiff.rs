//! TIFF hyperstack module
//!
//! This module reads and writes multi-page TIFF files laid out as ImageJ
//! hyperstacks, with various compression options.

mod imagej;
mod reader;
mod standard_tiff_reader;
mod standard_tiff_writer;
mod writer;
pub mod types;

pub use reader::StackReader;
pub use standard_tiff_reader::StandardTiffReader;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{StackHints, TiffCompression};
pub use writer::TiffWriter;
