use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::hyperstack::Image;
use crate::image_pipeline::tiff::types::TiffCompression;

pub trait TiffWriter {
    fn write_stack(&self, image: &Image, output: &mut dyn Write, compression: TiffCompression) -> Result<()>;
}
