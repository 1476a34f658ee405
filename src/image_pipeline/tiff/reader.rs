use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::hyperstack::Image;
use crate::image_pipeline::tiff::types::StackHints;

pub trait StackReader {
    fn read_stack(&self, name: &str, data: &[u8], hints: &StackHints) -> Result<Image>;
}
