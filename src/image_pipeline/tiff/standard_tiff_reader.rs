//! Multi-page TIFF reader producing 32-bit hyperstacks.
//!
//! Every page is one plane in hyperstack order. Axis sizes come from an
//! ImageJ `ImageDescription` on the first page when present, otherwise from
//! the caller's [`StackHints`]. Integer samples are widened to `f32` without
//! rescaling.

use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::hyperstack::{Dimensions, Image, PixelBuffer};
use crate::image_pipeline::tiff::imagej;
use crate::image_pipeline::tiff::reader::StackReader;
use crate::image_pipeline::tiff::types::StackHints;

pub struct StandardTiffReader;

impl StackReader for StandardTiffReader {
    fn read_stack(&self, name: &str, data: &[u8], hints: &StackHints) -> Result<Image> {
        debug!("Decoding TIFF stack, {} bytes", data.len());

        let mut decoder =
            Decoder::new(Cursor::new(data)).map_err(|e| PipelineError::DecodeError(e.to_string()))?;

        let description = decoder.get_tag_ascii_string(Tag::ImageDescription).ok();
        let (width, height) = decoder
            .dimensions()
            .map_err(|e| PipelineError::DecodeError(e.to_string()))?;

        let mut samples: Vec<f32> = Vec::new();
        let mut pages = 0;
        loop {
            let page_dims = decoder
                .dimensions()
                .map_err(|e| PipelineError::DecodeError(e.to_string()))?;
            if page_dims != (width, height) {
                return Err(PipelineError::InvalidDimensions(format!(
                    "page {pages} is {}x{}, first page is {width}x{height}",
                    page_dims.0, page_dims.1
                )));
            }
            match decoder.colortype().map_err(|e| PipelineError::DecodeError(e.to_string()))? {
                ColorType::Gray(_) => {}
                other => {
                    return Err(PipelineError::UnsupportedFormat(format!(
                        "page {pages} has color type {other:?}, only grayscale planes are supported"
                    )));
                }
            }

            match decoder
                .read_image()
                .map_err(|e| PipelineError::DecodeError(e.to_string()))?
            {
                DecodingResult::U8(values) => samples.extend(values.iter().map(|&v| v as f32)),
                DecodingResult::U16(values) => samples.extend(values.iter().map(|&v| v as f32)),
                DecodingResult::F32(values) => samples.extend_from_slice(&values),
                _ => {
                    return Err(PipelineError::UnsupportedFormat(format!(
                        "page {pages} uses a sample format other than 8/16-bit integer or 32-bit float"
                    )));
                }
            }
            pages += 1;

            if !decoder.more_images() {
                break;
            }
            decoder
                .next_image()
                .map_err(|e| PipelineError::DecodeError(e.to_string()))?;
        }

        let (channels, slices, frames) = match description.as_deref().and_then(imagej::parse) {
            Some(axes) if hints.is_empty() => axes,
            _ => hints.resolve(pages)?,
        };
        let dims = Dimensions::new(channels, width as usize, height as usize, slices, frames);
        debug!("Decoded {} pages as {}", pages, dims);

        Image::new(name, dims, PixelBuffer::F32(samples))
    }
}
