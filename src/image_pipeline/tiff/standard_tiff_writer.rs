use std::io::{Cursor, Seek, Write};

use tiff::encoder::colortype::{ColorType, Gray8, Gray16, Gray32Float};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::debug;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::hyperstack::{Image, PixelBuffer};
use crate::image_pipeline::tiff::imagej;
use crate::image_pipeline::tiff::types::TiffCompression;
use crate::image_pipeline::tiff::writer::TiffWriter;

/// Writes one TIFF page per plane in hyperstack order, with an ImageJ
/// description on the first page.
pub struct StandardTiffWriter;

impl TiffWriter for StandardTiffWriter {
    fn write_stack(&self, image: &Image, output: &mut dyn Write, compression: TiffCompression) -> Result<()> {
        let dims = image.dims();
        debug!("Encoding TIFF hyperstack: {} ({})", dims, image.bit_depth());

        let compression = match compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Balanced),
            TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Best),
        };

        let buffer = encode_pages(image, compression)?;
        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} pages", dims.plane_count());
        Ok(())
    }
}

fn encode_pages(image: &Image, compression: tiff::encoder::Compression) -> Result<Vec<u8>> {
    let dims = image.dims();
    let (width, height) = (dims.width as u32, dims.height as u32);
    let description = imagej::describe(&dims);
    let plane_len = dims.plane_len();

    let mut buffer = Vec::new();
    let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
        .map_err(|e| PipelineError::EncodeError(e.to_string()))?
        .with_compression(compression);

    for plane in 0..dims.plane_count() {
        let range = plane * plane_len..(plane + 1) * plane_len;
        let description = (plane == 0).then_some(description.as_str());
        match image.pixels() {
            PixelBuffer::U8(v) => write_page::<Gray8, _>(&mut encoder, width, height, &v[range], description)?,
            PixelBuffer::U16(v) => write_page::<Gray16, _>(&mut encoder, width, height, &v[range], description)?,
            PixelBuffer::F32(v) => write_page::<Gray32Float, _>(&mut encoder, width, height, &v[range], description)?,
        }
    }
    drop(encoder);

    Ok(buffer)
}

fn write_page<C, W>(
    encoder: &mut TiffEncoder<W>,
    width: u32,
    height: u32,
    data: &[C::Inner],
    description: Option<&str>,
) -> Result<()>
where
    C: ColorType,
    W: Write + Seek,
    [C::Inner]: TiffValue,
{
    let mut page = encoder
        .new_image::<C>(width, height)
        .map_err(|e| PipelineError::EncodeError(e.to_string()))?;
    if let Some(description) = description {
        page.encoder()
            .write_tag(Tag::ImageDescription, description)
            .map_err(|e| PipelineError::EncodeError(e.to_string()))?;
    }
    page.write_data(data)
        .map_err(|e| PipelineError::EncodeError(e.to_string()))
}
