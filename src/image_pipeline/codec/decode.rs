use ndarray::{Array4, ArrayView2, Axis};

use crate::image_pipeline::codec::selection::ClassSelection;
use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::hyperstack::{BitDepth, Dimensions, Image, PixelBuffer};

/// Scales a probability to an 8-bit sample. Out of range results wrap like
/// an integer cast; nothing is clamped.
pub fn quantize_u8(value: f32) -> u8 {
    round_half_up(value * 255.0) as i64 as u8
}

/// Scales a probability to a 16-bit sample, wrapping like [`quantize_u8`].
pub fn quantize_u16(value: f32) -> u16 {
    round_half_up(value * 65535.0) as i64 as u16
}

// Ties round towards positive infinity, so -0.5 becomes 0.
fn round_half_up(value: f32) -> f32 {
    (value + 0.5).floor()
}

/// Turns a raw `(1, C, W, H)` output tensor into a single-slice image.
///
/// Output channel `i` reads tensor channel `selection[i] - 1`, or channel `i`
/// when no selection is given. Samples are quantized to `bit_depth`.
pub fn decode_output(
    name: &str,
    tensor: &Array4<f32>,
    bit_depth: BitDepth,
    selection: Option<&ClassSelection>,
) -> Result<Image> {
    let (batch, channels, width, height) = tensor.dim();
    if batch != 1 {
        return Err(PipelineError::ShapeMismatch(format!(
            "output batch size is {batch}, expected 1"
        )));
    }

    let tensor_channels: Vec<usize> = match selection {
        Some(selection) => {
            selection.validate(channels)?;
            selection.tensor_channels().collect()
        }
        None => (0..channels).collect(),
    };

    let item = tensor.index_axis(Axis(0), 0);
    let planes: Vec<ArrayView2<f32>> = tensor_channels
        .iter()
        .map(|&c| item.index_axis(Axis(0), c))
        .collect();

    let dims = Dimensions::planar(planes.len(), width, height);
    let pixels = match bit_depth {
        BitDepth::Eight => PixelBuffer::U8(collect_planes(&planes, width, height, quantize_u8)),
        BitDepth::Sixteen => PixelBuffer::U16(collect_planes(&planes, width, height, quantize_u16)),
        BitDepth::ThirtyTwo => PixelBuffer::F32(collect_planes(&planes, width, height, |v| v)),
    };

    Image::new(name, dims, pixels)
}

// Planes are indexed [x, y]; hyperstack planes are row-major.
fn collect_planes<T>(
    planes: &[ArrayView2<f32>],
    width: usize,
    height: usize,
    quantize: impl Fn(f32) -> T,
) -> Vec<T> {
    let mut samples = Vec::with_capacity(planes.len() * width * height);
    for plane in planes {
        for y in 0..height {
            for x in 0..width {
                samples.push(quantize(plane[[x, y]]));
            }
        }
    }
    samples
}
