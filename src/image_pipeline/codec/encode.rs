use ndarray::Array4;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::hyperstack::Image;
use crate::image_pipeline::model::TensorShape;

/// Packs a single 2D multi-channel slice into a `(1, C, W, H)` tensor with
/// `tensor[[0, c, x, y]] = slice(c, x, y)`.
///
/// Values are copied as-is; the caller supplies normalized input. A slice
/// larger than the model input is read over `[0, W) x [0, H)` only.
pub fn encode_slice(slice: &Image, input: &TensorShape) -> Result<Array4<f32>> {
    if slice.width() < input.width || slice.height() < input.height {
        return Err(PipelineError::ShapeMismatch(format!(
            "slice is {}x{} but the model expects at least {}x{}",
            slice.width(),
            slice.height(),
            input.width,
            input.height
        )));
    }
    if slice.channels() < input.channels {
        return Err(PipelineError::ShapeMismatch(format!(
            "slice has {} channels but the model expects {}",
            slice.channels(),
            input.channels
        )));
    }

    Ok(Array4::from_shape_fn(
        (1, input.channels, input.width, input.height),
        |(_, c, x, y)| slice.value(c, x, y, 0, 0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::hyperstack::Dimensions;

    fn slice(channels: usize, width: usize, height: usize) -> Image {
        Image::from_fn(
            "slice",
            Dimensions::planar(channels, width, height),
            |c, x, y, _, _| (c * 100 + x * 10 + y) as f32 / 1000.0,
        )
        .unwrap()
    }

    #[test]
    fn test_encode_uses_channel_x_y_layout() {
        let tensor = encode_slice(&slice(2, 3, 4), &TensorShape::new(2, 3, 4)).unwrap();
        assert_eq!(tensor.shape(), &[1, 2, 3, 4]);
        assert_eq!(tensor[[0, 1, 2, 3]], 0.123);
        assert_eq!(tensor[[0, 0, 1, 0]], 0.010);
    }

    #[test]
    fn test_encode_crops_larger_slice() {
        let tensor = encode_slice(&slice(1, 8, 8), &TensorShape::new(1, 4, 2)).unwrap();
        assert_eq!(tensor.shape(), &[1, 1, 4, 2]);
        assert_eq!(tensor[[0, 0, 3, 1]], 0.031);
    }

    #[test]
    fn test_encode_rejects_small_slice() {
        let err = encode_slice(&slice(1, 4, 3), &TensorShape::new(1, 4, 4)).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch(_)));
        assert!(encode_slice(&slice(1, 3, 4), &TensorShape::new(1, 4, 4)).is_err());
    }

    #[test]
    fn test_encode_rejects_missing_channels() {
        let err = encode_slice(&slice(1, 4, 4), &TensorShape::new(3, 4, 4)).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch(_)));
    }
}
