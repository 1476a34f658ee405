use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::hyperstack::buffer::{PixelBuffer, RegionMut};
use crate::image_pipeline::hyperstack::types::{BitDepth, Dimensions};

/// Named five-dimensional image (channel, x, y, slice, frame).
///
/// Dimensions are fixed at construction. Transforming stages build a new
/// `Image` rather than reshaping an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    name: String,
    dims: Dimensions,
    pixels: PixelBuffer,
}

impl Image {
    pub fn new(name: impl Into<String>, dims: Dimensions, pixels: PixelBuffer) -> Result<Self> {
        dims.validate()?;
        if pixels.len() != dims.len() {
            return Err(PipelineError::InvalidDimensions(format!(
                "{} samples do not fill {}",
                pixels.len(),
                dims
            )));
        }
        Ok(Self {
            name: name.into(),
            dims,
            pixels,
        })
    }

    pub fn zeros(name: impl Into<String>, dims: Dimensions, bit_depth: BitDepth) -> Result<Self> {
        let pixels = PixelBuffer::zeros(bit_depth, dims.len());
        Self::new(name, dims, pixels)
    }

    /// 32-bit image whose sample at (c, x, y, z, t) is `f(c, x, y, z, t)`.
    pub fn from_fn(
        name: impl Into<String>,
        dims: Dimensions,
        f: impl Fn(usize, usize, usize, usize, usize) -> f32,
    ) -> Result<Self> {
        dims.validate()?;
        let samples = (0..dims.len())
            .map(|i| {
                let (c, x, y, z, t) = dims.position(i);
                f(c, x, y, z, t)
            })
            .collect();
        Self::new(name, dims, PixelBuffer::F32(samples))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn channels(&self) -> usize {
        self.dims.channels
    }

    pub fn width(&self) -> usize {
        self.dims.width
    }

    pub fn height(&self) -> usize {
        self.dims.height
    }

    pub fn slices(&self) -> usize {
        self.dims.slices
    }

    pub fn frames(&self) -> usize {
        self.dims.frames
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.pixels.bit_depth()
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn into_pixels(self) -> PixelBuffer {
        self.pixels
    }

    pub fn value(&self, c: usize, x: usize, y: usize, z: usize, t: usize) -> f32 {
        self.pixels.value(self.dims.index(c, x, y, z, t))
    }

    /// Copy of one channel plane at (slice, frame).
    pub fn plane(&self, c: usize, z: usize, t: usize) -> PixelBuffer {
        let start = self.dims.plane_index(c, z, t) * self.dims.plane_len();
        self.pixels.range(start..start + self.dims.plane_len())
    }

    /// All channels of the 2D slice at (z, t) as a single-slice,
    /// single-frame image.
    pub fn extract_slice(&self, z: usize, t: usize) -> Result<Image> {
        if z >= self.dims.slices || t >= self.dims.frames {
            return Err(PipelineError::InvalidDimensions(format!(
                "slice z={z} t={t} outside {}",
                self.dims
            )));
        }
        let len = self.dims.coordinate_len();
        let start = self.dims.coordinate_index(z, t) * len;
        Image::new(
            self.name.clone(),
            Dimensions::planar(self.dims.channels, self.dims.width, self.dims.height),
            self.pixels.range(start..start + len),
        )
    }

    /// One mutable region per (slice, frame) coordinate, ordered by
    /// `z + slices * t`.
    pub fn coordinate_regions_mut(&mut self) -> Vec<RegionMut<'_>> {
        let len = self.dims.coordinate_len();
        self.pixels.regions_mut(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(dims: Dimensions) -> Image {
        Image::from_fn("ramp", dims, |c, x, y, z, t| {
            (c * 10_000 + t * 1_000 + z * 100 + y * 10 + x) as f32
        })
        .unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_sample_count() {
        let dims = Dimensions::planar(1, 4, 4);
        let result = Image::new("bad", dims, PixelBuffer::F32(vec![0.0; 15]));
        assert!(matches!(result, Err(PipelineError::InvalidDimensions(_))));
    }

    #[test]
    fn test_value_addresses_all_axes() {
        let image = ramp(Dimensions::new(2, 3, 4, 2, 3));
        assert_eq!(image.value(1, 2, 3, 1, 2), 12_132.0);
        assert_eq!(image.value(0, 0, 0, 0, 0), 0.0);
    }

    #[test]
    fn test_extract_slice_keeps_all_channels() {
        let image = ramp(Dimensions::new(2, 3, 4, 2, 3));
        let slice = image.extract_slice(1, 2).unwrap();

        assert_eq!(slice.dims(), Dimensions::planar(2, 3, 4));
        for c in 0..2 {
            for y in 0..4 {
                for x in 0..3 {
                    assert_eq!(slice.value(c, x, y, 0, 0), image.value(c, x, y, 1, 2));
                }
            }
        }
    }

    #[test]
    fn test_extract_slice_out_of_range() {
        let image = ramp(Dimensions::new(1, 2, 2, 2, 1));
        assert!(image.extract_slice(2, 0).is_err());
        assert!(image.extract_slice(0, 1).is_err());
    }

    #[test]
    fn test_plane_copy() {
        let image = ramp(Dimensions::new(2, 2, 2, 1, 1));
        assert_eq!(
            image.plane(1, 0, 0),
            PixelBuffer::F32(vec![10_000.0, 10_001.0, 10_010.0, 10_011.0])
        );
    }
}
