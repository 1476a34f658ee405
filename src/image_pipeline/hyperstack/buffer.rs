//! Typed sample storage for hyperstacks

use std::ops::Range;

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::hyperstack::types::BitDepth;

/// Flat sample storage, one variant per supported bit depth
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl PixelBuffer {
    pub fn zeros(bit_depth: BitDepth, len: usize) -> Self {
        match bit_depth {
            BitDepth::Eight => PixelBuffer::U8(vec![0; len]),
            BitDepth::Sixteen => PixelBuffer::U16(vec![0; len]),
            BitDepth::ThirtyTwo => PixelBuffer::F32(vec![0.0; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::U8(v) => v.len(),
            PixelBuffer::U16(v) => v.len(),
            PixelBuffer::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            PixelBuffer::U8(_) => BitDepth::Eight,
            PixelBuffer::U16(_) => BitDepth::Sixteen,
            PixelBuffer::F32(_) => BitDepth::ThirtyTwo,
        }
    }

    /// Sample at `index` as a float, without rescaling integer samples.
    pub fn value(&self, index: usize) -> f32 {
        match self {
            PixelBuffer::U8(v) => v[index] as f32,
            PixelBuffer::U16(v) => v[index] as f32,
            PixelBuffer::F32(v) => v[index],
        }
    }

    /// Copy of the samples in `range`.
    pub fn range(&self, range: Range<usize>) -> Self {
        match self {
            PixelBuffer::U8(v) => PixelBuffer::U8(v[range].to_vec()),
            PixelBuffer::U16(v) => PixelBuffer::U16(v[range].to_vec()),
            PixelBuffer::F32(v) => PixelBuffer::F32(v[range].to_vec()),
        }
    }

    /// Builds a new buffer of `len` samples where sample `i` is copied from
    /// `source(i)`, or zero when `source(i)` is `None`.
    pub fn gather(&self, len: usize, source: impl Fn(usize) -> Option<usize>) -> Self {
        match self {
            PixelBuffer::U8(v) => PixelBuffer::U8(gather_samples(v, len, source)),
            PixelBuffer::U16(v) => PixelBuffer::U16(gather_samples(v, len, source)),
            PixelBuffer::F32(v) => PixelBuffer::F32(gather_samples(v, len, source)),
        }
    }

    /// Splits the buffer into consecutive mutable regions of `region_len`
    /// samples. Regions are disjoint and may be written from different threads.
    pub fn regions_mut(&mut self, region_len: usize) -> Vec<RegionMut<'_>> {
        match self {
            PixelBuffer::U8(v) => v.chunks_mut(region_len).map(RegionMut::U8).collect(),
            PixelBuffer::U16(v) => v.chunks_mut(region_len).map(RegionMut::U16).collect(),
            PixelBuffer::F32(v) => v.chunks_mut(region_len).map(RegionMut::F32).collect(),
        }
    }
}

fn gather_samples<T: Copy + Default>(
    samples: &[T],
    len: usize,
    source: impl Fn(usize) -> Option<usize>,
) -> Vec<T> {
    (0..len)
        .map(|i| source(i).map_or_else(T::default, |j| samples[j]))
        .collect()
}

/// Mutable view of one region of a [`PixelBuffer`]
#[derive(Debug)]
pub enum RegionMut<'a> {
    U8(&'a mut [u8]),
    U16(&'a mut [u16]),
    F32(&'a mut [f32]),
}

impl RegionMut<'_> {
    pub fn len(&self) -> usize {
        match self {
            RegionMut::U8(r) => r.len(),
            RegionMut::U16(r) => r.len(),
            RegionMut::F32(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrites the region with `source`, which must have the same length
    /// and sample type.
    pub fn copy_from(&mut self, source: &PixelBuffer) -> Result<()> {
        if self.len() != source.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "region holds {} samples, source has {}",
                self.len(),
                source.len()
            )));
        }
        match (self, source) {
            (RegionMut::U8(dst), PixelBuffer::U8(src)) => dst.copy_from_slice(src),
            (RegionMut::U16(dst), PixelBuffer::U16(src)) => dst.copy_from_slice(src),
            (RegionMut::F32(dst), PixelBuffer::F32(src)) => dst.copy_from_slice(src),
            (_, src) => {
                return Err(PipelineError::ShapeMismatch(format!(
                    "cannot write {} samples into a region of another bit depth",
                    src.bit_depth()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_pads_with_zero() {
        let buffer = PixelBuffer::U16(vec![10, 20, 30]);
        let gathered = buffer.gather(5, |i| if i < 3 { Some(2 - i) } else { None });
        assert_eq!(gathered, PixelBuffer::U16(vec![30, 20, 10, 0, 0]));
    }

    #[test]
    fn test_regions_are_disjoint_and_writable() {
        let mut buffer = PixelBuffer::zeros(BitDepth::Eight, 6);
        {
            let mut regions = buffer.regions_mut(2);
            assert_eq!(regions.len(), 3);
            regions[1].copy_from(&PixelBuffer::U8(vec![7, 8])).unwrap();
        }
        assert_eq!(buffer, PixelBuffer::U8(vec![0, 0, 7, 8, 0, 0]));
    }

    #[test]
    fn test_region_rejects_other_bit_depth() {
        let mut buffer = PixelBuffer::zeros(BitDepth::ThirtyTwo, 2);
        let mut regions = buffer.regions_mut(2);
        let err = regions[0].copy_from(&PixelBuffer::U8(vec![1, 2])).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch(_)));
    }

    #[test]
    fn test_region_rejects_length_mismatch() {
        let mut buffer = PixelBuffer::zeros(BitDepth::ThirtyTwo, 4);
        let mut regions = buffer.regions_mut(4);
        assert!(regions[0].copy_from(&PixelBuffer::F32(vec![1.0])).is_err());
    }
}
