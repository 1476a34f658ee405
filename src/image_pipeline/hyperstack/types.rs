//! Hyperstack geometry and sample precision types

use std::fmt;
use std::str::FromStr;

use crate::image_pipeline::common::error::{PipelineError, Result};

/// Output sample precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    /// 8-bit unsigned integer samples (1.0 maps to 255)
    Eight,
    /// 16-bit unsigned integer samples (1.0 maps to 65535)
    Sixteen,
    /// 32-bit float samples, stored unscaled
    #[default]
    ThirtyTwo,
}

impl BitDepth {
    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = PipelineError;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            32 => Ok(BitDepth::ThirtyTwo),
            other => Err(PipelineError::InvalidBitDepth(other)),
        }
    }
}

impl FromStr for BitDepth {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let bits = s
            .trim()
            .parse::<u32>()
            .map_err(|_| PipelineError::InvalidBitDepth(0))?;
        BitDepth::try_from(bits)
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Extent of a hyperstack along each of its five axes.
///
/// Samples are laid out plane by plane, each plane row-major, with the plane
/// index `c + channels * (z + slices * t)`. All channel planes of one
/// (slice, frame) coordinate are therefore contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub channels: usize,
    pub width: usize,
    pub height: usize,
    pub slices: usize,
    pub frames: usize,
}

impl Dimensions {
    pub fn new(channels: usize, width: usize, height: usize, slices: usize, frames: usize) -> Self {
        Self {
            channels,
            width,
            height,
            slices,
            frames,
        }
    }

    /// Single-slice, single-frame dimensions.
    pub fn planar(channels: usize, width: usize, height: usize) -> Self {
        Self::new(channels, width, height, 1, 1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.channels == 0
            || self.width == 0
            || self.height == 0
            || self.slices == 0
            || self.frames == 0
        {
            return Err(PipelineError::InvalidDimensions(format!("{self}")));
        }
        Ok(())
    }

    pub fn plane_len(&self) -> usize {
        self.width * self.height
    }

    /// Number of samples belonging to one (slice, frame) coordinate.
    pub fn coordinate_len(&self) -> usize {
        self.channels * self.plane_len()
    }

    /// Number of (slice, frame) coordinates.
    pub fn coordinate_count(&self) -> usize {
        self.slices * self.frames
    }

    pub fn len(&self) -> usize {
        self.coordinate_len() * self.coordinate_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn plane_count(&self) -> usize {
        self.channels * self.coordinate_count()
    }

    pub fn coordinate_index(&self, z: usize, t: usize) -> usize {
        z + self.slices * t
    }

    pub fn plane_index(&self, c: usize, z: usize, t: usize) -> usize {
        c + self.channels * self.coordinate_index(z, t)
    }

    pub fn index(&self, c: usize, x: usize, y: usize, z: usize, t: usize) -> usize {
        self.plane_index(c, z, t) * self.plane_len() + y * self.width + x
    }

    /// Inverse of [`Dimensions::index`].
    pub fn position(&self, index: usize) -> (usize, usize, usize, usize, usize) {
        let plane_len = self.plane_len();
        let (plane, offset) = (index / plane_len, index % plane_len);
        let (x, y) = (offset % self.width, offset / self.width);
        let c = plane % self.channels;
        let coordinate = plane / self.channels;
        let (z, t) = (coordinate % self.slices, coordinate / self.slices);
        (c, x, y, z, t)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "c={} x={} y={} z={} t={}",
            self.channels, self.width, self.height, self.slices, self.frames
        )
    }
}
