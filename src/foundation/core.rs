use crate::foundation::error::{HyperblendError, HyperblendResult};

/// Width and height of every slice in a stack, in pixels.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct SliceDims {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SliceDims {
    /// Create slice dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of samples in one slice.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Row-major offset of pixel `(x, y)`.
    pub fn offset(self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Pixel coordinates of a row-major offset.
    pub fn coords(self, offset: usize) -> (u32, u32) {
        let w = (self.width as usize).max(1);
        ((offset % w) as u32, (offset / w) as u32)
    }

    /// Return `true` when `(x, y)` lies inside the slice.
    pub fn contains(self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }
}

/// Channel and depth counts of a hyperstack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StackShape {
    /// Channels per depth position.
    pub channels: usize,
    /// Depth positions (z-slices).
    pub depths: usize,
}

impl StackShape {
    /// Create a stack shape.
    pub fn new(channels: usize, depths: usize) -> Self {
        Self { channels, depths }
    }

    /// Total slice count `channels * depths`.
    ///
    /// Fails with [`HyperblendError::ShapeMismatch`] when the product overflows.
    pub fn slice_count(self) -> HyperblendResult<usize> {
        self.channels.checked_mul(self.depths).ok_or_else(|| {
            HyperblendError::shape_mismatch(format!(
                "{} channels x {} depths overflows the slice count",
                self.channels, self.depths
            ))
        })
    }

    /// Return `true` when the stack has no slices to composite.
    pub fn is_degenerate(self) -> bool {
        self.channels == 0 || self.depths == 0
    }

    /// Infer the depth count from a flat slice count and a channel count.
    pub fn infer_depths(channels: usize, total_slices: usize) -> HyperblendResult<Self> {
        if channels == 0 {
            return Err(HyperblendError::validation(
                "cannot infer depths with zero channels",
            ));
        }
        if !total_slices.is_multiple_of(channels) {
            return Err(HyperblendError::shape_mismatch(format!(
                "{total_slices} slices are not divisible into {channels} channels"
            )));
        }
        Ok(Self {
            channels,
            depths: total_slices / channels,
        })
    }
}

/// Position of one slice in a hyperstack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StackCoord {
    /// 0-based channel.
    pub channel: usize,
    /// 1-based depth.
    pub depth: usize,
}

impl std::fmt::Display for StackCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}/z{}", self.channel, self.depth)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
