use crate::foundation::{
    core::{StackCoord, StackShape},
    error::{HyperblendError, HyperblendResult},
};

/// Maps between flat slice positions and `(channel, depth)` coordinates.
///
/// Slices are laid out depth-major: all channels of depth 1, then all channels of depth 2, and
/// so on. The flat index of `(channel, depth)` is `channels * (depth - 1) + channel`, with a
/// 0-based channel, a 1-based depth and a 0-based flat index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackIndexer {
    shape: StackShape,
}

impl StackIndexer {
    /// Validate that `total_slices == channels * depths`.
    pub fn new(shape: StackShape, total_slices: usize) -> HyperblendResult<Self> {
        let expected = shape.slice_count()?;
        if expected != total_slices {
            return Err(HyperblendError::shape_mismatch(format!(
                "{} channels x {} depths needs {expected} slices, stack has {total_slices}",
                shape.channels, shape.depths
            )));
        }
        Ok(Self { shape })
    }

    /// Shape this indexer was validated against.
    pub fn shape(&self) -> StackShape {
        self.shape
    }

    /// Flat index of `(channel, depth)`.
    pub fn linear_index(&self, channel: usize, depth: usize) -> HyperblendResult<usize> {
        if channel >= self.shape.channels {
            return Err(HyperblendError::validation(format!(
                "channel {channel} out of range (stack has {} channels)",
                self.shape.channels
            )));
        }
        if depth == 0 || depth > self.shape.depths {
            return Err(HyperblendError::validation(format!(
                "depth {depth} out of range 1..={}",
                self.shape.depths
            )));
        }
        Ok(self.shape.channels * (depth - 1) + channel)
    }

    /// Inverse of [`StackIndexer::linear_index`].
    pub fn coord_of(&self, index: usize) -> HyperblendResult<StackCoord> {
        let total = self.shape.channels * self.shape.depths;
        if index >= total {
            return Err(HyperblendError::validation(format!(
                "slice index {index} out of range (stack has {total} slices)"
            )));
        }
        Ok(StackCoord {
            channel: index % self.shape.channels,
            depth: index / self.shape.channels + 1,
        })
    }

    /// Depths in compositing order, farthest (`depths`) first.
    pub fn depths_back_to_front(&self) -> std::iter::Rev<std::ops::RangeInclusive<usize>> {
        (1..=self.shape.depths).rev()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stack/indexer.rs"]
mod tests;
