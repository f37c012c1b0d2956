use crate::{
    composite::accumulator::Accumulator,
    foundation::{
        core::SliceDims,
        error::{HyperblendError, HyperblendResult},
    },
    stack::slice::Slice,
};

/// Finished composite of one channel: unclamped `f32` samples in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeChannel {
    /// Width and height, equal to the source slice dimensions.
    pub dims: SliceDims,
    /// Row-major samples.
    pub data: Vec<f32>,
}

impl CompositeChannel {
    /// Sample at `(x, y)`, or `None` outside the channel.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        self.dims
            .contains(x, y)
            .then(|| self.data[self.dims.offset(x, y)])
    }

    /// Largest sample, or `0.0` for an empty channel.
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }
}

/// Per-channel composite, in the channel order of the source stack.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeResult {
    dims: SliceDims,
    channels: Vec<CompositeChannel>,
}

impl CompositeResult {
    /// Composite dimensions.
    pub fn dims(&self) -> SliceDims {
        self.dims
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Return `true` when the composite has no channels.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channel `c`, if present.
    pub fn channel(&self, c: usize) -> Option<&CompositeChannel> {
        self.channels.get(c)
    }

    /// All channels in order.
    pub fn channels(&self) -> &[CompositeChannel] {
        &self.channels
    }

    /// Sample of channel `c` at `(x, y)`.
    pub fn get(&self, c: usize, x: u32, y: u32) -> Option<f32> {
        self.channel(c).and_then(|ch| ch.get(x, y))
    }

    /// Largest sample over every channel, or `0.0` when empty.
    pub fn max_value(&self) -> f32 {
        self.channels
            .iter()
            .map(CompositeChannel::max_value)
            .fold(0.0, f32::max)
    }

    /// Convert each channel into a 32-bit float [`Slice`], e.g. to append the composite to the
    /// host's own stack.
    pub fn into_slices(self) -> HyperblendResult<Vec<Slice>> {
        self.channels
            .into_iter()
            .map(|ch| Slice::from_f32(ch.dims.width, ch.dims.height, ch.data))
            .collect()
    }
}

/// Package per-channel accumulators into a [`CompositeResult`], keeping channel order and
/// values untouched.
pub(crate) fn assemble(
    dims: SliceDims,
    accumulators: Vec<Accumulator>,
    channel_count: usize,
) -> HyperblendResult<CompositeResult> {
    if accumulators.len() != channel_count {
        return Err(HyperblendError::validation(format!(
            "assembler expected {channel_count} accumulators, got {}",
            accumulators.len()
        )));
    }
    let mut channels = Vec::with_capacity(channel_count);
    for (c, acc) in accumulators.into_iter().enumerate() {
        if acc.dims() != dims {
            return Err(HyperblendError::shape_mismatch(format!(
                "accumulator {c} is {}x{}, composite is {}x{}",
                acc.dims().width,
                acc.dims().height,
                dims.width,
                dims.height
            )));
        }
        channels.push(CompositeChannel {
            dims,
            data: acc.into_data(),
        });
    }
    Ok(CompositeResult { dims, channels })
}

#[cfg(test)]
#[path = "../../tests/unit/composite/assemble.rs"]
mod tests;
