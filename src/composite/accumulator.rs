use crate::foundation::core::SliceDims;

/// Mutable per-channel composite buffer, zero (black) on creation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Accumulator {
    dims: SliceDims,
    data: Vec<f32>,
}

impl Accumulator {
    pub(crate) fn zeroed(dims: SliceDims) -> Self {
        Self {
            dims,
            data: vec![0.0; dims.pixel_count()],
        }
    }

    /// One fresh accumulator per channel.
    pub(crate) fn zeroed_set(dims: SliceDims, channels: usize) -> Vec<Self> {
        (0..channels).map(|_| Self::zeroed(dims)).collect()
    }

    pub(crate) fn dims(&self) -> SliceDims {
        self.dims
    }

    pub(crate) fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub(crate) fn into_data(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/accumulator.rs"]
mod tests;
