use crate::{
    foundation::{
        core::{SliceDims, StackShape},
        error::{HyperblendError, HyperblendResult},
    },
    stack::{indexer::StackIndexer, slice::Slice},
};

/// Read-only access to a flat, depth-major sequence of slices.
///
/// The compositor only ever reads through this trait; hosts that keep slices elsewhere (a
/// viewer's own stack, a memory-mapped file) implement it directly.
pub trait StackSource {
    /// Total number of slices.
    fn len(&self) -> usize;

    /// Return `true` when the stack holds no slices.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nominal dimensions shared by every slice.
    fn dims(&self) -> SliceDims;

    /// Slice at a flat index (see [`StackIndexer`]).
    fn slice_at(&self, index: usize) -> HyperblendResult<&Slice>;
}

/// Owned, in-memory stack of slices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryStack {
    dims: SliceDims,
    slices: Vec<Slice>,
}

impl InMemoryStack {
    /// Build a stack from slices in flat order.
    ///
    /// Dimensions are taken from the first slice; every other slice must match.
    pub fn new(slices: Vec<Slice>) -> HyperblendResult<Self> {
        let dims = slices.first().map(Slice::dims).unwrap_or_default();
        Self::with_dims(dims, slices)
    }

    /// Build a stack with explicit dimensions; useful for empty stacks.
    pub fn with_dims(dims: SliceDims, slices: Vec<Slice>) -> HyperblendResult<Self> {
        for (i, s) in slices.iter().enumerate() {
            if s.dims() != dims {
                return Err(HyperblendError::shape_mismatch(format!(
                    "slice {i} is {}x{}, stack is {}x{}",
                    s.dims().width,
                    s.dims().height,
                    dims.width,
                    dims.height
                )));
            }
        }
        Ok(Self { dims, slices })
    }

    /// Build a stack from per-depth groups of channel slices, farthest depth last.
    ///
    /// `layers[d][c]` is channel `c` at depth `d + 1`.
    pub fn from_layers(layers: Vec<Vec<Slice>>) -> HyperblendResult<(Self, StackShape)> {
        let channels = layers.first().map(Vec::len).unwrap_or(0);
        let depths = layers.len();
        if let Some((d, layer)) = layers.iter().enumerate().find(|(_, l)| l.len() != channels) {
            return Err(HyperblendError::shape_mismatch(format!(
                "depth {} has {} channels, expected {channels}",
                d + 1,
                layer.len()
            )));
        }
        let stack = Self::new(layers.into_iter().flatten().collect())?;
        Ok((stack, StackShape::new(channels, depths)))
    }

    /// Append a slice at the end of the flat order.
    pub fn push(&mut self, slice: Slice) -> HyperblendResult<()> {
        if self.slices.is_empty() && self.dims == SliceDims::default() {
            self.dims = slice.dims();
        }
        if slice.dims() != self.dims {
            return Err(HyperblendError::shape_mismatch(format!(
                "pushed slice is {}x{}, stack is {}x{}",
                slice.dims().width,
                slice.dims().height,
                self.dims.width,
                self.dims.height
            )));
        }
        self.slices.push(slice);
        Ok(())
    }

    /// A copy of this stack with depth order reversed, keeping channel order within a depth.
    pub fn reversed_depths(&self, shape: StackShape) -> HyperblendResult<Self> {
        let indexer = StackIndexer::new(shape, self.slices.len())?;
        let mut slices = Vec::with_capacity(self.slices.len());
        for depth in indexer.depths_back_to_front() {
            for channel in 0..shape.channels {
                slices.push(self.slices[indexer.linear_index(channel, depth)?].clone());
            }
        }
        Ok(Self {
            dims: self.dims,
            slices,
        })
    }

    /// All slices in flat order.
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }
}

impl StackSource for InMemoryStack {
    fn len(&self) -> usize {
        self.slices.len()
    }

    fn dims(&self) -> SliceDims {
        self.dims
    }

    fn slice_at(&self, index: usize) -> HyperblendResult<&Slice> {
        self.slices.get(index).ok_or_else(|| {
            HyperblendError::validation(format!(
                "slice index {index} out of range (stack has {} slices)",
                self.slices.len()
            ))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stack/source.rs"]
mod tests;
