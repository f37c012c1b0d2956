use crate::foundation::{
    core::SliceDims,
    error::{HyperblendError, HyperblendResult},
};

/// Sample storage for one slice, in the pixel type the host delivered.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleData {
    /// 8-bit unsigned samples.
    U8(Vec<u8>),
    /// 16-bit unsigned samples.
    U16(Vec<u16>),
    /// 32-bit float samples.
    F32(Vec<f32>),
}

impl SampleData {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    /// Return `true` when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the sample type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::F32(_) => "f32",
        }
    }
}

/// Immutable 2-D grid of samples at one (channel, depth) position.
#[derive(Clone, Debug, PartialEq)]
pub struct Slice {
    dims: SliceDims,
    data: SampleData,
}

impl Slice {
    /// Create a slice, checking that `data` holds exactly `width * height` samples.
    pub fn new(dims: SliceDims, data: SampleData) -> HyperblendResult<Self> {
        if data.len() != dims.pixel_count() {
            return Err(HyperblendError::shape_mismatch(format!(
                "slice of {}x{} expects {} samples, got {}",
                dims.width,
                dims.height,
                dims.pixel_count(),
                data.len()
            )));
        }
        Ok(Self { dims, data })
    }

    /// Create an 8-bit slice.
    pub fn from_u8(width: u32, height: u32, data: Vec<u8>) -> HyperblendResult<Self> {
        Self::new(SliceDims::new(width, height), SampleData::U8(data))
    }

    /// Create a 16-bit slice.
    pub fn from_u16(width: u32, height: u32, data: Vec<u16>) -> HyperblendResult<Self> {
        Self::new(SliceDims::new(width, height), SampleData::U16(data))
    }

    /// Create a 32-bit float slice.
    pub fn from_f32(width: u32, height: u32, data: Vec<f32>) -> HyperblendResult<Self> {
        Self::new(SliceDims::new(width, height), SampleData::F32(data))
    }

    /// Slice dimensions.
    pub fn dims(&self) -> SliceDims {
        self.dims
    }

    /// Raw sample storage.
    pub fn data(&self) -> &SampleData {
        &self.data
    }

    /// Sample at `(x, y)` widened to `f32`, or `None` outside the slice.
    pub fn sample(&self, x: u32, y: u32) -> Option<f32> {
        if !self.dims.contains(x, y) {
            return None;
        }
        let i = self.dims.offset(x, y);
        Some(match &self.data {
            SampleData::U8(v) => f32::from(v[i]),
            SampleData::U16(v) => f32::from(v[i]),
            SampleData::F32(v) => v[i],
        })
    }

    /// Widen every sample into `out` (row-major). Integer samples convert exactly; floats
    /// pass through unchanged.
    pub fn widen_into(&self, out: &mut [f32]) -> HyperblendResult<()> {
        if out.len() != self.data.len() {
            return Err(HyperblendError::validation(format!(
                "widen target holds {} samples, slice has {}",
                out.len(),
                self.data.len()
            )));
        }
        match &self.data {
            SampleData::U8(v) => {
                for (o, &s) in out.iter_mut().zip(v) {
                    *o = f32::from(s);
                }
            }
            SampleData::U16(v) => {
                for (o, &s) in out.iter_mut().zip(v) {
                    *o = f32::from(s);
                }
            }
            SampleData::F32(v) => out.copy_from_slice(v),
        }
        Ok(())
    }

    /// First sample that is negative or NaN, as `(offset, value)`.
    ///
    /// Integer slices never contain one.
    pub fn first_invalid_sample(&self) -> Option<(usize, f32)> {
        match &self.data {
            SampleData::U8(_) | SampleData::U16(_) => None,
            SampleData::F32(v) => v
                .iter()
                .copied()
                .enumerate()
                .find(|&(_, s)| s.is_nan() || s < 0.0),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stack/slice.rs"]
mod tests;
