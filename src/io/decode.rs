use std::path::Path;

use anyhow::Context;
use image::{ColorType, DynamicImage};

use crate::{
    foundation::{core::SliceDims, error::HyperblendResult},
    stack::{
        slice::{SampleData, Slice},
        source::InMemoryStack,
    },
};

/// How decoded images map onto stack slices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorHandling {
    /// One grayscale slice per file. 8/16-bit samples stay integer, float images stay float.
    #[default]
    Luma,
    /// Three slices (R, G, B) per file, i.e. one depth of a 3-channel hyperstack.
    SplitRgb,
}

impl ColorHandling {
    /// Slices produced per decoded file.
    pub fn slices_per_image(self) -> usize {
        match self {
            Self::Luma => 1,
            Self::SplitRgb => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SampleDepth {
    Eight,
    Sixteen,
    Float,
}

fn sample_depth(color: ColorType) -> SampleDepth {
    match color {
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
            SampleDepth::Sixteen
        }
        ColorType::Rgb32F | ColorType::Rgba32F => SampleDepth::Float,
        _ => SampleDepth::Eight,
    }
}

/// Convert a decoded image into slices according to `color`.
pub fn image_to_slices(img: &DynamicImage, color: ColorHandling) -> HyperblendResult<Vec<Slice>> {
    let dims = SliceDims::new(img.width(), img.height());
    let depth = sample_depth(img.color());
    match color {
        ColorHandling::Luma => {
            let data = match depth {
                SampleDepth::Eight => SampleData::U8(img.to_luma8().into_raw()),
                SampleDepth::Sixteen => SampleData::U16(img.to_luma16().into_raw()),
                SampleDepth::Float => SampleData::F32(img.to_luma32f().into_raw()),
            };
            Ok(vec![Slice::new(dims, data)?])
        }
        ColorHandling::SplitRgb => {
            let planes = match depth {
                SampleDepth::Eight => split_planes(&img.to_rgb8().into_raw())
                    .map(SampleData::U8),
                SampleDepth::Sixteen => split_planes(&img.to_rgb16().into_raw())
                    .map(SampleData::U16),
                SampleDepth::Float => split_planes(&img.to_rgb32f().into_raw())
                    .map(SampleData::F32),
            };
            planes
                .into_iter()
                .map(|data| Slice::new(dims, data))
                .collect()
        }
    }
}

fn split_planes<T: Copy>(interleaved: &[T]) -> [Vec<T>; 3] {
    let n = interleaved.len() / 3;
    let mut planes = [
        Vec::with_capacity(n),
        Vec::with_capacity(n),
        Vec::with_capacity(n),
    ];
    for px in interleaved.chunks_exact(3) {
        planes[0].push(px[0]);
        planes[1].push(px[1]);
        planes[2].push(px[2]);
    }
    planes
}

/// Decode one image file into slices.
pub fn load_image_slices(path: &Path, color: ColorHandling) -> HyperblendResult<Vec<Slice>> {
    let img = image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "decoded image"
    );
    image_to_slices(&img, color)
}

/// Decode image files, in order, into a flat stack.
///
/// With [`ColorHandling::Luma`] the files must already be in depth-major channel order
/// (`c0z1, c1z1, ..., c0z2, ...`). With [`ColorHandling::SplitRgb`] each file is one depth.
#[tracing::instrument(skip(paths), fields(files = paths.len()))]
pub fn load_stack<P: AsRef<Path>>(
    paths: &[P],
    color: ColorHandling,
) -> HyperblendResult<InMemoryStack> {
    let mut stack = InMemoryStack::default();
    for path in paths {
        for slice in load_image_slices(path.as_ref(), color)? {
            stack.push(slice)?;
        }
    }
    Ok(stack)
}

#[cfg(test)]
#[path = "../../tests/unit/io/decode.rs"]
mod tests;
