use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{ImageBuffer, Luma, Rgb};

use crate::{
    composite::assemble::{CompositeChannel, CompositeResult},
    foundation::error::{HyperblendError, HyperblendResult},
};

/// How unclamped composite values are mapped onto integer pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantizePolicy {
    /// Round and clamp into `[0, full_scale]`.
    #[default]
    Clamp,
    /// Scale so the brightest sample over all channels maps to full scale.
    Normalize,
}

/// Output pixel format for [`save_composite`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuantizeOpts {
    /// 8 or 16.
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u8,
    /// Value mapping.
    #[serde(default)]
    pub policy: QuantizePolicy,
    /// Write a three-channel composite as one RGB image instead of three grayscale files.
    #[serde(default)]
    pub rgb: bool,
}

fn default_bit_depth() -> u8 {
    8
}

impl Default for QuantizeOpts {
    fn default() -> Self {
        Self {
            bit_depth: default_bit_depth(),
            policy: QuantizePolicy::default(),
            rgb: false,
        }
    }
}

impl QuantizeOpts {
    /// Check the bit depth.
    pub fn validate(&self) -> HyperblendResult<()> {
        if self.bit_depth != 8 && self.bit_depth != 16 {
            return Err(HyperblendError::validation(format!(
                "output bit_depth must be 8 or 16, got {}",
                self.bit_depth
            )));
        }
        Ok(())
    }

    fn full_scale(&self) -> f32 {
        if self.bit_depth == 16 {
            f32::from(u16::MAX)
        } else {
            f32::from(u8::MAX)
        }
    }

    fn scale_for(&self, result: &CompositeResult) -> f32 {
        match self.policy {
            QuantizePolicy::Clamp => 1.0,
            QuantizePolicy::Normalize => {
                let max = result.max_value();
                if max > 0.0 {
                    self.full_scale() / max
                } else {
                    1.0
                }
            }
        }
    }
}

/// Quantize one channel to integer levels in `[0, full_scale]`.
pub fn quantize_channel(channel: &CompositeChannel, full_scale: f32, scale: f32) -> Vec<u16> {
    channel
        .data
        .iter()
        .map(|&v| (v * scale).round().clamp(0.0, full_scale) as u16)
        .collect()
}

/// Write a composite to PNG and return the written paths.
///
/// A single channel (or three channels with `rgb` set) goes to `path` itself; otherwise
/// each channel `N` goes to `<stem>_c<N>.png` next to it.
#[tracing::instrument(skip(result), fields(channels = result.channel_count()))]
pub fn save_composite(
    result: &CompositeResult,
    path: &Path,
    opts: &QuantizeOpts,
) -> HyperblendResult<Vec<PathBuf>> {
    opts.validate()?;
    if result.is_empty() {
        tracing::warn!("composite has no channels; nothing written");
        return Ok(Vec::new());
    }
    if opts.rgb && result.channel_count() != 3 {
        return Err(HyperblendError::validation(format!(
            "rgb output needs 3 channels, composite has {}",
            result.channel_count()
        )));
    }
    ensure_parent_dir(path)?;

    let full = opts.full_scale();
    let scale = opts.scale_for(result);
    let dims = result.dims();
    let levels: Vec<Vec<u16>> = result
        .channels()
        .iter()
        .map(|ch| quantize_channel(ch, full, scale))
        .collect();

    if opts.rgb {
        let interleaved: Vec<u16> = (0..dims.pixel_count())
            .flat_map(|i| [levels[0][i], levels[1][i], levels[2][i]])
            .collect();
        write_rgb(path, dims.width, dims.height, interleaved, opts.bit_depth)?;
        return Ok(vec![path.to_path_buf()]);
    }

    let mut written = Vec::with_capacity(levels.len());
    for (c, level) in levels.into_iter().enumerate() {
        let out = if result.channel_count() == 1 {
            path.to_path_buf()
        } else {
            channel_path(path, c)
        };
        write_gray(&out, dims.width, dims.height, level, opts.bit_depth)?;
        written.push(out);
    }
    Ok(written)
}

/// `<dir>/<stem>_c<channel>.png`.
pub fn channel_path(path: &Path, channel: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "composite".to_string());
    path.with_file_name(format!("{stem}_c{channel}.png"))
}

fn write_gray(
    path: &Path,
    width: u32,
    height: u32,
    levels: Vec<u16>,
    bit_depth: u8,
) -> HyperblendResult<()> {
    if bit_depth == 16 {
        ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, levels)
            .context("gray16 buffer size")?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
    } else {
        let bytes = levels.into_iter().map(|v| v as u8).collect();
        ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, bytes)
            .context("gray8 buffer size")?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
    }
    Ok(())
}

fn write_rgb(
    path: &Path,
    width: u32,
    height: u32,
    levels: Vec<u16>,
    bit_depth: u8,
) -> HyperblendResult<()> {
    if bit_depth == 16 {
        ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(width, height, levels)
            .context("rgb16 buffer size")?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
    } else {
        let bytes = levels.into_iter().map(|v| v as u8).collect();
        ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, bytes)
            .context("rgb8 buffer size")?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> HyperblendResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/io/encode.rs"]
mod tests;
