use crate::foundation::error::{HyperblendError, HyperblendResult};

/// Reference attenuation constant of [`BlendKind::LimitedAlpha`].
pub const LIMITED_ALPHA_M: f32 = 10.0;
/// Reference fog strength of [`BlendKind::SimpleAlphaFog`].
pub const FOG_STRENGTH: f32 = 1.0;
/// Reference full-scale intensity of [`BlendKind::SimpleAlphaFog`].
pub const FOG_MAX: f32 = 255.0;

/// Per-pixel blend law selected for a compositing run.
///
/// Every law maps a source sample and the current accumulator value to the new accumulator
/// value. Inputs are non-negative; the compositor rejects negative samples before blending.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendKind {
    /// Brightest sample wins (maximum-intensity projection). Order independent.
    #[default]
    MaxIntensity,
    /// Saturating back-to-front accumulation.
    ///
    /// `z * src` onto an empty accumulator, otherwise
    /// `z * src + dest / (dest + src * m * z / (m - 1)) * dest` with `z = 1 / m`.
    LimitedAlpha {
        /// Attenuation constant, finite and greater than 1.
        m: f32,
    },
    /// Single-layer fog approximation: `src + k^2 * dest` with `k = fog * (1 - src / max)`.
    SimpleAlphaFog {
        /// Fog strength, finite and non-negative.
        fog: f32,
        /// Full-scale intensity, finite and positive.
        max: f32,
    },
}

impl BlendKind {
    /// [`BlendKind::LimitedAlpha`] with the reference constant `m = 10`.
    pub const fn limited_alpha() -> Self {
        Self::LimitedAlpha { m: LIMITED_ALPHA_M }
    }

    /// [`BlendKind::SimpleAlphaFog`] with the reference `fog = 1`, `max = 255`.
    pub const fn simple_alpha_fog() -> Self {
        Self::SimpleAlphaFog {
            fog: FOG_STRENGTH,
            max: FOG_MAX,
        }
    }

    /// Canonical kind name, as accepted by [`crate::parse_blend_kind_params`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::MaxIntensity => "max_intensity",
            Self::LimitedAlpha { .. } => "limited_alpha",
            Self::SimpleAlphaFog { .. } => "simple_alpha_fog",
        }
    }

    /// Check parameters and precompute the per-pixel constants.
    pub fn compile(self) -> HyperblendResult<BlendFunction> {
        let law = match self {
            Self::MaxIntensity => Law::Max,
            Self::LimitedAlpha { m } => {
                if !m.is_finite() {
                    return Err(HyperblendError::invalid_blend_parameter(
                        "limited_alpha.m must be finite",
                    ));
                }
                if m == 1.0 {
                    return Err(HyperblendError::invalid_blend_parameter(
                        "limited_alpha.m must not be 1 (m - 1 divides the attenuation term)",
                    ));
                }
                if m < 1.0 {
                    return Err(HyperblendError::invalid_blend_parameter(format!(
                        "limited_alpha.m must be > 1, got {m}"
                    )));
                }
                let z = 1.0 / m;
                Law::LimitedAlpha {
                    z,
                    src_weight: m * z / (m - 1.0),
                }
            }
            Self::SimpleAlphaFog { fog, max } => {
                if !fog.is_finite() || fog < 0.0 {
                    return Err(HyperblendError::invalid_blend_parameter(format!(
                        "simple_alpha_fog.fog must be finite and >= 0, got {fog}"
                    )));
                }
                if !max.is_finite() || max <= 0.0 {
                    return Err(HyperblendError::invalid_blend_parameter(format!(
                        "simple_alpha_fog.max must be finite and > 0, got {max}"
                    )));
                }
                Law::Fog { fog, max }
            }
        };
        Ok(BlendFunction { kind: self, law })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Law {
    Max,
    LimitedAlpha { z: f32, src_weight: f32 },
    Fog { fog: f32, max: f32 },
}

/// A validated, ready-to-apply blend law.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendFunction {
    kind: BlendKind,
    law: Law,
}

impl BlendFunction {
    /// The configuration this function was compiled from.
    pub fn kind(&self) -> BlendKind {
        self.kind
    }

    /// Return `true` when the result does not depend on depth traversal order.
    pub fn is_order_independent(&self) -> bool {
        matches!(self.law, Law::Max)
    }

    /// Blend one source sample onto the current accumulator value.
    #[inline]
    pub fn apply(&self, src: f32, dest: f32) -> f32 {
        match self.law {
            Law::Max => src.max(dest),
            Law::LimitedAlpha { z, src_weight } => {
                if dest == 0.0 {
                    z * src
                } else {
                    z * src + (dest / (dest + src * src_weight)) * dest
                }
            }
            Law::Fog { fog, max } => {
                // f64 keeps k^2 finite for any f32 sample; a zero factor contributes nothing
                // even when the other one overflowed.
                let k = f64::from(fog) * (1.0 - f64::from(src) / f64::from(max));
                if k == 0.0 || dest == 0.0 {
                    return src;
                }
                (f64::from(src) + k * k * f64::from(dest)) as f32
            }
        }
    }

    /// Blend a whole row of source samples into `dest` in place.
    pub fn apply_row(&self, src: &[f32], dest: &mut [f32]) {
        for (d, &s) in dest.iter_mut().zip(src) {
            *d = self.apply(s, *d);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/kind.rs"]
mod tests;
