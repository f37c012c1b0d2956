use crate::{
    blend::kind::{BlendKind, FOG_MAX, FOG_STRENGTH, LIMITED_ALPHA_M},
    foundation::error::{HyperblendError, HyperblendResult},
};

/// Blend configuration as written in job files: a kind name plus optional parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlendSpec {
    /// Kind name, e.g. `"max"`, `"limited_alpha"` or `"fog"`.
    pub kind: String,
    /// Kind-specific parameters; `null` selects the reference constants.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl BlendSpec {
    /// Blend configuration for a kind name with default parameters.
    pub fn named(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: serde_json::Value::Null,
        }
    }
}

impl Default for BlendSpec {
    fn default() -> Self {
        Self::named("max_intensity")
    }
}

impl From<BlendKind> for BlendSpec {
    fn from(kind: BlendKind) -> Self {
        let params = match kind {
            BlendKind::MaxIntensity => serde_json::Value::Null,
            BlendKind::LimitedAlpha { m } => serde_json::json!({ "m": m }),
            BlendKind::SimpleAlphaFog { fog, max } => serde_json::json!({ "fog": fog, "max": max }),
        };
        Self {
            kind: kind.name().to_string(),
            params,
        }
    }
}

/// Parse a blend kind name and its JSON parameters.
pub fn parse_blend_kind_params(
    kind: &str,
    params: &serde_json::Value,
) -> HyperblendResult<BlendKind> {
    let kind = kind.trim().to_ascii_lowercase();
    if kind.is_empty() {
        return Err(HyperblendError::validation("blend kind must be non-empty"));
    }

    let params = if params.is_null() {
        None
    } else {
        Some(params.as_object().ok_or_else(|| {
            HyperblendError::validation(format!("{kind} params must be an object"))
        })?)
    };
    let param = |name: &str, default: f32| -> HyperblendResult<f32> {
        match params.and_then(|p| p.get(name)) {
            None => Ok(default),
            Some(v) => {
                let f = v.as_f64().ok_or_else(|| {
                    HyperblendError::validation(format!("{kind}.{name} must be a number"))
                })? as f32;
                if !f.is_finite() {
                    return Err(HyperblendError::invalid_blend_parameter(format!(
                        "{kind}.{name} must be finite"
                    )));
                }
                Ok(f)
            }
        }
    };

    match kind.as_str() {
        "max" | "max_intensity" | "maxintensity" | "mip" => Ok(BlendKind::MaxIntensity),
        "limited_alpha" | "limitedalpha" | "alpha" => Ok(BlendKind::LimitedAlpha {
            m: param("m", LIMITED_ALPHA_M)?,
        }),
        "simple_alpha_fog" | "simplealphafog" | "fog" => Ok(BlendKind::SimpleAlphaFog {
            fog: param("fog", FOG_STRENGTH)?,
            max: param("max", FOG_MAX)?,
        }),
        _ => Err(HyperblendError::validation(format!(
            "unknown blend kind '{kind}'"
        ))),
    }
}

/// Parse a [`BlendSpec`] into a [`BlendKind`].
pub fn parse_blend(spec: &BlendSpec) -> HyperblendResult<BlendKind> {
    parse_blend_kind_params(&spec.kind, &spec.params)
}

#[cfg(test)]
#[path = "../../tests/unit/blend/parse.rs"]
mod tests;
