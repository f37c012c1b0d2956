/// Convenience result type used across hyperblend.
pub type HyperblendResult<T> = Result<T, HyperblendError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum HyperblendError {
    /// Declared stack shape does not match the slices that were supplied.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A blend law was configured with a parameter that leaves it undefined.
    #[error("invalid blend parameter: {0}")]
    InvalidBlendParameter(String),

    /// A source sample violates the non-negativity assumption of the blend laws.
    #[error("negative sample {value} at channel {channel}, depth {depth}, pixel ({x}, {y})")]
    NegativeSample {
        /// 0-based channel of the offending slice.
        channel: usize,
        /// 1-based depth of the offending slice.
        depth: usize,
        /// Pixel column.
        x: u32,
        /// Pixel row.
        y: u32,
        /// Offending sample value (negative or NaN).
        value: f32,
    },

    /// Compositing was cancelled between depth steps.
    #[error("compositing cancelled after {completed} of {total} depth steps")]
    Cancelled {
        /// Depth steps fully applied before cancellation was observed.
        completed: usize,
        /// Depth steps in the run.
        total: usize,
    },

    /// Invalid user-provided configuration or coordinates.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HyperblendError {
    /// Build a [`HyperblendError::ShapeMismatch`] value.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Build a [`HyperblendError::InvalidBlendParameter`] value.
    pub fn invalid_blend_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidBlendParameter(msg.into())
    }

    /// Build a [`HyperblendError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`HyperblendError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
