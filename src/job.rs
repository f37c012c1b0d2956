use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use crate::{
    blend::{kind::BlendKind, parse::BlendSpec, parse::parse_blend},
    composite::{
        assemble::CompositeResult,
        engine::{CompositeOpts, composite_with},
        progress::ProgressSink,
    },
    foundation::{
        core::StackShape,
        error::{HyperblendError, HyperblendResult},
    },
    io::{
        decode::{ColorHandling, load_stack},
        encode::{QuantizeOpts, save_composite},
    },
    stack::source::StackSource,
};

/// A complete compositing job: inputs, stack shape, blend law, threading and output.
///
/// Relative input and output paths are resolved against the job file's directory when the
/// job is loaded with [`CompositeJob::from_path`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompositeJob {
    /// Input images in flat (depth-major) order.
    pub inputs: Vec<PathBuf>,
    /// Slice extraction mode.
    #[serde(default)]
    pub color: ColorHandling,
    /// Channels per depth; defaults to 1, or 3 for [`ColorHandling::SplitRgb`].
    #[serde(default)]
    pub channels: Option<usize>,
    /// Depth count; defaults to `slices / channels`.
    #[serde(default)]
    pub depths: Option<usize>,
    /// Blend law.
    #[serde(default)]
    pub blend: BlendSpec,
    /// Parallelize within depth steps.
    #[serde(default)]
    pub parallel: bool,
    /// Worker threads for parallel mode.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Output file.
    pub output: PathBuf,
    /// Output pixel format.
    #[serde(default)]
    pub quantize: QuantizeOpts,
}

impl CompositeJob {
    /// Parse a job from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> HyperblendResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| HyperblendError::serde(format!("parse job JSON: {e}")))
    }

    /// Parse a job from a JSON file, resolving relative paths against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> HyperblendResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            HyperblendError::validation(format!("open job JSON '{}': {e}", path.display()))
        })?;
        let mut job = Self::from_reader(BufReader::new(f))?;
        if let Some(root) = path.parent() {
            job.resolve_relative_to(root);
        }
        Ok(job)
    }

    fn resolve_relative_to(&mut self, root: &Path) {
        for input in &mut self.inputs {
            if input.is_relative() {
                *input = root.join(&*input);
            }
        }
        if self.output.is_relative() {
            self.output = root.join(&self.output);
        }
    }

    /// Check everything that can be checked without decoding the inputs.
    pub fn validate(&self) -> HyperblendResult<BlendKind> {
        if self.inputs.is_empty() {
            return Err(HyperblendError::validation("job needs at least one input"));
        }
        if self.channels == Some(0) {
            return Err(HyperblendError::validation("job channels must be > 0 when set"));
        }
        if self.color == ColorHandling::SplitRgb && self.channels.is_some_and(|c| c != 3) {
            return Err(HyperblendError::validation(
                "split_rgb inputs always have 3 channels",
            ));
        }
        if self.threads == Some(0) {
            return Err(HyperblendError::validation("job threads must be >= 1 when set"));
        }
        self.quantize.validate()?;
        let kind = parse_blend(&self.blend)?;
        kind.compile()?;
        Ok(kind)
    }

    /// Resolve the stack shape for `total_slices` decoded slices.
    pub fn shape_for(&self, total_slices: usize) -> HyperblendResult<StackShape> {
        let channels = self
            .channels
            .unwrap_or(self.color.slices_per_image());
        match self.depths {
            Some(depths) => Ok(StackShape::new(channels, depths)),
            None => StackShape::infer_depths(channels, total_slices),
        }
    }

    /// Threading options for the compositor.
    pub fn opts(&self) -> CompositeOpts {
        CompositeOpts {
            parallel: self.parallel,
            threads: self.threads,
            cancel: None,
        }
    }

    /// Decode inputs, composite, write the output, and return the composite with the
    /// written paths.
    #[tracing::instrument(skip_all, fields(inputs = self.inputs.len()))]
    pub fn run(
        &self,
        progress: &mut dyn ProgressSink,
    ) -> HyperblendResult<(CompositeResult, Vec<PathBuf>)> {
        let kind = self.validate()?;
        let stack = load_stack(&self.inputs, self.color)?;
        let shape = self.shape_for(stack.len())?;
        tracing::info!(
            channels = shape.channels,
            depths = shape.depths,
            width = stack.dims().width,
            height = stack.dims().height,
            "compositing stack"
        );
        let result = composite_with(&stack, shape, kind, &self.opts(), progress)?;
        let written = save_composite(&result, &self.output, &self.quantize)?;
        Ok((result, written))
    }
}

#[cfg(test)]
#[path = "../tests/unit/job.rs"]
mod tests;
