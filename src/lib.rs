//! hyperblend collapses a multi-channel 3-D image stack into one composite image per channel.
//!
//! A hyperstack is a flat, depth-major sequence of 2-D slices: every channel of depth 1, then
//! every channel of depth 2, and so on. Compositing walks the depths back to front (painter's
//! order) and folds each slice into a per-channel `f32` accumulator with a configurable blend
//! law.
//!
//! # Pipeline overview
//!
//! 1. **Index**: [`StackIndexer`] validates `channels * depths` against the slice count and maps
//!    `(channel, depth)` to flat positions.
//! 2. **Blend**: a [`BlendKind`] is compiled into a [`BlendFunction`] (max-intensity, limited
//!    alpha, or simple alpha fog).
//! 3. **Composite**: [`composite`] / [`composite_with`] blend every slice, farthest depth first,
//!    reporting progress once per depth step.
//! 4. **Assemble**: the accumulators become a [`CompositeResult`], unclamped `f32` per channel.
//!
//! Image decoding ([`load_stack`]) and PNG output ([`save_composite`]) are thin collaborators
//! around the numeric core; quantizing the `f32` composite is the caller's explicit choice.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod blend;
mod composite;
mod foundation;
mod io;
mod job;
mod stack;

pub use blend::kind::{BlendFunction, BlendKind, FOG_MAX, FOG_STRENGTH, LIMITED_ALPHA_M};
pub use blend::parse::{BlendSpec, parse_blend, parse_blend_kind_params};
pub use composite::assemble::{CompositeChannel, CompositeResult};
pub use composite::engine::{CompositeOpts, composite, composite_with};
pub use composite::progress::{NoProgress, ProgressSink, TracingProgress, progress_fraction};
pub use foundation::core::{SliceDims, StackCoord, StackShape};
pub use foundation::error::{HyperblendError, HyperblendResult};
pub use io::decode::{ColorHandling, image_to_slices, load_image_slices, load_stack};
pub use io::encode::{QuantizeOpts, QuantizePolicy, channel_path, quantize_channel, save_composite};
pub use job::CompositeJob;
pub use stack::indexer::StackIndexer;
pub use stack::slice::{SampleData, Slice};
pub use stack::source::{InMemoryStack, StackSource};
