use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use rayon::prelude::*;

use crate::{
    blend::kind::{BlendFunction, BlendKind},
    composite::{
        accumulator::Accumulator,
        assemble::{CompositeResult, assemble},
        progress::{NoProgress, ProgressSink},
    },
    foundation::{
        core::{SliceDims, StackShape},
        error::{HyperblendError, HyperblendResult},
    },
    stack::{indexer::StackIndexer, source::StackSource},
};

/// Threading and cancellation controls for a compositing run.
#[derive(Clone, Debug, Default)]
pub struct CompositeOpts {
    /// Blend channels and pixel rows of each depth step on a rayon pool.
    ///
    /// Depth steps themselves always run one after another.
    pub parallel: bool,
    /// Optional explicit worker thread count (parallel mode only).
    pub threads: Option<usize>,
    /// Cooperative cancellation flag, checked before every depth step.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Collapse a hyperstack into one composite image per channel.
///
/// Depths are visited farthest first (`depths` down to 1); within each depth every channel's
/// slice is widened to `f32` and blended pixel by pixel into that channel's accumulator.
pub fn composite<S>(
    stack: &S,
    shape: StackShape,
    blend: BlendKind,
) -> HyperblendResult<CompositeResult>
where
    S: StackSource + ?Sized,
{
    composite_with(stack, shape, blend, &CompositeOpts::default(), &mut NoProgress)
}

/// [`composite`] with explicit threading, cancellation and progress reporting.
///
/// Every check (blend parameters, slice count, slice dimensions, sample signs) runs before
/// the first accumulator is touched. The progress sink is called once per depth step with
/// `(depths - depth + 1, depths)`; its errors are logged and ignored.
#[tracing::instrument(
    skip_all,
    fields(channels = shape.channels, depths = shape.depths, blend = blend.name())
)]
pub fn composite_with<S>(
    stack: &S,
    shape: StackShape,
    blend: BlendKind,
    opts: &CompositeOpts,
    progress: &mut dyn ProgressSink,
) -> HyperblendResult<CompositeResult>
where
    S: StackSource + ?Sized,
{
    let func = blend.compile()?;
    let indexer = StackIndexer::new(shape, stack.len())?;
    let dims = stack.dims();
    validate_slices(stack, &indexer, dims)?;

    if shape.is_degenerate() {
        tracing::debug!("degenerate stack; returning an empty composite");
        return assemble(
            dims,
            Accumulator::zeroed_set(dims, shape.channels),
            shape.channels,
        );
    }

    let pool = if opts.parallel {
        Some(build_thread_pool(opts.threads)?)
    } else {
        None
    };

    let started = std::time::Instant::now();
    let mut accumulators = Accumulator::zeroed_set(dims, shape.channels);
    let mut scratch = Scratch::new(dims, if pool.is_some() { shape.channels } else { 1 });
    let total = shape.depths;

    for (step, depth) in indexer.depths_back_to_front().enumerate() {
        if is_cancelled(opts) {
            tracing::debug!(completed = step, total, "compositing cancelled");
            return Err(HyperblendError::Cancelled {
                completed: step,
                total,
            });
        }

        match &pool {
            None => blend_depth_sequential(
                stack,
                &indexer,
                depth,
                &func,
                &mut scratch,
                &mut accumulators,
            )?,
            Some(pool) => blend_depth_parallel(
                stack,
                &indexer,
                depth,
                &func,
                &mut scratch,
                &mut accumulators,
                pool,
            )?,
        }

        let completed = total - depth + 1;
        tracing::trace!(depth, completed, total, "depth step blended");
        if let Err(e) = progress.report(completed, total) {
            tracing::warn!(error = %e, "progress sink failed; continuing");
        }
    }

    tracing::debug!(elapsed = ?started.elapsed(), "composite finished");
    assemble(dims, accumulators, shape.channels)
}

fn validate_slices<S>(stack: &S, indexer: &StackIndexer, dims: SliceDims) -> HyperblendResult<()>
where
    S: StackSource + ?Sized,
{
    for index in 0..stack.len() {
        let slice = stack.slice_at(index)?;
        let coord = indexer.coord_of(index)?;
        if slice.dims() != dims {
            return Err(HyperblendError::shape_mismatch(format!(
                "slice {coord} is {}x{}, stack is {}x{}",
                slice.dims().width,
                slice.dims().height,
                dims.width,
                dims.height
            )));
        }
        if let Some((offset, value)) = slice.first_invalid_sample() {
            let (x, y) = dims.coords(offset);
            return Err(HyperblendError::NegativeSample {
                channel: coord.channel,
                depth: coord.depth,
                x,
                y,
                value,
            });
        }
    }
    Ok(())
}

/// Widened source samples for the channels of one depth step.
struct Scratch {
    buffers: Vec<Vec<f32>>,
}

impl Scratch {
    fn new(dims: SliceDims, count: usize) -> Self {
        Self {
            buffers: vec![vec![0.0; dims.pixel_count()]; count],
        }
    }
}

fn blend_depth_sequential<S>(
    stack: &S,
    indexer: &StackIndexer,
    depth: usize,
    func: &BlendFunction,
    scratch: &mut Scratch,
    accumulators: &mut [Accumulator],
) -> HyperblendResult<()>
where
    S: StackSource + ?Sized,
{
    let buf = &mut scratch.buffers[0];
    for (channel, acc) in accumulators.iter_mut().enumerate() {
        let slice = stack.slice_at(indexer.linear_index(channel, depth)?)?;
        slice.widen_into(buf.as_mut_slice())?;
        func.apply_row(buf.as_slice(), acc.data_mut());
    }
    Ok(())
}

fn blend_depth_parallel<S>(
    stack: &S,
    indexer: &StackIndexer,
    depth: usize,
    func: &BlendFunction,
    scratch: &mut Scratch,
    accumulators: &mut [Accumulator],
    pool: &rayon::ThreadPool,
) -> HyperblendResult<()>
where
    S: StackSource + ?Sized,
{
    // Slices are read on the calling thread so `StackSource` need not be `Sync`.
    for (channel, buf) in scratch.buffers.iter_mut().enumerate() {
        let slice = stack.slice_at(indexer.linear_index(channel, depth)?)?;
        slice.widen_into(buf)?;
    }

    pool.install(|| {
        accumulators
            .par_iter_mut()
            .zip(scratch.buffers.par_iter())
            .for_each(|(acc, src)| {
                let width = (acc.dims().width as usize).max(1);
                acc.data_mut()
                    .par_chunks_mut(width)
                    .zip(src.par_chunks(width))
                    .for_each(|(dest, src)| func.apply_row(src, dest));
            });
    });
    Ok(())
}

fn is_cancelled(opts: &CompositeOpts) -> bool {
    opts.cancel
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

fn build_thread_pool(threads: Option<usize>) -> HyperblendResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(HyperblendError::validation(
            "composite threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| HyperblendError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/composite/engine.rs"]
mod tests;
