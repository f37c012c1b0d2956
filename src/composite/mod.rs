pub(crate) mod accumulator;
pub(crate) mod assemble;
pub(crate) mod engine;
pub(crate) mod progress;
