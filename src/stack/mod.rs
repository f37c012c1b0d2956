pub(crate) mod indexer;
pub(crate) mod slice;
pub(crate) mod source;
