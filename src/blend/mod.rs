pub(crate) mod kind;
pub(crate) mod parse;
