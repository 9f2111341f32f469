//! Built-in iterator functions.

mod for_range;
mod split;

pub use for_range::ForIterator;
pub use split::SplitIterator;

/// The maximum number of tuples emitted in one batch by the built-in iterators.
const BATCH_SIZE: usize = 1024;
