//! Built-in binding functions.

mod split_at_position;

pub use split_at_position::SplitAtPositionFunction;
