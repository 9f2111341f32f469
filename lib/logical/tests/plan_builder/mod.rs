#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

mod generate;
mod select;
mod test_utils;
