#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

mod generate;
mod iterator;
mod named;
mod select;
mod template;
mod test_utils;
