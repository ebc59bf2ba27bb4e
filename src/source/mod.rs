//! Log line source.

pub mod tail;

pub use tail::{tail_lines, wait_for_file, LineStream};
