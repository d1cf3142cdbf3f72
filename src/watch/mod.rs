//! Feed of cluster watch notifications for the binary.

mod json_lines;

pub use json_lines::*;
