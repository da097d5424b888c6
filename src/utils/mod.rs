//! Small helpers shared across tasks.

pub mod path;
pub mod size;

pub use size::{format_size, parse_size, plural_count};
