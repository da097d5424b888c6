//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `relative_slash`, `write_replace`)

pub mod fs;

pub use fs::{normalize_path, relative_slash, write_replace};
