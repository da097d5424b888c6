//! Dist assets: working-set selection and precompression.

mod compress;
mod scan;

pub use compress::{CompressOutcome, Encoding, compress_file, encode};
pub use scan::{Patterns, compile_glob, select_files};
