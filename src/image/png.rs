//! PNG recompression with oxipng.

use oxipng::{Options, StripChunks};

use super::OptimizeError;
use crate::config::PngConfig;

/// Recompress with the configured preset, dropping only chunks that do not
/// affect rendering.
pub fn optimize(data: &[u8], config: &PngConfig) -> Result<Vec<u8>, OptimizeError> {
    let mut options = Options::from_preset(config.level);
    options.strip = StripChunks::Safe;
    Ok(oxipng::optimize_from_memory(data, &options)?)
}
