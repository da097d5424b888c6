//! Lossless image optimization.
//!
//! # Modules
//!
//! - [`png`]: oxipng recompression
//! - [`jpeg`]: marker-segment rewriting (metadata removal)
//! - [`gif`]: extension-block rewriting (metadata removal)
//! - [`svg`]: markup minification that keeps ids and `<defs>`
//!
//! Every optimizer produces a candidate; the file is replaced only when the
//! candidate is strictly smaller. Raster candidates are decoded before they
//! are accepted.

mod gif;
mod jpeg;
mod png;
pub mod svg;

use std::{fs, io::Cursor, path::Path};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::{config::ImageminConfig, utils::path::write_replace};

/// Image format, resolved from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Svg => "svg",
        }
    }

    const fn is_raster(self) -> bool {
        !matches!(self, Self::Svg)
    }
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("malformed {format}: {reason}")]
    Malformed {
        format: &'static str,
        reason: String,
    },

    #[error("png optimization failed: {0}")]
    Png(#[from] oxipng::PngError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("optimized output does not decode: {0}")]
    Verify(#[from] image::ImageError),

    #[error("optimized output is {got:?}, expected {expected:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        got: (u32, u32),
    },
}

impl OptimizeError {
    pub(crate) fn malformed(format: ImageFormat, reason: impl Into<String>) -> Self {
        Self::Malformed {
            format: format.name(),
            reason: reason.into(),
        }
    }
}

/// What happened to one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    Written { before: u64, after: u64 },
    /// The candidate was not smaller; the file is untouched.
    Skipped { before: u64 },
}

/// Produce an optimized candidate for `data`.
///
/// The candidate may be larger than the input; callers decide whether to keep it.
pub fn optimize_bytes(
    format: ImageFormat,
    data: &[u8],
    config: &ImageminConfig,
) -> Result<Vec<u8>, OptimizeError> {
    let candidate = match format {
        ImageFormat::Png => png::optimize(data, &config.png)?,
        ImageFormat::Jpeg => jpeg::optimize(data, &config.jpeg)?,
        ImageFormat::Gif => gif::optimize(data)?,
        ImageFormat::Svg => svg::optimize(data, &config.svg)?,
    };

    if format.is_raster() {
        verify_raster(data, &candidate)?;
    }
    Ok(candidate)
}

/// Optimize `path` in place, writing only a strictly smaller result.
pub fn optimize_file(path: &Path, config: &ImageminConfig) -> Result<ImageOutcome> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("unsupported image type: {}", path.display()))?;

    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let before = data.len() as u64;

    let candidate = optimize_bytes(format, &data, config)
        .with_context(|| format!("failed to optimize {}", path.display()))?;
    let after = candidate.len() as u64;

    if after >= before {
        return Ok(ImageOutcome::Skipped { before });
    }

    write_replace(path, &candidate, path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(ImageOutcome::Written { before, after })
}

/// Fully decode the candidate and compare its size with the original's.
fn verify_raster(original: &[u8], candidate: &[u8]) -> Result<(), OptimizeError> {
    let decoded = image::ImageReader::new(Cursor::new(candidate))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;
    let got = (decoded.width(), decoded.height());

    let expected = image::ImageReader::new(Cursor::new(original))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_dimensions().ok());

    match expected {
        Some(expected) if expected != got => {
            Err(OptimizeError::DimensionMismatch { expected, got })
        }
        _ => Ok(()),
    }
}

// ============================================================================
// Test fixtures
// ============================================================================

/// Encode a small gradient with the `image` crate.
#[cfg(test)]
pub(crate) fn test_fixture(codec: image::ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, codec)
        .unwrap();
    buf.into_inner()
}
