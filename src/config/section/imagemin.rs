//! `[imagemin]` section configuration.
//!
//! Lossless, in-place image optimization. An optimized file is only written
//! back when it is strictly smaller than the original.
//!
//! # Example
//!
//! ```toml
//! [imagemin]
//! include = ["**/*.{jpg,jpeg,png,gif,svg}"]
//! exclude = []
//!
//! [imagemin.png]
//! level = 2                   # oxipng preset 0..=6
//!
//! [imagemin.jpeg]
//! strip_exif = false          # Also drop the Exif segment (orientation lives there)
//!
//! [imagemin.svg]
//! cleanup_ids = false         # Keep every id (sprite sheets reference them)
//! remove_useless_defs = false # Keep every <defs> and its children
//! remove_editor_data = true   # Drop sodipodi:/inkscape:/sketch: data
//! remove_metadata = true      # Drop <metadata>
//! remove_comments = true      # Drop comments (except <!--! ... -->)
//! ```

use serde::Deserialize;

use super::{validate_globs, validate_include};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImageminConfig {
    /// Images to optimize.
    pub include: Vec<String>,

    /// Images to leave alone.
    pub exclude: Vec<String>,

    pub png: PngConfig,

    pub jpeg: JpegConfig,

    pub svg: SvgConfig,
}

impl Default for ImageminConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.{jpg,jpeg,png,gif,svg}".to_string()],
            exclude: Vec::new(),
            png: PngConfig::default(),
            jpeg: JpegConfig::default(),
            svg: SvgConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PngConfig {
    /// oxipng preset; 2 matches optipng's default effort.
    pub level: u8,
}

impl Default for PngConfig {
    fn default() -> Self {
        Self { level: 2 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JpegConfig {
    pub strip_exif: bool,
}

/// SVG minifier switches.
///
/// `cleanup_ids` and `remove_useless_defs` default to off: sprite sheets are
/// consumed by `<use href="sprite.svg#name">` from outside the file, so an id
/// that looks unreferenced inside the document is still load-bearing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SvgConfig {
    pub cleanup_ids: bool,
    pub remove_useless_defs: bool,
    pub remove_editor_data: bool,
    pub remove_metadata: bool,
    pub remove_comments: bool,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            cleanup_ids: false,
            remove_useless_defs: false,
            remove_editor_data: true,
            remove_metadata: true,
            remove_comments: true,
        }
    }
}

impl ImageminConfig {
    pub const INCLUDE: FieldPath = FieldPath::new("imagemin.include");
    pub const EXCLUDE: FieldPath = FieldPath::new("imagemin.exclude");
    pub const PNG_LEVEL: FieldPath = FieldPath::new("imagemin.png.level");
    pub const SVG_CLEANUP_IDS: FieldPath = FieldPath::new("imagemin.svg.cleanup_ids");
    pub const SVG_REMOVE_USELESS_DEFS: FieldPath =
        FieldPath::new("imagemin.svg.remove_useless_defs");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_include(Self::INCLUDE, &self.include, diag);
        validate_globs(Self::EXCLUDE, &self.exclude, diag);

        if self.png.level > 6 {
            diag.error(
                Self::PNG_LEVEL,
                format!("level {} is out of range 0..=6", self.png.level),
            );
        }
        if self.svg.cleanup_ids {
            diag.warn(
                Self::SVG_CLEANUP_IDS,
                "ids referenced from other files (sprite sheets) will be removed",
            );
        }
        if self.svg.remove_useless_defs {
            diag.warn(
                Self::SVG_REMOVE_USELESS_DEFS,
                "<defs> children without an id will be removed",
            );
        }
    }
}
