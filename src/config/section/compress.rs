//! `[compress]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compress]
//! include = ["**/*.{js,html}"]   # Globs relative to the dist directory
//! exclude = ["vendor/**"]        # `.gz`/`.br` files are always excluded
//! threshold = "1KB"              # Skip files smaller than this
//! skip_growing = false           # Don't write siblings that aren't smaller
//!
//! [compress.gzip]
//! level = 9                      # 0..=9
//!
//! [compress.brotli]
//! quality = 11                   # 0..=11
//! window = 22                    # 10..=24 (log2 of the window size)
//! ```

use serde::Deserialize;

use super::{validate_globs, validate_include};
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::parse_size;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Files to precompress.
    pub include: Vec<String>,

    /// Files to leave alone.
    pub exclude: Vec<String>,

    /// Minimum input size, with `B`/`KB`/`MB` suffix.
    pub threshold: String,

    /// Skip writing a sibling that is not smaller than its input.
    pub skip_growing: bool,

    pub gzip: GzipConfig,

    pub brotli: BrotliConfig,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.{js,html}".to_string()],
            exclude: Vec::new(),
            threshold: "0B".to_string(),
            skip_growing: false,
            gzip: GzipConfig::default(),
            brotli: BrotliConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GzipConfig {
    pub level: u32,
}

impl Default for GzipConfig {
    fn default() -> Self {
        Self { level: 9 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrotliConfig {
    pub quality: u32,
    pub window: u32,
}

impl Default for BrotliConfig {
    fn default() -> Self {
        Self {
            quality: 11,
            window: 22,
        }
    }
}

impl CompressConfig {
    pub const INCLUDE: FieldPath = FieldPath::new("compress.include");
    pub const EXCLUDE: FieldPath = FieldPath::new("compress.exclude");
    pub const THRESHOLD: FieldPath = FieldPath::new("compress.threshold");
    pub const GZIP_LEVEL: FieldPath = FieldPath::new("compress.gzip.level");
    pub const BROTLI_QUALITY: FieldPath = FieldPath::new("compress.brotli.quality");
    pub const BROTLI_WINDOW: FieldPath = FieldPath::new("compress.brotli.window");

    /// Threshold in bytes (0 when unparseable; validation reports that case).
    pub fn threshold_bytes(&self) -> u64 {
        parse_size(&self.threshold).unwrap_or(0)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_include(Self::INCLUDE, &self.include, diag);
        validate_globs(Self::EXCLUDE, &self.exclude, diag);

        if parse_size(&self.threshold).is_none() {
            diag.error_with_hint(
                Self::THRESHOLD,
                format!("cannot parse size `{}`", self.threshold),
                "use a number with an optional B, KB or MB suffix",
            );
        }
        if self.gzip.level > 9 {
            diag.error(
                Self::GZIP_LEVEL,
                format!("level {} is out of range 0..=9", self.gzip.level),
            );
        }
        if self.brotli.quality > 11 {
            diag.error(
                Self::BROTLI_QUALITY,
                format!("quality {} is out of range 0..=11", self.brotli.quality),
            );
        }
        if !(10..=24).contains(&self.brotli.window) {
            diag.error(
                Self::BROTLI_WINDOW,
                format!("window {} is out of range 10..=24", self.brotli.window),
            );
        }
    }
}
