//! `[dist]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [dist]
//! dir = "dist/my-app"   # Build output to post-process (relative to this file)
//! ```

use serde::Deserialize;
use std::path::PathBuf;

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DistConfig {
    /// Dist directory. Absolute after loading.
    pub dir: PathBuf,
}

impl Default for DistConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dist"),
        }
    }
}

impl DistConfig {
    pub const DIR: FieldPath = FieldPath::new("dist.dir");

    /// The dist directory must exist before anything can be post-processed.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.dir.is_dir() {
            diag.error_with_hint(
                Self::DIR,
                format!("`{}` is not a directory", self.dir.display()),
                "run the build first, or pass --dist <DIR>",
            );
        }
    }
}
