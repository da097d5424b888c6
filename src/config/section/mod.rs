//! Configuration section definitions.
//!
//! Each module corresponds to a section in `distpress.toml`:
//!
//! | Module     | TOML Section   | Purpose                              |
//! |------------|----------------|--------------------------------------|
//! | `dist`     | `[dist]`       | Directory to post-process            |
//! | `compress` | `[compress]`   | gzip/brotli selection and levels     |
//! | `imagemin` | `[imagemin]`   | Image selection and optimizer flags  |

mod compress;
mod dist;
mod imagemin;

pub use compress::{BrotliConfig, CompressConfig, GzipConfig};
pub use dist::DistConfig;
pub use imagemin::{ImageminConfig, JpegConfig, PngConfig, SvgConfig};

use crate::asset::compile_glob;
use crate::config::{ConfigDiagnostics, FieldPath};

/// Report every glob in `patterns` that does not compile.
fn validate_globs(field: FieldPath, patterns: &[String], diag: &mut ConfigDiagnostics) {
    for pattern in patterns {
        if let Err(e) = compile_glob(pattern) {
            diag.error(field, format!("invalid glob `{pattern}`: {}", e.kind()));
        }
    }
}

/// An include list must select something.
fn validate_include(field: FieldPath, include: &[String], diag: &mut ConfigDiagnostics) {
    if include.is_empty() {
        diag.error_with_hint(
            field,
            "include list is empty",
            "remove the key to use the default patterns",
        );
    }
    validate_globs(field, include, diag);
}
