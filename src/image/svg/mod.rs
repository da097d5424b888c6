//! SVG minification.
//!
//! # Modules
//!
//! - [`optimize`]: event-level rewrite over quick-xml
//! - [`refs`]: `#id` reference collection for `cleanup_ids`
//!
//! The minifier never re-serializes through a document model, so `id`
//! attributes, `<defs>` and `<symbol>` sprites pass through untouched
//! unless `cleanup_ids` / `remove_useless_defs` are switched on.

mod optimize;
mod refs;

pub use optimize::optimize;
