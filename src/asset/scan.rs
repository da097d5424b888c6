//! Working-set selection: walk the dist directory and match globs.
//!
//! Globs are matched against the dist-relative path with `/` separators.
//! `*` does not cross directories, `**` does, and `{a,b}` alternation is
//! supported, so `*` selects top-level files only while `**/*.{js,html}`
//! selects at any depth.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;

use crate::utils::path::relative_slash;

/// Compile one glob with the matching rules used for every selection.
pub fn compile_glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

/// Compiled include/exclude globs.
#[derive(Debug, Clone)]
pub struct Patterns {
    include: GlobSet,
    exclude: GlobSet,
    skip_suffixes: &'static [&'static str],
}

impl Patterns {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: build_set(include)?,
            exclude: build_set(exclude)?,
            skip_suffixes: &[],
        })
    }

    /// Also reject files whose extension is one of `suffixes`, whatever the globs say.
    pub fn skip_extensions(mut self, suffixes: &'static [&'static str]) -> Self {
        self.skip_suffixes = suffixes;
        self
    }

    /// Check a dist-relative, `/`-separated path.
    pub fn is_match(&self, rel: &str) -> bool {
        if self.has_skipped_extension(rel) {
            return false;
        }
        self.include.is_match(rel) && !self.exclude.is_match(rel)
    }

    fn has_skipped_extension(&self, rel: &str) -> bool {
        Path::new(rel)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.skip_suffixes
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(ext))
            })
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = compile_glob(pattern).with_context(|| format!("invalid glob `{pattern}`"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect the files under `root` selected by `patterns`, sorted.
///
/// Hidden entries (`.DS_Store`, `.cache/`) are skipped. Any walk error
/// aborts the selection.
pub fn select_files(root: &Path, patterns: &Patterns) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort(true).skip_hidden(false) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let rel = relative_slash(&path, root);
        if is_hidden(&rel) {
            continue;
        }
        if patterns.is_match(&rel) {
            files.push(path);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Any component of the dist-relative path starts with a dot.
fn is_hidden(rel: &str) -> bool {
    rel.split('/').any(|part| part.starts_with('.'))
}
