//! Path normalization utilities.
//!
//! - `normalize_path` - absolute form of a user-supplied path
//! - `relative_slash` - dist-relative path with `/` separators, for glob matching and logs
//! - `write_replace` - replace a file's contents without exposing a partial write

use std::{
    fs,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use tempfile::NamedTempFile;

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Path of `path` relative to `base`, joined with `/` on every platform.
///
/// Falls back to the full path when `path` is not under `base`.
pub fn relative_slash(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// Write `bytes` to `target` through a temp file in the same directory.
///
/// Readers see the old contents or the new ones, never a partial file.
/// The result takes the permissions of `like` when it exists.
pub fn write_replace(target: &Path, bytes: &[u8], like: &Path) -> io::Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    if let Ok(meta) = fs::metadata(like) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
