//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find the config file by searching upward from the current directory.
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_file_from(&cwd, config_name)
}

/// Find `config_name` in `start` or any of its ancestors.
///
/// An absolute `config_name` is returned as-is when it exists.
///
/// ```text
/// /home/user/site/dist/assets/   ← start
/// /home/user/site/distpress.toml ← found
/// ```
pub fn find_config_file_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}
