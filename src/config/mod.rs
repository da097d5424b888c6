//! Configuration for `distpress.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [dist], [compress], [imagemin]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # config file discovery
//! └── mod.rs         # ToolConfig (this file)
//! ```
//!
//! The file is optional. Without it every section takes its defaults and
//! the dist directory is resolved against the current directory.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BrotliConfig, CompressConfig, DistConfig, GzipConfig, ImageminConfig, JpegConfig, PngConfig,
    SvgConfig,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use crate::{cli::Cli, log, utils::path::normalize_path};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file name looked up when `--config` is not given.
pub const DEFAULT_CONFIG_NAME: &str = "distpress.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing distpress.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolConfig {
    /// Absolute path to the config file, when one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Dry run: select and list, write nothing (CLI only)
    #[serde(skip)]
    pub dry_run: bool,

    #[serde(default)]
    pub dist: DistConfig,

    #[serde(default)]
    pub compress: CompressConfig,

    #[serde(default)]
    pub imagemin: ImageminConfig,
}

impl ToolConfig {
    /// Load configuration for a CLI invocation.
    ///
    /// The config file is searched upward from cwd; its parent directory
    /// becomes the root. A missing default-named file is fine, a missing
    /// explicitly named one is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = Some(normalize_path(&path));
                config
            }
            None if cli.config != Path::new(DEFAULT_CONFIG_NAME) => {
                return Err(ConfigError::NotFound(cli.config.clone()).into());
            }
            None => Self {
                root: cwd.clone(),
                ..Self::default()
            },
        };

        config.apply_cli(cli, &cwd);
        config.normalize_paths();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Apply CLI overrides. `--dist` is relative to cwd, not to the config file.
    fn apply_cli(&mut self, cli: &Cli, cwd: &Path) {
        crate::logger::set_verbose(cli.verbose);
        self.dry_run = cli.dry_run;

        if let Some(dist) = &cli.dist {
            self.dist.dir = cwd.join(dist);
        }
    }

    /// Resolve the dist directory against the root.
    fn normalize_paths(&mut self) {
        self.dist.dir = normalize_path(&self.root.join(&self.dist.dir));
    }

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.dist.validate(&mut diag);
        self.compress.validate(&mut diag);
        self.imagemin.validate(&mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Dist directory (absolute after loading).
    pub fn dist_dir(&self) -> &Path {
        &self.dist.dir
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Parse config text. Panics on unknown fields to catch typos in tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ToolConfig {
    let (parsed, ignored) = ToolConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Default config pointed at an existing dist directory.
#[cfg(test)]
pub fn test_config_for(dist: &Path) -> ToolConfig {
    let mut config = ToolConfig::default();
    config.root = dist.to_path_buf();
    config.dist.dir = dist.to_path_buf();
    config
}

// ============================================================================
// tests
// ============================================================================
