//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::task::Task;

/// Post-process a build output directory: precompress assets, optimize images
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Dist directory to post-process (overrides `[dist].dir`)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub dist: Option<PathBuf>,

    /// Config file path (searched upward from the current directory)
    #[arg(short = 'C', long, global = true, default_value = "distpress.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Number of worker threads (default: number of CPUs)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// List the selected files without writing anything
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Print one line per processed file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Task to run (default: all)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available tasks
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Write `.gz` siblings for compressible assets
    #[command(visible_aliases = ["compress", "z"])]
    Gzip,

    /// Write `.br` siblings for compressible assets
    #[command(visible_alias = "b")]
    Brotli,

    /// Losslessly optimize images in place
    #[command(visible_alias = "i")]
    Imagemin,

    /// Run gzip, brotli and imagemin in parallel
    #[command(visible_alias = "a")]
    All,
}

impl Commands {
    /// Tasks this command expands to.
    pub fn tasks(self) -> &'static [Task] {
        match self {
            Self::Gzip => &[Task::Gzip],
            Self::Brotli => &[Task::Brotli],
            Self::Imagemin => &[Task::Imagemin],
            Self::All => &Task::ALL,
        }
    }
}

impl Cli {
    /// Selected command, `all` when none was given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_all() {
        let cli = Cli::try_parse_from(["distpress"]).unwrap();
        assert_eq!(cli.command(), Commands::All);
        assert_eq!(cli.command().tasks(), &Task::ALL);
        assert_eq!(cli.config, PathBuf::from("distpress.toml"));
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_compress_alias() {
        let cli = Cli::try_parse_from(["distpress", "compress"]).unwrap();
        assert_eq!(cli.command(), Commands::Gzip);
        assert_eq!(cli.command().tasks(), &[Task::Gzip]);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["distpress", "imagemin", "-d", "public/app", "-j", "2", "-n"])
                .unwrap();
        assert_eq!(cli.command(), Commands::Imagemin);
        assert_eq!(cli.dist, Some(PathBuf::from("public/app")));
        assert_eq!(cli.jobs, Some(2));
        assert!(cli.dry_run);
    }

    #[test]
    fn test_unknown_task_rejected() {
        assert!(Cli::try_parse_from(["distpress", "minify"]).is_err());
    }
}
