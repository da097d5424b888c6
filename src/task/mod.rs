//! Task runner.
//!
//! A run goes through four steps:
//!
//! ```text
//! plan     select the working set of every task (walk + globs)
//!   │
//! rewrite  imagemin; files in parallel
//!   │
//! derive   gzip and brotli at once, reading the rewritten files
//!   │
//! report   one summary line per task, then the first error
//! ```
//!
//! Planning finishes before anything is written, so siblings produced by
//! one task are never picked up by another in the same run.

mod report;
#[cfg(test)]
mod tests;

pub use report::TaskReport;

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{Result, anyhow};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::{
    asset::{CompressOutcome, Encoding, Patterns, compress_file, select_files},
    config::ToolConfig,
    debug,
    image::{ImageOutcome, optimize_file},
    log,
    logger::ProgressLine,
    utils::{format_size, path::relative_slash, plural_count},
};

/// A unit of post-processing work over the dist directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    Gzip,
    Brotli,
    Imagemin,
}

impl Task {
    pub const ALL: [Task; 3] = [Task::Gzip, Task::Brotli, Task::Imagemin];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Brotli => "brotli",
            Self::Imagemin => "imagemin",
        }
    }

    const fn encoding(self) -> Option<Encoding> {
        match self {
            Self::Gzip => Some(Encoding::Gzip),
            Self::Brotli => Some(Encoding::Brotli),
            Self::Imagemin => None,
        }
    }

    const fn stage(self) -> Stage {
        match self {
            Self::Imagemin => Stage::Rewrite,
            Self::Gzip | Self::Brotli => Stage::Derive,
        }
    }

    /// Selection globs. Encoded siblings never feed a compression task.
    fn patterns(self, config: &ToolConfig) -> Result<Patterns> {
        match self {
            Self::Gzip | Self::Brotli => Ok(Patterns::new(
                &config.compress.include,
                &config.compress.exclude,
            )?
            .skip_extensions(Encoding::ALL_SUFFIXES)),
            Self::Imagemin => Patterns::new(&config.imagemin.include, &config.imagemin.exclude),
        }
    }
}

/// Ordering of tasks within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Rewrites selected files in place.
    Rewrite,
    /// Writes new files derived from the selected ones.
    Derive,
}

/// The files one task will process.
#[derive(Debug, Clone)]
pub struct Plan {
    pub task: Task,
    pub files: Vec<PathBuf>,
}

/// Select the working set of `task`.
pub fn plan(task: Task, config: &ToolConfig) -> Result<Plan> {
    let patterns = task.patterns(config)?;
    let files = select_files(config.dist_dir(), &patterns)?;
    debug!(task.name(); "selected {}", plural_count(files.len(), "file"));
    Ok(Plan { task, files })
}

/// Process every file of `plan` in parallel. The first failure stops the task.
pub fn execute(
    plan: &Plan,
    config: &ToolConfig,
    progress: Option<&ProgressLine>,
) -> Result<TaskReport> {
    let report = TaskReport::new(plan.task, plan.files.len());
    let has_error = AtomicBool::new(false);
    let first_error = Mutex::new(None);

    let result = plan.files.par_iter().try_for_each(|path| {
        if has_error.load(Ordering::Relaxed) {
            return Err(());
        }
        if let Err(e) = process_file(plan.task, path, config, &report) {
            // workers racing past a failure only see `Err(())`; keep the real one
            if !has_error.swap(true, Ordering::Relaxed) {
                *first_error.lock() = Some(e);
            }
            return Err(());
        }
        if let Some(p) = progress {
            p.inc(plan.task.name());
        }
        Ok(())
    });

    match result {
        Ok(()) => Ok(report),
        Err(()) => Err(first_error
            .into_inner()
            .unwrap_or_else(|| anyhow!("{} aborted", plan.task.name()))),
    }
}

fn process_file(task: Task, path: &Path, config: &ToolConfig, report: &TaskReport) -> Result<()> {
    let rel = relative_slash(path, config.dist_dir());

    let (before, after) = match task.encoding() {
        Some(encoding) => match compress_file(path, encoding, &config.compress)? {
            CompressOutcome::Written { before, after } => (before, Some(after)),
            CompressOutcome::Skipped { before } => (before, None),
        },
        None => match optimize_file(path, &config.imagemin)? {
            ImageOutcome::Written { before, after } => (before, Some(after)),
            ImageOutcome::Skipped { before } => (before, None),
        },
    };

    match after {
        Some(after) => {
            report.record_written(before, after);
            debug!(task.name(); "{} {} → {}", rel, format_size(before), format_size(after));
        }
        None => {
            report.record_skipped(before);
            debug!(task.name(); "{} skipped", rel);
        }
    }
    Ok(())
}

/// Run `task` alone.
pub fn run(task: Task, config: &ToolConfig) -> Result<()> {
    run_all(config, &[task])
}

/// Run `tasks` against the dist directory.
///
/// Tasks of the same stage run concurrently. In-place rewrites finish
/// before any sibling is derived, so a `.gz`/`.br` always matches the file
/// next to it. Every task runs to completion or to its own first failure;
/// the first failing task's error is returned, later ones are logged.
pub fn run_all(config: &ToolConfig, tasks: &[Task]) -> Result<()> {
    let plans = tasks
        .iter()
        .map(|&task| plan(task, config))
        .collect::<Result<Vec<_>>>()?;

    if config.dry_run {
        list_plans(&plans, config);
        return Ok(());
    }

    let progress = create_progress(&plans);
    let run_stage = |stage: Stage| -> Vec<(usize, Result<TaskReport>)> {
        plans
            .par_iter()
            .enumerate()
            .filter(|(_, plan)| plan.task.stage() == stage)
            .map(|(i, plan)| (i, execute(plan, config, progress.as_ref())))
            .collect()
    };
    let mut results = run_stage(Stage::Rewrite);
    results.extend(run_stage(Stage::Derive));
    results.sort_by_key(|(i, _)| *i);
    if let Some(progress) = progress {
        progress.finish();
    }

    let mut first_error = None;
    for (plan, (_, result)) in plans.iter().zip(results) {
        match result {
            Ok(report) => report.log_summary(),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => log!("error"; "{}: {:#}", plan.task.name(), e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn create_progress(plans: &[Plan]) -> Option<ProgressLine> {
    if plans.iter().all(|p| p.files.is_empty()) {
        return None;
    }
    let counters: Vec<_> = plans
        .iter()
        .map(|p| (p.task.name(), p.files.len()))
        .collect();
    Some(ProgressLine::new(&counters))
}

fn list_plans(plans: &[Plan], config: &ToolConfig) {
    for plan in plans {
        for file in &plan.files {
            log!(plan.task.name(); "{}", relative_slash(file, config.dist_dir()));
        }
        log!(plan.task.name(); "{} selected (dry run)", plural_count(plan.files.len(), "file"));
    }
}
