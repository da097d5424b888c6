//! Per-task counters and the summary line.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::Task;
use crate::{
    log,
    utils::{format_size, plural_count},
};

/// Counters updated concurrently by the workers of one task.
#[derive(Debug)]
pub struct TaskReport {
    task: Task,
    selected: usize,
    written: AtomicUsize,
    skipped: AtomicUsize,
    bytes_before: AtomicU64,
    bytes_after: AtomicU64,
}

impl TaskReport {
    pub fn new(task: Task, selected: usize) -> Self {
        Self {
            task,
            selected,
            written: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            bytes_before: AtomicU64::new(0),
            bytes_after: AtomicU64::new(0),
        }
    }

    pub fn record_written(&self, before: u64, after: u64) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.bytes_before.fetch_add(before, Ordering::Relaxed);
        self.bytes_after.fetch_add(after, Ordering::Relaxed);
    }

    /// A skipped file counts with its unchanged size on both sides.
    pub fn record_skipped(&self, before: u64) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.bytes_before.fetch_add(before, Ordering::Relaxed);
        self.bytes_after.fetch_add(before, Ordering::Relaxed);
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn bytes_before(&self) -> u64 {
        self.bytes_before.load(Ordering::Relaxed)
    }

    pub fn bytes_after(&self) -> u64 {
        self.bytes_after.load(Ordering::Relaxed)
    }

    /// `12 files, 341.2 KB → 88.0 KB (2 skipped)`
    pub fn summary(&self) -> String {
        if self.selected == 0 {
            return "no files selected".to_string();
        }
        let mut line = format!(
            "{}, {} → {}",
            plural_count(self.written(), "file"),
            format_size(self.bytes_before()),
            format_size(self.bytes_after()),
        );
        let skipped = self.skipped();
        if skipped > 0 {
            line.push_str(&format!(" ({skipped} skipped)"));
        }
        line
    }

    pub fn log_summary(&self) {
        log!(self.task.name(); "{}", self.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_summary() {
        let report = TaskReport::new(Task::Gzip, 3);
        report.record_written(2048, 512);
        report.record_written(1024, 512);
        report.record_skipped(10);

        assert_eq!(report.written(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.bytes_before(), 3082);
        assert_eq!(report.bytes_after(), 1034);
        assert_eq!(report.summary(), "2 files, 3.0 KB → 1.0 KB (1 skipped)");
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(TaskReport::new(Task::Imagemin, 0).summary(), "no files selected");
    }

    #[test]
    fn test_concurrent_updates() {
        let report = TaskReport::new(Task::Brotli, 800);
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        report.record_written(10, 5);
                    }
                });
            }
        });
        assert_eq!(report.written(), 800);
        assert_eq!(report.bytes_after(), 4000);
    }
}
