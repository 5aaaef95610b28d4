// src/batch/stats.rs

//! Per-version counters shared between the walker and the progress reporter
//!
//! Only the walker writes; the reporter reads point-in-time snapshots.
//! Relaxed atomics are enough because the numbers are advisory.

use crate::format::{is_supported, MAX_VERSION};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const BUCKETS: usize = MAX_VERSION as usize + 1;

/// Aggregate counts for one batch run
#[derive(Debug)]
pub struct VersionStats {
    started: Instant,
    files: AtomicU64,
    versions: [AtomicU64; BUCKETS],
    unsupported: AtomicU64,
    converted: AtomicU64,
    failed: AtomicU64,
}

impl Default for VersionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            files: AtomicU64::new(0),
            versions: Default::default(),
            unsupported: AtomicU64::new(0),
            converted: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Count a classified file under its version tag
    pub fn record_version(&self, version: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        match self.versions.get(version as usize) {
            Some(bucket) if is_supported(version) => {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.unsupported.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_converted(&self) {
        self.converted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            elapsed: self.started.elapsed(),
            files: self.files.load(Ordering::Relaxed),
            versions: std::array::from_fn(|i| self.versions[i].load(Ordering::Relaxed)),
            unsupported: self.unsupported.load(Ordering::Relaxed),
            converted: self.converted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`VersionStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub elapsed: Duration,
    /// Regular files classified so far
    pub files: u64,
    /// Files per version tag, indexed by version
    pub versions: [u64; BUCKETS],
    /// Files whose tag is above the highest known version
    pub unsupported: u64,
    pub converted: u64,
    pub failed: u64,
}

impl StatsSnapshot {
    /// Count for one version tag
    pub fn count(&self, version: u64) -> u64 {
        self.versions.get(version as usize).copied().unwrap_or(0)
    }

    /// Share of all classified files, rounded down
    pub fn percent(&self, count: u64) -> u64 {
        if self.files == 0 {
            return 0;
        }
        count * 100 / self.files
    }

    /// Interim report printed while a walk is running
    pub fn render_progress(&self) -> String {
        let mut out = self.render_head();
        for (version, count) in self.versions.iter().enumerate() {
            let _ = writeln!(out, " {}:\t{}", version, count);
        }
        if self.unsupported > 0 {
            let _ = writeln!(out, " other:\t{}", self.unsupported);
        }
        out.push_str("---\n");
        out
    }

    /// Final report with percentages
    pub fn render_summary(&self) -> String {
        let mut out = self.render_head();
        for (version, &count) in self.versions.iter().enumerate() {
            let _ = writeln!(out, " {}:\t{} ({}%)", version, count, self.percent(count));
        }
        if self.unsupported > 0 {
            let _ = writeln!(
                out,
                " other:\t{} ({}%)",
                self.unsupported,
                self.percent(self.unsupported)
            );
        }
        out
    }

    fn render_head(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Time spent: {:?}", self.elapsed);
        let _ = writeln!(out, "Files processed: {}", self.files);
        out.push_str("Versions stats:\n");
        out
    }
}
