// src/batch/mod.rs
//! Batch classification and in-place conversion of cache directories
//!
//! A batch run walks a cache directory tree, probes every regular file for
//! its header version and records the result in [`VersionStats`]. In
//! convert mode each version 0 file is rewritten through a temporary
//! sibling (`<path>.tmp`) that is flushed, synced and renamed over the
//! original, so a crash leaves either the old or the new record in place.

mod stats;
mod walker;

pub use stats::{StatsSnapshot, VersionStats};
pub use walker::{temp_path, BatchMode, BatchOptions, BatchWalker, FileOutcome};
