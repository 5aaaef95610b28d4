// src/batch/walker.rs

use super::stats::VersionStats;
use crate::convert::convert_record;
use crate::error::{Error, Result};
use crate::format::{probe_version, Ver3Header};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What a batch run does with each classified file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Classify only
    Stat,
    /// Rewrite version 0 files in place
    Convert,
}

/// Options for a batch run
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub mode: BatchMode,
    /// Skip records that fail to convert instead of aborting the run
    pub continue_on_error: bool,
    /// Appended to a file's path to name its replacement while it is written
    pub temp_suffix: String,
    /// fsync the replacement before renaming it over the original
    pub sync: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            mode: BatchMode::Stat,
            continue_on_error: false,
            temp_suffix: ".tmp".to_string(),
            sync: true,
        }
    }
}

impl BatchOptions {
    pub fn new(mode: BatchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }
}

/// Terminal state of one visited file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Classified and left alone
    Skipped { version: u64 },
    /// Replaced by its version 3 form
    Converted,
    /// Conversion failed and the run continued
    Failed,
    /// Listed but gone by the time it was opened
    Vanished,
}

/// Sequential directory walker that classifies and converts cache files
///
/// Files are handled one at a time on the calling thread. Within each
/// directory, entries are visited in file name order, and a directory is
/// listed completely before any of its files are replaced, so replacement
/// temporaries are never visited themselves.
pub struct BatchWalker {
    options: BatchOptions,
    stats: Arc<VersionStats>,
}

impl BatchWalker {
    pub fn new(options: BatchOptions) -> Self {
        Self::with_stats(options, Arc::new(VersionStats::new()))
    }

    /// Create a walker that records into existing counters
    pub fn with_stats(options: BatchOptions, stats: Arc<VersionStats>) -> Self {
        Self { options, stats }
    }

    /// Shared counters, for handing to a progress reporter
    pub fn stats(&self) -> Arc<VersionStats> {
        Arc::clone(&self.stats)
    }

    /// Visit every regular file under `root`
    ///
    /// Traversal and open errors abort the run, except for files removed
    /// after their directory was listed. Conversion errors abort it too
    /// unless `continue_on_error` is set.
    pub fn run(&self, root: &Path) -> Result<()> {
        info!("Walking {} ({:?})", root.display(), self.options.mode);

        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            self.visit(entry.path())?;
        }

        let snapshot = self.stats.snapshot();
        info!(
            "Walk finished: {} files, {} converted, {} failed in {:?}",
            snapshot.files, snapshot.converted, snapshot.failed, snapshot.elapsed
        );
        Ok(())
    }

    /// Classify one file and, in convert mode, upgrade it
    pub fn visit(&self, path: &Path) -> Result<FileOutcome> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} disappeared before it was visited", path.display());
                return Ok(FileOutcome::Vanished);
            }
            Err(e) => return Err(Error::from(e).at_path(path)),
        };
        let version = probe_version(&mut file).map_err(|e| e.at_path(path))?;
        self.stats.record_version(version);

        if self.options.mode != BatchMode::Convert || version != 0 {
            debug!("Skipping {} (version {})", path.display(), version);
            return Ok(FileOutcome::Skipped { version });
        }

        match self.replace(path, file) {
            Ok(header) => {
                self.stats.record_converted();
                debug!(
                    "Converted {} (etag_len={}, vary_len={})",
                    path.display(),
                    header.etag_len,
                    header.vary_len
                );
                Ok(FileOutcome::Converted)
            }
            Err(e) => {
                self.stats.record_failed();
                let e = e.conversion_failed(path);
                if self.options.continue_on_error && e.is_record_error() {
                    warn!("Skipping unconvertible record: {}", e);
                    Ok(FileOutcome::Failed)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Convert `source` into a temporary sibling and rename it over `path`
    fn replace(&self, path: &Path, source: File) -> Result<Ver3Header> {
        let temp = temp_path(path, &self.options.temp_suffix);
        if fs::symlink_metadata(&temp).is_ok() {
            warn!("Overwriting existing {} while converting {}", temp.display(), path.display());
        }

        let result = self
            .write_replacement(path, source, &temp)
            .and_then(|header| {
                fs::rename(&temp, path)?;
                Ok(header)
            });

        if result.is_err() {
            discard(&temp);
        }
        result
    }

    fn write_replacement(&self, path: &Path, source: File, temp: &Path) -> Result<Ver3Header> {
        let permissions = source.metadata()?.permissions();
        let mut reader = BufReader::new(source);

        let mut writer = BufWriter::new(File::create(temp)?);
        let header = convert_record(&mut reader, &mut writer)?;
        let out = writer.into_inner().map_err(|e| e.into_error())?;

        out.set_permissions(permissions)?;
        if self.options.sync {
            out.sync_all()?;
        }

        debug!("Wrote replacement for {} to {}", path.display(), temp.display());
        Ok(header)
    }
}

/// Path of the replacement written next to `path`
pub fn temp_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn discard(temp: &Path) {
    match fs::remove_file(temp) {
        Ok(()) => debug!("Removed {}", temp.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", temp.display(), e),
    }
}
