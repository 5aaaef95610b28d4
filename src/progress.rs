// src/progress.rs

//! Periodic progress reporting for batch runs
//!
//! A [`ProgressReporter`] owns a background thread that wakes on a fixed
//! interval, takes a snapshot of the shared [`VersionStats`] and hands it to
//! a [`ProgressSink`]. The thread only reads the counters, so the walker is
//! never blocked by reporting.
//!
//! # Example
//!
//! ```ignore
//! use ngx_cache_conv::progress::{ConsoleProgress, ProgressReporter};
//!
//! let walker = BatchWalker::new(options);
//! let reporter = ProgressReporter::spawn(walker.stats(), Duration::from_secs(1), ConsoleProgress)?;
//! walker.run(dir)?;
//! reporter.stop();
//! ```

use crate::batch::{StatsSnapshot, VersionStats};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Destination for periodic snapshots
pub trait ProgressSink: Send + 'static {
    fn report(&mut self, snapshot: &StatsSnapshot);
}

impl<F> ProgressSink for F
where
    F: FnMut(&StatsSnapshot) + Send + 'static,
{
    fn report(&mut self, snapshot: &StatsSnapshot) {
        self(snapshot)
    }
}

/// Prints the interim report to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn report(&mut self, snapshot: &StatsSnapshot) {
        print!("{}", snapshot.render_progress());
    }
}

/// Logs a one-line summary through tracing
///
/// Useful when standard output is not a terminal someone is watching.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, snapshot: &StatsSnapshot) {
        info!(
            "{} files after {:?}: versions {:?}, other {}, converted {}, failed {}",
            snapshot.files,
            snapshot.elapsed,
            snapshot.versions,
            snapshot.unsupported,
            snapshot.converted,
            snapshot.failed
        );
    }
}

/// Handle to the background reporting thread
///
/// Dropping the handle stops the thread.
pub struct ProgressReporter {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Start reporting `stats` to `sink` every `interval`
    pub fn spawn<S: ProgressSink>(
        stats: Arc<VersionStats>,
        interval: Duration,
        mut sink: S,
    ) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("progress".to_string())
            .spawn(move || {
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => sink.report(&stats.snapshot()),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Progress reporter stopped");
            })?;

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
