// src/commands/batch.rs
//! Directory commands (stat, convert)

use anyhow::{Context, Result};
use ngx_cache_conv::{
    BatchMode, BatchWalker, ConsoleProgress, ConverterConfig, ProgressReporter, StatsSnapshot,
};
use std::path::Path;
use tracing::warn;

/// Walk `dir` with the given mode and return the final counters
fn run_batch(
    dir: &Path,
    config: &ConverterConfig,
    mode: BatchMode,
    keep_going: bool,
    quiet: bool,
) -> Result<StatsSnapshot> {
    let mut options = config.batch_options(mode);
    options.continue_on_error |= keep_going;

    let walker = BatchWalker::new(options);

    let reporter = if config.report.enabled && !quiet {
        Some(
            ProgressReporter::spawn(walker.stats(), config.report_interval(), ConsoleProgress)
                .context("Failed to start progress reporter")?,
        )
    } else {
        None
    };

    let result = walker.run(dir);
    if let Some(reporter) = reporter {
        reporter.stop();
    }
    if let Err(e) = result {
        let label = if e.is_conversion_error() {
            "Conversion error"
        } else {
            "Cannot walk"
        };
        return Err(anyhow::Error::new(e).context(label));
    }

    Ok(walker.stats().snapshot())
}

/// Count files per header version
pub fn cmd_stat(dir: &Path, config: &ConverterConfig, quiet: bool) -> Result<()> {
    let snapshot = run_batch(dir, config, BatchMode::Stat, false, quiet)?;
    print!("{}", snapshot.render_summary());
    Ok(())
}

/// Convert every version 0 file under `dir` in place
pub fn cmd_convert(
    dir: &Path,
    config: &ConverterConfig,
    quiet: bool,
    keep_going: bool,
) -> Result<()> {
    let snapshot = run_batch(dir, config, BatchMode::Convert, keep_going, quiet)?;
    print!("{}", snapshot.render_summary());
    println!("Converted: {}", snapshot.converted);

    if snapshot.failed > 0 {
        println!("Failed: {}", snapshot.failed);
        warn!("{} files were left at version 0", snapshot.failed);
        anyhow::bail!("{} files could not be converted", snapshot.failed);
    }
    Ok(())
}
