// src/commands/file.rs
//! Single file commands (file, file-version)

use anyhow::{Context, Result};
use ngx_cache_conv::{convert_stream, probe_version, Error, StreamAction};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open file: {}", path.display()))?;
    Ok(BufReader::new(file))
}

/// Write a file to standard output in version 3 form
pub fn cmd_file(path: &Path) -> Result<()> {
    let mut source = open(path)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match convert_stream(&mut source, &mut out) {
        Ok(StreamAction::PassedThrough { bytes }) => {
            info!("{} is already version 3, copied {} bytes", path.display(), bytes);
        }
        Ok(StreamAction::Converted { header, body_bytes }) => {
            info!(
                "Converted {} (etag_len={}, vary_len={}, {} bytes after header)",
                path.display(),
                header.etag_len,
                header.vary_len,
                body_bytes
            );
        }
        Err(e @ Error::UnsupportedVersion(_)) => return Err(e.into()),
        Err(e) => return Err(e).context("Conversion error"),
    }

    out.flush().context("Cannot write output")?;
    Ok(())
}

/// Print the header version of a file
pub fn cmd_file_version(path: &Path, short: bool) -> Result<()> {
    let mut source = open(path)?;
    let version = probe_version(&mut source).context("Cannot read file version")?;

    if short {
        println!("{}", version);
    } else {
        println!("File version: {}", version);
    }
    Ok(())
}
