// src/lib.rs

//! nginx cache file converter
//!
//! Migrates nginx disk cache files from the legacy header layout
//! (version 0, nginx before 1.7.3) to the version 3 layout, which adds a
//! version tag, the ETag, a copy of the Vary header and the variant key.
//!
//! # Architecture
//!
//! - `format`: version probe and bit-exact header codecs
//! - `headers`: parser for the response headers stored inside a record
//! - `variant`: nginx-compatible variant key (MD5 over Vary-listed headers)
//! - `convert`: single record conversion and version 3 passthrough
//! - `batch`: directory walker, per-version statistics, in-place replacement
//! - `progress`: periodic snapshot reporting for batch runs
//! - `config`: optional TOML configuration

pub mod batch;
pub mod config;
pub mod convert;
mod error;
pub mod format;
pub mod headers;
pub mod progress;
pub mod variant;

pub use batch::{BatchMode, BatchOptions, BatchWalker, FileOutcome, StatsSnapshot, VersionStats};
pub use config::ConverterConfig;
pub use convert::{convert_record, convert_stream, StreamAction};
pub use error::{Error, Result};
pub use format::{probe_version, Ver0Header, Ver3Header, MAX_VERSION};
pub use progress::{ConsoleProgress, LogProgress, ProgressReporter, ProgressSink};
