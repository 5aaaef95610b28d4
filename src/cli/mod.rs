// src/cli/mod.rs
//! CLI definitions for the nginx cache converter
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! Single file commands:
//! - `file` - Convert one file to standard output
//! - `file-version` - Print the header version of one file
//!
//! Directory commands:
//! - `stat` - Count files per header version
//! - `convert` - Convert every version 0 file in place

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ngx-cache-conv")]
#[command(author, version)]
#[command(about = "nginx cache files converter", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not print periodic progress during directory runs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert single file and pass result to stdout
    File {
        /// Old version cache file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print version of single cache file
    FileVersion {
        /// Cache file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print only the version number
        #[arg(short, long)]
        short: bool,
    },

    /// Collect statistics of file versions in directory
    Stat {
        /// Cache directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Convert every version 0 file in directory in place
    Convert {
        /// Cache directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Skip records that cannot be converted instead of stopping
        #[arg(long)]
        keep_going: bool,
    },
}
