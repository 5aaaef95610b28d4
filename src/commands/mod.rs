// src/commands/mod.rs
//! Command handlers for the ngx-cache-conv CLI

mod batch;
mod file;

pub use batch::{cmd_convert, cmd_stat};
pub use file::{cmd_file, cmd_file_version};
