// src/main.rs

use anyhow::Result;
use clap::Parser;
use ngx_cache_conv::ConverterConfig;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    // Logs go to stderr so `file` output on stdout stays a clean record
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = ConverterConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::File { file } => commands::cmd_file(&file),
        Commands::FileVersion { file, short } => commands::cmd_file_version(&file, short),
        Commands::Stat { dir } => commands::cmd_stat(&dir, &config, cli.quiet),
        Commands::Convert { dir, keep_going } => {
            commands::cmd_convert(&dir, &config, cli.quiet, keep_going)
        }
    }
}
