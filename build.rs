// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: cache file
fn file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .value_name("FILE")
        .help("Cache file")
}

/// Common argument: cache directory
fn dir_arg() -> Arg {
    Arg::new("dir")
        .required(true)
        .value_name("DIR")
        .help("Cache directory")
}

fn build_cli() -> Command {
    Command::new("ngx-cache-conv")
        .version(env!("CARGO_PKG_VERSION"))
        .about("nginx cache files converter")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .global(true)
                .help("Configuration file (TOML)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Do not print periodic progress during directory runs"),
        )
        .subcommand(
            Command::new("file")
                .about("Convert single file and pass result to stdout")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("file-version")
                .about("Print version of single cache file")
                .arg(file_arg())
                .arg(
                    Arg::new("short")
                        .short('s')
                        .long("short")
                        .action(ArgAction::SetTrue)
                        .help("Print only the version number"),
                ),
        )
        .subcommand(
            Command::new("stat")
                .about("Collect statistics of file versions in directory")
                .arg(dir_arg()),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert every version 0 file in directory in place")
                .arg(dir_arg())
                .arg(
                    Arg::new("keep_going")
                        .long("keep-going")
                        .action(ArgAction::SetTrue)
                        .help("Skip records that cannot be converted instead of stopping"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("ngx-cache-conv.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
