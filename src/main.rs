mod commands;
mod config;
mod elf;
mod errors;
mod image;
mod utils;
use clap::Parser;
use config::Config;
use std::io;
use std::path::PathBuf;
use std::process;

use crate::utils::warn;

/// Converts a statically linked ELF executable into a flat memory image with a boot
/// stub at address zero.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// path to the ELF executable
    input: PathBuf,

    /// path for the image, an existing file is replaced
    output: PathBuf,

    /// boot stub to use, defaults to startup/startup.bin in the directory containing
    /// elf2flat (copy startup/ there after cargo build or cargo install)
    #[arg(long)]
    stub: Option<PathBuf>,

    /// fail if a write changes bytes an earlier write put down
    #[arg(long)]
    strict: bool,

    /// largest image allowed, zero for no limit
    #[arg(long, value_parser = utils::parse_number, default_value_t = config::DEFAULT_MAX_SIZE)]
    max_size: u64,

    /// number of bytes at the start of the image to hex dump
    #[arg(long, default_value_t = 0)]
    dump: usize,

    /// explain the columns in the writes table
    #[arg(long)]
    explain: bool,
}

fn main() {
    utils::generate_style_file();

    let cli = Cli::parse();
    let config = match Config::new(cli.stub, cli.strict, cli.max_size, cli.dump, cli.explain) {
        Ok(config) => config,
        Err(e) => {
            warn(&format!("{e}"));
            process::exit(1);
        }
    };

    if let Err(e) = commands::convert(&cli.input, &cli.output, &config, io::stdout()) {
        warn(&format!("Couldn't convert {}: {e}", cli.input.display()));
        process::exit(1);
    }
}
