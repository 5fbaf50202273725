//! boxamine - byte-order examine
//!
//! Entry point that handles CLI argument parsing, prepares the session and
//! switches between batch commands and the interactive REPL.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use boxamine::analysis::loader::LoadedBinary;
use boxamine::app::{parse_address, EndianSetting, Session};
use boxamine::ui::cli::{run_batch, run_cli};

/// boxamine: examine memory and display it in a specific byte order
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Executable image to examine (PE/ELF/Mach-O)
    #[arg(short, long, conflicts_with = "raw")]
    target: Option<PathBuf>,

    /// Flat memory image to examine
    #[arg(long)]
    raw: Option<PathBuf>,

    /// Load address of the flat image
    #[arg(long, requires = "raw")]
    base: Option<String>,

    /// Process to attach to
    #[arg(short, long)]
    pid: Option<u32>,

    /// Target byte order
    #[arg(short, long, value_enum, default_value_t = EndianSetting::Auto)]
    endian: EndianSetting,

    /// Run a command and exit instead of starting the REPL (repeatable)
    #[arg(short = 'x', long = "execute", value_name = "COMMAND")]
    execute: Vec<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    // 1. Parse command line arguments
    let args = Args::parse();

    // 2. Initialize logger with verbosity level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    ))
    .init();

    log::info!("boxamine v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Args: {:?}", args);

    // 3. Prepare the session
    let mut session = Session::new();
    session.endian = args.endian;

    if let Some(path) = &args.target {
        session.binary = Some(LoadedBinary::from_file(path)?);
    }
    if let Some(path) = &args.raw {
        let base_str = args.base.as_deref().unwrap_or("0");
        let base = parse_address(base_str)
            .ok_or_else(|| anyhow!("Invalid base address '{}'", base_str))?;
        session.binary = Some(LoadedBinary::raw_from_file(path, base)?);
    }
    if let Some(pid) = args.pid {
        session.debugger.attach(pid)?;
    }

    // 4. Batch or interactive
    let result = if args.execute.is_empty() {
        run_cli(&mut session)
    } else {
        run_batch(&mut session, &args.execute)
    };

    if session.debugger.is_active() {
        if let Err(e) = session.debugger.detach() {
            log::warn!("{}", e);
        }
    }

    result
}
