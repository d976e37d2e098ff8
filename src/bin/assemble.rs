//! `assemble <source> [<dest>]`: the two-pass assembler's command-line
//! front end (`spec.md` §6).
//!
//! With `<dest>` omitted, only diagnostics are produced: the source is
//! assembled and any error reported, but no image is written anywhere.
//!
//! Exit codes: `0` on success, `1` if the source fails to assemble, `2` on
//! an I/O error reading the source or writing the image.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

/// Assemble a `.s` source file into a binary instruction image.
#[derive(Debug, Parser)]
#[command(name = "assemble", version, about)]
struct Args {
    /// Assembly source file.
    source: PathBuf,

    /// Output image path. Omit to only check the source for errors.
    dest: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let text = match std::fs::read_to_string(&args.source) {
        Ok(text) => text,
        Err(err) => {
            error!("reading {}: {err}", args.source.display());
            return ExitCode::from(2);
        }
    };

    let image = match stagedvm::assembler::assemble(&text) {
        Ok(image) => image,
        Err(err) => {
            error!("{}: {err}", args.source.display());
            return ExitCode::from(1);
        }
    };

    let Some(dest) = args.dest else {
        info!("{} assembles cleanly, no destination given", args.source.display());
        return ExitCode::SUCCESS;
    };

    let bytes = stagedvm::assembler::image_to_bytes(&image);
    if let Err(err) = std::fs::write(&dest, &bytes) {
        error!("writing {}: {err}", dest.display());
        return ExitCode::from(2);
    }

    info!("wrote {} ({} bytes) from {}", dest.display(), bytes.len(), args.source.display());
    ExitCode::SUCCESS
}
