//! `run <image> [--max-ram-addr N] [--stack-pointer N]`: loads a binary
//! instruction image and runs it to completion on stdout (`spec.md` §6).
//!
//! `--max-ram-addr` wires the RAM/MMIO boundary the Bus uses, in place of
//! the architecture's conventional `STDOUT_BASE`. `--stack-pointer`
//! pre-seeds r30 before the first tick, the driver duty `spec.md` §6 calls
//! out by name.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use stagedvm::isa::STACK_POINTER_REGISTER;

/// Run a binary instruction image produced by `assemble`.
#[derive(Debug, Parser)]
#[command(name = "run", version, about)]
struct Args {
    /// Binary instruction image.
    image: PathBuf,

    /// Word address where RAM ends and the STDOUT device begins. Defaults
    /// to the architecture's conventional STDOUT_BASE.
    #[arg(long)]
    max_ram_addr: Option<u32>,

    /// Initial value for the stack-pointer register (r30).
    #[arg(long)]
    stack_pointer: Option<i32>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let bytes = match std::fs::read(&args.image) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!("reading {}: {err}", args.image.display());
            return ExitCode::from(2);
        }
    };

    let image = stagedvm::assembler::image_from_bytes(&bytes);
    let cpu_result = match args.max_ram_addr {
        Some(max_ram_addr) => stagedvm::cpu::Cpu::with_max_ram_addr(&image, max_ram_addr),
        None => stagedvm::cpu::Cpu::new(&image),
    };
    let mut cpu = match cpu_result {
        Ok(cpu) => cpu,
        Err(err) => {
            error!("loading {}: {err}", args.image.display());
            return ExitCode::from(2);
        }
    };

    if let Some(stack_pointer) = args.stack_pointer {
        cpu.registers.write(STACK_POINTER_REGISTER, stack_pointer).expect("r30 is a valid register index");
    }

    match cpu.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
