//! Address-space multiplexer between [`crate::memory::Ram`] and the
//! memory-mapped devices (`spec.md` §4.5, §4.6).
//!
//! Grounded on the teacher's `hart/memory.rs`, which special-cases a UART
//! address inside what is otherwise a flat memory read/write path; here the
//! special case is generalised into an explicit STDOUT window above `.data`.

use thiserror::Error;

use crate::devices::StdoutDevice;
use crate::isa::STDOUT_BASE;
use crate::memory::{MemoryError, Ram};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Routes a word address to RAM or to the STDOUT device: addresses below
/// `mmio_base` hit RAM, addresses at or above it hit the device
/// (`spec.md` §6: "RAM `[0, max_ram_addr]`, MMIO at offsets above
/// `max_ram_addr`").
pub struct Bus<W: std::io::Write = std::io::Stdout> {
    pub ram: Ram,
    pub stdout: StdoutDevice<W>,
    mmio_base: u32,
}

impl Bus<std::io::Stdout> {
    pub fn new(ram: Ram) -> Self {
        Self::with_mmio_base(ram, StdoutDevice::new(), STDOUT_BASE)
    }
}

impl<W: std::io::Write> Bus<W> {
    pub fn with_stdout(ram: Ram, stdout: StdoutDevice<W>) -> Self {
        Self::with_mmio_base(ram, stdout, STDOUT_BASE)
    }

    /// Build a bus with an explicit MMIO window boundary, for drivers that
    /// configure their own `max_ram_addr` instead of the architecture's
    /// conventional `STDOUT_BASE`.
    pub fn with_mmio_base(ram: Ram, stdout: StdoutDevice<W>, mmio_base: u32) -> Self {
        Self { ram, stdout, mmio_base }
    }

    pub fn read(&mut self, address: u32) -> Result<i32, BusError> {
        if address >= self.mmio_base {
            Ok(self.stdout.read(address - self.mmio_base))
        } else {
            Ok(self.ram.read(address)?)
        }
    }

    pub fn write(&mut self, address: u32, value: i32) -> Result<(), BusError> {
        if address >= self.mmio_base {
            self.stdout.write(address - self.mmio_base, value);
            Ok(())
        } else {
            Ok(self.ram.write(address, value)?)
        }
    }
}
