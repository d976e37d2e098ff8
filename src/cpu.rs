//! The staged CPU state machine (`spec.md` §4.7).
//!
//! One call to [`Cpu::tick`] advances exactly one stage: FETCH, DECODE,
//! EXECUTE, MEM, WRITE-BACK, then back to FETCH. Decoding the all-zero
//! `NO_OP` word moves the CPU to [`Stage::Stopped`] instead of EXECUTE, and
//! `tick` becomes a no-op from then on.

use std::io::{self, Write};

use log::{debug, trace};

use crate::alu::alu;
use crate::bus::Bus;
use crate::decode::{decode, ControlFlags, Decoded};
use crate::devices::StdoutDevice;
use crate::error::SimError;
use crate::isa::{PC_REGISTER, RETURN_ADDRESS_REGISTER, STDOUT_BASE};
use crate::memory::{MemoryError, Ram};
use crate::pc::ProgramCounter;
use crate::register_file::RegisterFile;

/// Which stage the CPU will execute on the next [`Cpu::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Decode,
    Execute,
    Mem,
    WriteBack,
    /// Reached by decoding a `NO_OP` word; `tick` is a no-op from here on.
    Stopped,
}

/// The machine: register file, bus (RAM plus devices), program counter,
/// and the latches that carry a single in-flight instruction between
/// stages.
pub struct Cpu<W: Write = io::Stdout> {
    pub registers: RegisterFile,
    pub bus: Bus<W>,
    pub pc: ProgramCounter,
    stage: Stage,
    fetched: u32,
    decoded: Option<Decoded>,
    alu_result: i32,
}

impl Cpu<io::Stdout> {
    /// Build a CPU whose memory is `image` loaded at word 0, zero-padded up
    /// to the STDOUT device's base address, writing to real stdout.
    pub fn new(image: &[i32]) -> Result<Self, MemoryError> {
        let ram = Ram::load(STDOUT_BASE as usize, image)?;
        Ok(Self::with_bus(Bus::new(ram)))
    }

    /// Build a CPU with a driver-configured `max_ram_addr`: RAM occupies
    /// `[0, max_ram_addr)` and the STDOUT device sits immediately above it,
    /// rather than at the architecture's conventional `STDOUT_BASE`
    /// (`spec.md` §6).
    pub fn with_max_ram_addr(image: &[i32], max_ram_addr: u32) -> Result<Self, MemoryError> {
        let ram = Ram::load(max_ram_addr as usize, image)?;
        Ok(Self::with_bus(Bus::with_mmio_base(ram, StdoutDevice::new(), max_ram_addr)))
    }
}

impl<W: Write> Cpu<W> {
    pub fn with_bus(bus: Bus<W>) -> Self {
        Self {
            registers: RegisterFile::new(),
            bus,
            pc: ProgramCounter::new(),
            stage: Stage::Fetch,
            fetched: 0,
            decoded: None,
            alu_result: 0,
        }
    }

    /// Build a CPU around an explicit RAM and STDOUT writer, for tests that
    /// want to inspect or redirect output.
    pub fn with_ram_and_stdout(ram: Ram, stdout: StdoutDevice<W>) -> Self {
        Self::with_bus(Bus::with_stdout(ram, stdout))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_stopped(&self) -> bool {
        self.stage == Stage::Stopped
    }

    /// Advance exactly one stage, returning the stage that just executed
    /// (not the successor `self.stage` is left pointing to).
    pub fn tick(&mut self) -> Result<Stage, SimError> {
        trace!("tick: pc={} stage={:?}", self.pc.get(), self.stage);
        let executed = self.stage;
        match self.stage {
            Stage::Fetch => self.fetch()?,
            Stage::Decode => self.decode_stage()?,
            Stage::Execute => self.execute()?,
            Stage::Mem => self.mem()?,
            Stage::WriteBack => self.write_back()?,
            Stage::Stopped => {}
        }
        Ok(executed)
    }

    /// Run until [`Stage::Stopped`], ticking through every stage of every
    /// instruction in between.
    pub fn run(&mut self) -> Result<(), SimError> {
        while !self.is_stopped() {
            self.tick()?;
        }
        debug!("halted at pc={}", self.pc.get());
        Ok(())
    }

    fn fetch(&mut self) -> Result<(), SimError> {
        self.fetched = self.bus.read(self.pc.get())? as u32;
        self.stage = Stage::Decode;
        Ok(())
    }

    fn decode_stage(&mut self) -> Result<(), SimError> {
        let decoded = decode(self.fetched)?;
        if decoded.flags.is_empty() {
            debug!("NO_OP at pc={}, halting", self.pc.get());
            self.decoded = None;
            self.stage = Stage::Stopped;
            return Ok(());
        }
        self.decoded = Some(decoded);
        self.stage = Stage::Execute;
        Ok(())
    }

    fn execute(&mut self) -> Result<(), SimError> {
        let decoded = self.decoded.expect("EXECUTE reached with no decoded instruction latched");
        let lhs = self.registers.read(decoded.rs1)?;
        let rhs = if decoded.flags.contains(ControlFlags::USE_IMM) {
            decoded.imm
        } else {
            self.registers.read(decoded.rs2)?
        };
        self.alu_result = alu(decoded.flags, lhs, rhs)?;
        self.stage = Stage::Mem;
        Ok(())
    }

    fn mem(&mut self) -> Result<(), SimError> {
        let decoded = self.decoded.expect("MEM reached with no decoded instruction latched");
        if decoded.flags.contains(ControlFlags::MEM_WRITE) {
            let value = self.registers.read(decoded.rs2)?;
            self.bus.write(self.alu_result as u32, value)?;
        } else if decoded.flags.contains(ControlFlags::MEM_READ) {
            self.alu_result = self.bus.read(self.alu_result as u32)?;
        }
        self.stage = Stage::WriteBack;
        Ok(())
    }

    fn write_back(&mut self) -> Result<(), SimError> {
        let decoded = self.decoded.take().expect("WRITE-BACK reached with no decoded instruction latched");

        if decoded.flags.contains(ControlFlags::JAL) {
            self.registers.write(RETURN_ADDRESS_REGISTER, self.pc.get().wrapping_add(1) as i32)?;
            self.pc.jump_relative(decoded.imm);
        } else if decoded.flags.contains(ControlFlags::BRANCH) {
            if self.alu_result != 0 {
                self.pc.jump_relative(decoded.imm);
            } else {
                self.pc.advance();
            }
        } else {
            let diverted_to_pc = decoded.flags.contains(ControlFlags::REG_WRITE) && decoded.rd == PC_REGISTER;
            if decoded.flags.contains(ControlFlags::REG_WRITE) {
                if diverted_to_pc {
                    self.pc.set(self.alu_result as u32);
                } else {
                    self.registers.write(decoded.rd, self.alu_result)?;
                }
            }
            if !diverted_to_pc {
                self.pc.advance();
            }
        }

        self.stage = Stage::Fetch;
        Ok(())
    }
}
