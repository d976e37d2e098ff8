//! Instruction set tables.
//!
//! Opcode values are fixed by `original_source/instructions.py`, the
//! prototype this architecture was distilled from, and are carried
//! unchanged so that binary images produced by either implementation agree
//! bit-for-bit.

/// Width, in bits, of the opcode field (`spec.md` §3).
pub const OPCODE_BITS: u32 = 7;
/// Width, in bits, of a register address field.
pub const REG_BITS: u32 = 6;
/// Width, in bits, of an I/B-type immediate field.
pub const IMM_BITS: u32 = 11;
/// Width, in bits, of a JAL immediate field.
pub const JAL_IMM_BITS: u32 = 24;

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 32;
/// Register hard-wired to zero; writes to it are dropped.
pub const ZERO_REGISTER: u8 = 0;
/// Register that, on write-back, diverts its value into the PC instead
/// (used for indirect jumps, e.g. function return).
pub const PC_REGISTER: u8 = 29;
/// Conventional stack-pointer register.
pub const STACK_POINTER_REGISTER: u8 = 30;
/// Conventional return-address register (written by `JAL`).
pub const RETURN_ADDRESS_REGISTER: u8 = 31;

/// Word address at which the assembler's `.data` section begins, and the
/// offset added to a data-label reference used as an immediate.
pub const DATA_BASE: u32 = 1000;
/// Size, in words, of the `.text` image region (`[0, TEXT_SIZE)`).
pub const TEXT_SIZE: usize = 1000;
/// Size, in words, of the `.data` image region (`[DATA_BASE, DATA_BASE +
/// DATA_SIZE)`).
pub const DATA_SIZE: usize = 1000;

/// Word address of the memory-mapped STDOUT device, immediately past the
/// `.data` region.
pub const STDOUT_BASE: u32 = (DATA_BASE as usize + DATA_SIZE) as u32;
/// STDOUT has two addressable offsets: 0 appends a character, 1 flushes
/// the accumulated line and clears it (`spec.md` §4.6).
pub const STDOUT_SIZE: u32 = 2;

/// Opcodes of the architecture (`spec.md` §3).
///
/// The high nybble distinguishes the instruction class (R-type, I-type,
/// branch, load/store, jump); the low bits distinguish the variant within
/// a class. `NO_OP` is both "no operation" and the halt sentinel.
pub mod opcode {
    pub const NO_OP: u8 = 0b00_0000;
    pub const ADD: u8 = 0b00_1000;
    pub const SUB: u8 = 0b00_1001;
    pub const MUL: u8 = 0b00_1010;
    pub const SHL: u8 = 0b00_1011;
    pub const SHR: u8 = 0b00_1100;
    pub const SLT: u8 = 0b00_1101;

    pub const ADDI: u8 = 0b01_1000;
    pub const SUBI: u8 = 0b01_1001;
    pub const MULI: u8 = 0b01_1010;
    pub const SHLI: u8 = 0b01_1011;
    pub const SHRI: u8 = 0b01_1100;
    pub const SLTI: u8 = 0b01_1101;

    pub const BEQ: u8 = 0b11_0000;
    pub const BNE: u8 = 0b11_0001;
    pub const BGE: u8 = 0b11_0010;
    pub const BLT: u8 = 0b11_0011;

    pub const LW: u8 = 0b10_0000;
    pub const SW: u8 = 0b10_0010;

    pub const JAL: u8 = 0b00_0001;
}
