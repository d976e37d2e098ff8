//! Memory-mapped devices (`spec.md` §4.6).
//!
//! A device occupies a small window of the address space and is addressed
//! by [`crate::bus`] with an offset already relative to the device's base,
//! so a device never needs to know where it sits in the global map.

use std::io::{self, Write};

/// A memory-mapped I/O device. Offsets are relative to the device's base
/// address, as assigned by the bus.
pub trait MmioDevice {
    fn read(&mut self, offset: u32) -> i32;
    fn write(&mut self, offset: u32, value: i32);
}

/// The STDOUT device (`spec.md` §4.6): offset 0 appends the low byte of the
/// written value as a character to an internal line buffer; offset 1
/// flushes the buffer to the underlying writer and clears it. Reads
/// always return 0.
pub struct StdoutDevice<W: Write = io::Stdout> {
    buffer: String,
    out: W,
}

impl StdoutDevice<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for StdoutDevice<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutDevice<W> {
    pub fn with_writer(out: W) -> Self {
        Self { buffer: String::new(), out }
    }

    /// The characters written since the last flush, for callers (tests,
    /// the CLI driver) that want to inspect output before it's flushed.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// The underlying writer, for tests that redirect output to a buffer.
    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl<W: Write> MmioDevice for StdoutDevice<W> {
    fn read(&mut self, _offset: u32) -> i32 {
        0
    }

    fn write(&mut self, offset: u32, value: i32) {
        match offset {
            0 => self.buffer.push((value as u8) as char),
            1 => {
                let _ = self.out.write_all(self.buffer.as_bytes());
                let _ = self.out.flush();
                self.buffer.clear();
            }
            _ => {}
        }
    }
}
