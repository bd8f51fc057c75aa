//! Error types for the emulator.

use core::fmt;

use thiserror::Error;

use crate::state::NREGS;

/// Instruction format selected by the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
    Jalr,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::R => "R-type",
            Format::I => "I-type",
            Format::S => "S-type",
            Format::B => "B-type",
            Format::U => "U-type",
            Format::J => "J-type",
            Format::Jalr => "JALR",
        };
        f.write_str(name)
    }
}

/// The field that made an instruction word unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unsupported {
    #[error("unknown opcode 0x{0:02x}")]
    Opcode(u8),
    #[error("unsupported {format} funct3 0b{funct3:03b}")]
    Funct3 { format: Format, funct3: u8 },
    #[error("unsupported R-type funct7 0x{funct7:02x} (funct3 0b{funct3:03b})")]
    Funct7 { funct3: u8, funct7: u8 },
}

/// Why an instruction fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchFault {
    #[error("address is not 4-byte aligned")]
    Unaligned,
    #[error("address is outside the loaded image")]
    OutOfImage,
}

/// Errors that can occur during emulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmulatorError {
    /// The word at `pc` is not part of the supported instruction set.
    #[error("Unsupported instruction 0x{instruction:08x} at PC 0x{pc:08x}: {reason}")]
    UnsupportedInstruction {
        pc: u64,
        instruction: u32,
        reason: Unsupported,
        regs: [i64; NREGS],
    },
    #[error("Instruction fetch at 0x{address:08x} failed: {kind}")]
    InstructionFetch {
        address: u64,
        kind: FetchFault,
        regs: [i64; NREGS],
    },
    /// Only raised under [`StackPolicy::Checked`](crate::StackPolicy::Checked).
    #[error(
        "Stack pointer 0x{sp:08x} left the stack region [0x{low:08x}, 0x{high:08x}] at PC 0x{pc:08x}"
    )]
    StackOverflow {
        sp: u64,
        low: u64,
        high: u64,
        pc: u64,
        regs: [i64; NREGS],
    },
    /// Host-side stack inspection outside the stack region.
    #[error("Stack access at 0x{address:08x} is outside the stack region")]
    StackAccess { address: u64 },
    #[error(
        "Instruction limit exceeded: executed {executed} instructions (limit: {limit}) at PC 0x{pc:08x}"
    )]
    InstructionLimitExceeded {
        limit: u64,
        executed: u64,
        pc: u64,
        regs: [i64; NREGS],
    },
    /// Address 0 is the return sentinel and cannot hold code.
    #[error("Code image base address must be non-zero")]
    ZeroImageBase,
    /// The image would extend past the top of the address space.
    #[error("Code image of {len} bytes at 0x{base:08x} does not fit in the address space")]
    ImageOutOfRange { base: u64, len: usize },
    #[error("Stack of {words} words at 0x{base:08x} does not fit in the address space (limit {limit} words)")]
    InvalidStackLayout { base: u64, words: usize, limit: usize },
}

impl EmulatorError {
    /// PC where the error occurred, if it happened while executing.
    pub fn pc(&self) -> Option<u64> {
        match self {
            EmulatorError::UnsupportedInstruction { pc, .. }
            | EmulatorError::StackOverflow { pc, .. }
            | EmulatorError::InstructionLimitExceeded { pc, .. } => Some(*pc),
            EmulatorError::InstructionFetch { address, .. } => Some(*address),
            EmulatorError::StackAccess { .. }
            | EmulatorError::ZeroImageBase
            | EmulatorError::ImageOutOfRange { .. }
            | EmulatorError::InvalidStackLayout { .. } => None,
        }
    }

    /// Register file snapshot at the time of the error.
    pub fn regs(&self) -> Option<&[i64; NREGS]> {
        match self {
            EmulatorError::UnsupportedInstruction { regs, .. }
            | EmulatorError::InstructionFetch { regs, .. }
            | EmulatorError::StackOverflow { regs, .. }
            | EmulatorError::InstructionLimitExceeded { regs, .. } => Some(regs),
            EmulatorError::StackAccess { .. }
            | EmulatorError::ZeroImageBase
            | EmulatorError::ImageOutOfRange { .. }
            | EmulatorError::InvalidStackLayout { .. } => None,
        }
    }
}
