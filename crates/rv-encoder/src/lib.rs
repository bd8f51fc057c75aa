//! Instruction encoding for the rv-emulator dialect.
//!
//! This crate knows the bit layout of every instruction the emulator accepts.
//! It provides word encoders, field extraction, a disassembler used by the
//! emulator's trace output, and a small text assembler for tests and the
//! host binary.

#![no_std]

#[cfg(test)]
extern crate std;

extern crate alloc;

mod asm;
mod disasm;
mod encode;
pub mod fields;
pub mod opcodes;
mod regs;

pub use asm::{assemble_code, assemble_instruction, assemble_words, AsmError};
pub use disasm::{disassemble_code, disassemble_instruction, disassemble_listing};
pub use encode::*;
pub use regs::Gpr;
