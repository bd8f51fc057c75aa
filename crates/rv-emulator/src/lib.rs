//! Interpreter for a small RISC-V dialect.
//!
//! The emulator fetches 32-bit instruction words from a [`CodeImage`],
//! decodes them once into a [`DecodedInstruction`], and executes them against
//! a 64-bit register file and a word-addressed stack until the program
//! counter reaches 0, the return-to-host sentinel.

#![no_std]

#[cfg(test)]
extern crate std;

extern crate alloc;

mod config;
mod decoder;
mod emulator;
mod error;
mod executor;
mod helpers;
mod logging;
mod memory;
mod state;

pub use config::{EmulatorConfig, StackPolicy};
pub use decoder::{decode_instruction, BranchCond, DecodedInstruction, IOp, ROp};
pub use emulator::{RvEmulator, StepResult};
pub use error::{EmulatorError, FetchFault, Format, Unsupported};
pub use executor::execute_instruction;
pub use helpers::{
    emulator_from_asm, emulator_from_asm_with_args, emulator_from_words, expect_a0,
    expect_error, expect_ok, expect_register, expect_unsupported,
};
pub use logging::{Effect, InstLog, LogLevel};
pub use memory::{CodeImage, DEFAULT_CODE_BASE};
pub use state::{MachineState, StackLayout, MAX_STACK_WORDS, NREGS, WORD_BYTES};
