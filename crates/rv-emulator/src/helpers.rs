//! Helper functions for testing programs in the emulator dialect.
//!
//! The `expect_*` functions panic with disassembly and the trace buffer when
//! the program does not behave as expected.

use alloc::{format, string::String};

use rv_encoder::{assemble_code, encode_program, AsmError, Gpr};

use crate::{
    emulator::RvEmulator,
    error::{EmulatorError, Unsupported},
    logging::LogLevel,
    memory::{CodeImage, DEFAULT_CODE_BASE},
};

/// Create an emulator from assembly code, entering at the first instruction.
pub fn emulator_from_asm(asm: &str) -> Result<RvEmulator, AsmError> {
    emulator_from_asm_with_args(asm, [0; 4])
}

/// Create an emulator from assembly code with A0-A3 preset to `args`.
pub fn emulator_from_asm_with_args(asm: &str, args: [i64; 4]) -> Result<RvEmulator, AsmError> {
    let code = assemble_code(asm)?;
    Ok(debug_emulator(CodeImage::at_default_base(code), args))
}

/// Create an emulator from encoded instruction words.
pub fn emulator_from_words(words: &[u32]) -> RvEmulator {
    debug_emulator(CodeImage::at_default_base(encode_program(words)), [0; 4])
}

fn debug_emulator(image: CodeImage, args: [i64; 4]) -> RvEmulator {
    RvEmulator::new(image, DEFAULT_CODE_BASE, args).with_log_level(LogLevel::Instructions)
}

fn assemble_or_panic(asm: &str) -> RvEmulator {
    match emulator_from_asm(asm) {
        Ok(emu) => emu,
        Err(e) => panic!("Failed to assemble code: {}\n\nCode:\n{}", e, asm),
    }
}

/// Format error with disassembly and logs.
fn format_error(emu: &RvEmulator, error: &EmulatorError) -> String {
    let mut result = String::from("=== RISC-V Execution Error ===\n\n");
    result.push_str(&format!("Error: {}\n", error));
    if let Some(pc) = error.pc() {
        result.push_str(&format!("PC: 0x{:08x}\n", pc));
    }
    result.push('\n');
    result.push_str(&emu.format_debug_info(error.pc(), 10));
    result
}

/// Run to completion, panicking with debug output on failure.
pub fn expect_ok(asm: &str) -> RvEmulator {
    let mut emu = assemble_or_panic(asm);
    if let Err(e) = emu.run() {
        panic!("{}", format_error(&emu, &e));
    }
    emu
}

/// Expect code to run successfully and leave `expected` in `reg`.
pub fn expect_register(asm: &str, reg: Gpr, expected: i64) {
    let emu = expect_ok(asm);
    let actual = emu.get_register(reg);
    if actual != expected {
        panic!(
            "Register {} mismatch: expected {}, got {}\n\n{}\nCode:\n{}",
            reg,
            expected,
            actual,
            emu.dump_state(),
            asm
        );
    }
}

/// Expect code to run successfully and return `expected` in A0.
pub fn expect_a0(asm: &str, expected: i64) {
    expect_register(asm, Gpr::A0, expected);
}

/// Expect code to fail with an error accepted by `check`.
pub fn expect_error<F>(asm: &str, check: F) -> EmulatorError
where
    F: FnOnce(&EmulatorError) -> bool,
{
    let mut emu = assemble_or_panic(asm);
    match emu.run() {
        Ok(a0) => panic!(
            "Expected error but execution returned {}\n\nCode:\n{}",
            a0, asm
        ),
        Err(e) if check(&e) => e,
        Err(e) => panic!("Error check failed\n{}", format_error(&emu, &e)),
    }
}

/// Expect code to stop on an unsupported instruction, returning the reason.
pub fn expect_unsupported(asm: &str) -> Unsupported {
    match expect_error(asm, |e| {
        matches!(e, EmulatorError::UnsupportedInstruction { .. })
    }) {
        EmulatorError::UnsupportedInstruction { reason, .. } => reason,
        other => panic!("unexpected error {}", other),
    }
}
