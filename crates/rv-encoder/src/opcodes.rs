//! Opcode and selector values understood by the emulator.
//!
//! The dialect reuses the standard RISC-V major opcodes but assigns its own
//! meaning to several funct3 values (for example funct3 `0b001` under OP-IMM
//! is an add-immediate rather than a shift). Both the encoder and the
//! emulator's decoder read these constants so the two cannot drift apart.

/// Register-register arithmetic (R-type).
pub const OP: u8 = 0b011_0011;
/// Load-class I-type. Decoded exactly like [`OP_IMM`].
pub const LOAD: u8 = 0b000_0011;
/// Store-class S-type (register move with offset).
pub const STORE: u8 = 0b010_0011;
/// Conditional branches (B-type).
pub const BRANCH: u8 = 0b110_0011;
/// Jump to register.
pub const JALR: u8 = 0b110_0111;
/// Immediate arithmetic (I-type).
pub const OP_IMM: u8 = 0b001_0011;
/// Load upper immediate (U-type).
pub const LUI: u8 = 0b011_0111;
/// Jump and link (J-type).
pub const JAL: u8 = 0b110_1111;

pub mod funct3 {
    /// R-type add/sub/mul group.
    pub const ARITH: u8 = 0b000;
    pub const SRLI: u8 = 0b101;
    pub const ADDI: u8 = 0b001;
    pub const LI: u8 = 0b011;
    /// The only S-type selector.
    pub const MOVE: u8 = 0b000;
    pub const BEQ: u8 = 0b000;
    pub const BNE: u8 = 0b001;
    pub const BLT: u8 = 0b100;
    pub const BGE: u8 = 0b101;
    /// LUI is only accepted when bits [14:12] of the word hold this value.
    pub const LUI: u8 = 0b011;
    /// JAL is only accepted when bits [14:12] of the word hold this value.
    pub const JAL: u8 = 0b000;
}

pub mod funct7 {
    pub const ADD: u8 = 0b000_0000;
    pub const SUB: u8 = 0b010_0000;
    pub const MUL: u8 = 0b000_0001;
}
