//! Instruction word encoders.
//!
//! Immediates use the canonical RISC-V bit placement for every format. Values
//! wider than the field are truncated to the field width; the encoders never
//! fail.

use alloc::vec::Vec;

use crate::{
    opcodes::{self, funct3, funct7},
    Gpr,
};

/// Encode an R-type word.
pub fn r_type(opcode: u8, rd: Gpr, funct3: u8, rs1: Gpr, rs2: Gpr, funct7: u8) -> u32 {
    ((funct7 as u32 & 0x7f) << 25)
        | ((rs2.num() as u32) << 20)
        | ((rs1.num() as u32) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | ((rd.num() as u32) << 7)
        | (opcode as u32 & 0x7f)
}

/// Encode an I-type word. `imm` is truncated to 12 bits.
pub fn i_type(opcode: u8, rd: Gpr, funct3: u8, rs1: Gpr, imm: i32) -> u32 {
    (((imm as u32) & 0xfff) << 20)
        | ((rs1.num() as u32) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | ((rd.num() as u32) << 7)
        | (opcode as u32 & 0x7f)
}

/// Encode an S-type word. `imm` is truncated to 12 bits.
pub fn s_type(opcode: u8, funct3: u8, rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7f) << 25)
        | ((rs2.num() as u32) << 20)
        | ((rs1.num() as u32) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | ((imm & 0x1f) << 7)
        | (opcode as u32 & 0x7f)
}

/// Encode a B-type word. `imm` is a byte offset; bit 0 is dropped.
pub fn b_type(opcode: u8, funct3: u8, rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 12) & 0x1) << 31)
        | (((imm >> 5) & 0x3f) << 25)
        | ((rs2.num() as u32) << 20)
        | ((rs1.num() as u32) << 15)
        | ((funct3 as u32 & 0x7) << 12)
        | (((imm >> 1) & 0xf) << 8)
        | (((imm >> 11) & 0x1) << 7)
        | (opcode as u32 & 0x7f)
}

/// Encode a U-type word. `imm20` is the value of bits [31:12].
pub fn u_type(opcode: u8, rd: Gpr, imm20: u32) -> u32 {
    ((imm20 & 0xfffff) << 12) | ((rd.num() as u32) << 7) | (opcode as u32 & 0x7f)
}

/// Encode a J-type word. `imm` is a byte offset; bit 0 is dropped.
pub fn j_type(opcode: u8, rd: Gpr, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3ff) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 12) & 0xff) << 12)
        | ((rd.num() as u32) << 7)
        | (opcode as u32 & 0x7f)
}

/// `rd = rs1 + rs2`
pub fn add(rd: Gpr, rs1: Gpr, rs2: Gpr) -> u32 {
    r_type(opcodes::OP, rd, funct3::ARITH, rs1, rs2, funct7::ADD)
}

/// `rd = rs1 - rs2`
pub fn sub(rd: Gpr, rs1: Gpr, rs2: Gpr) -> u32 {
    r_type(opcodes::OP, rd, funct3::ARITH, rs1, rs2, funct7::SUB)
}

/// `rd = rs1 * rs2`
pub fn mul(rd: Gpr, rs1: Gpr, rs2: Gpr) -> u32 {
    r_type(opcodes::OP, rd, funct3::ARITH, rs1, rs2, funct7::MUL)
}

/// `rd = rs1 >> shamt` (logical)
pub fn srli(rd: Gpr, rs1: Gpr, shamt: i32) -> u32 {
    i_type(opcodes::OP_IMM, rd, funct3::SRLI, rs1, shamt)
}

/// `rd = rs1 + imm`
pub fn addi(rd: Gpr, rs1: Gpr, imm: i32) -> u32 {
    i_type(opcodes::OP_IMM, rd, funct3::ADDI, rs1, imm)
}

/// `rd = imm`
pub fn li(rd: Gpr, imm: i32) -> u32 {
    i_type(opcodes::OP_IMM, rd, funct3::LI, Gpr::ZERO, imm)
}

/// S-type move: `rs1 = rs2 + imm`. Written `sb rs2, imm(rs1)` in assembly.
pub fn sb(rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
    s_type(opcodes::STORE, funct3::MOVE, rs1, rs2, imm)
}

pub fn beq(rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
    b_type(opcodes::BRANCH, funct3::BEQ, rs1, rs2, imm)
}

pub fn bne(rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
    b_type(opcodes::BRANCH, funct3::BNE, rs1, rs2, imm)
}

pub fn blt(rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
    b_type(opcodes::BRANCH, funct3::BLT, rs1, rs2, imm)
}

pub fn bge(rs1: Gpr, rs2: Gpr, imm: i32) -> u32 {
    b_type(opcodes::BRANCH, funct3::BGE, rs1, rs2, imm)
}

/// Load upper immediate. The emulator only accepts words whose bits [14:12]
/// equal [`funct3::LUI`], i.e. `imm20 & 0x7 == 0b011`.
pub fn lui(rd: Gpr, imm20: u32) -> u32 {
    u_type(opcodes::LUI, rd, imm20)
}

/// Jump and link. The emulator only accepts offsets whose bits [14:12] are zero.
pub fn jal(rd: Gpr, imm: i32) -> u32 {
    j_type(opcodes::JAL, rd, imm)
}

/// Jump to the address held in `rs1`.
pub fn jalr(rd: Gpr, rs1: Gpr, imm: i32) -> u32 {
    i_type(opcodes::JALR, rd, 0, rs1, imm)
}

/// `jalr zero, ra, 0`
pub fn ret() -> u32 {
    jalr(Gpr::ZERO, Gpr::RA, 0)
}

/// Lay out instruction words as little-endian bytes.
pub fn encode_program(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}
