//! Opcode dispatch and per-format decoding.

use rv_encoder::{
    fields::{funct3, funct7, imm_b, imm_i, imm_j, imm_s, imm_u, opcode, rd, rs1, rs2},
    opcodes::{self, funct3 as f3, funct7 as f7},
    Gpr,
};

use crate::error::{Format, Unsupported};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ROp {
    Add,
    Sub,
    Mul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IOp {
    /// Logical shift right by the immediate.
    Srli,
    Addi,
    /// Load the immediate itself.
    Li,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCond {
    Eq,
    Ne,
    Lt,
    Ge,
}

impl BranchCond {
    /// Signed comparison of two register values.
    pub fn holds(self, a: i64, b: i64) -> bool {
        match self {
            BranchCond::Eq => a == b,
            BranchCond::Ne => a != b,
            BranchCond::Lt => a < b,
            BranchCond::Ge => a >= b,
        }
    }
}

/// A fully validated instruction, one variant per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedInstruction {
    R { op: ROp, rd: Gpr, rs1: Gpr, rs2: Gpr },
    I { op: IOp, rd: Gpr, rs1: Gpr, imm: i64 },
    /// `rs1 = rs2 + imm`; a register move, not a memory store.
    S { rs1: Gpr, rs2: Gpr, imm: i64 },
    B { cond: BranchCond, rs1: Gpr, rs2: Gpr, imm: i64 },
    U { rd: Gpr, imm: i64 },
    J { rd: Gpr, imm: i64 },
    Jalr { rs1: Gpr },
}

impl DecodedInstruction {
    pub fn format(&self) -> Format {
        match self {
            DecodedInstruction::R { .. } => Format::R,
            DecodedInstruction::I { .. } => Format::I,
            DecodedInstruction::S { .. } => Format::S,
            DecodedInstruction::B { .. } => Format::B,
            DecodedInstruction::U { .. } => Format::U,
            DecodedInstruction::J { .. } => Format::J,
            DecodedInstruction::Jalr { .. } => Format::Jalr,
        }
    }
}

impl Format {
    /// Map an opcode to its format. `None` for anything outside the supported set.
    pub fn from_opcode(opcode: u8) -> Option<Format> {
        match opcode {
            opcodes::OP => Some(Format::R),
            opcodes::LOAD | opcodes::OP_IMM => Some(Format::I),
            opcodes::STORE => Some(Format::S),
            opcodes::BRANCH => Some(Format::B),
            opcodes::JALR => Some(Format::Jalr),
            opcodes::LUI => Some(Format::U),
            opcodes::JAL => Some(Format::J),
            _ => None,
        }
    }
}

/// Decode an instruction word, rejecting any opcode/funct3/funct7 combination
/// the emulator does not implement.
pub fn decode_instruction(iw: u32) -> Result<DecodedInstruction, Unsupported> {
    let op = opcode(iw);
    let format = Format::from_opcode(op).ok_or(Unsupported::Opcode(op))?;
    let bad_funct3 = || Unsupported::Funct3 {
        format,
        funct3: funct3(iw),
    };

    match format {
        Format::R => {
            let op = match (funct3(iw), funct7(iw)) {
                (f3::ARITH, f7::ADD) => ROp::Add,
                (f3::ARITH, f7::SUB) => ROp::Sub,
                (f3::ARITH, f7::MUL) => ROp::Mul,
                (f3::ARITH, other) => {
                    return Err(Unsupported::Funct7 {
                        funct3: f3::ARITH,
                        funct7: other,
                    })
                }
                _ => return Err(bad_funct3()),
            };
            Ok(DecodedInstruction::R {
                op,
                rd: rd(iw),
                rs1: rs1(iw),
                rs2: rs2(iw),
            })
        }
        Format::I => {
            let op = match funct3(iw) {
                f3::SRLI => IOp::Srli,
                f3::ADDI => IOp::Addi,
                f3::LI => IOp::Li,
                _ => return Err(bad_funct3()),
            };
            Ok(DecodedInstruction::I {
                op,
                rd: rd(iw),
                rs1: rs1(iw),
                imm: imm_i(iw),
            })
        }
        Format::S => match funct3(iw) {
            f3::MOVE => Ok(DecodedInstruction::S {
                rs1: rs1(iw),
                rs2: rs2(iw),
                imm: imm_s(iw),
            }),
            _ => Err(bad_funct3()),
        },
        Format::B => {
            let cond = match funct3(iw) {
                f3::BEQ => BranchCond::Eq,
                f3::BNE => BranchCond::Ne,
                f3::BLT => BranchCond::Lt,
                f3::BGE => BranchCond::Ge,
                _ => return Err(bad_funct3()),
            };
            Ok(DecodedInstruction::B {
                cond,
                rs1: rs1(iw),
                rs2: rs2(iw),
                imm: imm_b(iw),
            })
        }
        Format::U => match funct3(iw) {
            f3::LUI => Ok(DecodedInstruction::U {
                rd: rd(iw),
                imm: imm_u(iw),
            }),
            _ => Err(bad_funct3()),
        },
        Format::J => match funct3(iw) {
            f3::JAL => Ok(DecodedInstruction::J {
                rd: rd(iw),
                imm: imm_j(iw),
            }),
            _ => Err(bad_funct3()),
        },
        Format::Jalr => Ok(DecodedInstruction::Jalr { rs1: rs1(iw) }),
    }
}
