//! Per-instruction execution trace.

use core::fmt;

use rv_encoder::{disassemble_instruction, Gpr};

/// Logging verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// No logging.
    #[default]
    None,
    /// Only log errors.
    Errors,
    /// Keep a rolling buffer of executed instructions.
    Instructions,
    /// Like `Instructions`, and also forward every entry to `log::debug!`.
    Verbose,
}

/// What an instruction did to the machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// R-type arithmetic, ADDI and SRLI.
    Arithmetic {
        rd: Gpr,
        rs1_val: i64,
        /// `None` for immediate forms.
        rs2_val: Option<i64>,
        rd_old: i64,
        rd_new: i64,
    },
    /// LI and LUI.
    Immediate { rd: Gpr, rd_old: i64, rd_new: i64 },
    /// S-type move into `rs1`.
    Move {
        rs1: Gpr,
        rs2_val: i64,
        rs1_old: i64,
        rs1_new: i64,
    },
    Branch {
        rs1_val: i64,
        rs2_val: i64,
        taken: bool,
        target_pc: u64,
    },
    /// JAL links into `rd`; JALR has no link register.
    Jump {
        link: Option<(Gpr, i64, i64)>,
        target_pc: u64,
    },
}

/// Log entry for a single instruction execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstLog {
    pub cycle: u64,
    pub pc: u64,
    pub instruction: u32,
    pub effect: Effect,
}

impl InstLog {
    pub fn new(cycle: u64, pc: u64, instruction: u32, effect: Effect) -> Self {
        Self {
            cycle,
            pc,
            instruction,
            effect,
        }
    }
}

impl fmt::Display for InstLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:4}] 0x{:08x}: {}",
            self.cycle,
            self.pc,
            disassemble_instruction(self.instruction)
        )?;

        match &self.effect {
            Effect::Arithmetic {
                rd,
                rs1_val,
                rs2_val,
                rd_old,
                rd_new,
            } => {
                write!(f, "\n    {}: {} -> {}", rd, rd_old, rd_new)?;
                match rs2_val {
                    Some(rs2_val) => write!(f, " (rs1={}, rs2={})", rs1_val, rs2_val),
                    None => write!(f, " (rs1={})", rs1_val),
                }
            }
            Effect::Immediate { rd, rd_old, rd_new } => {
                write!(f, "\n    {}: {} -> {}", rd, rd_old, rd_new)
            }
            Effect::Move {
                rs1,
                rs2_val,
                rs1_old,
                rs1_new,
            } => write!(
                f,
                "\n    {}: {} -> {} (rs2={})",
                rs1, rs1_old, rs1_new, rs2_val
            ),
            Effect::Branch {
                rs1_val,
                rs2_val,
                taken,
                target_pc,
            } => {
                if *taken {
                    write!(f, "\n    branch taken: 0x{:08x} -> 0x{:08x}", self.pc, target_pc)?;
                } else {
                    write!(f, "\n    branch not taken")?;
                }
                write!(f, " (rs1={}, rs2={})", rs1_val, rs2_val)
            }
            Effect::Jump { link, target_pc } => {
                if let Some((rd, old, new)) = link {
                    write!(f, "\n    {}: {} -> {}", rd, old, new)?;
                }
                if *target_pc == 0 {
                    write!(f, "\n    return to host")
                } else {
                    write!(f, "\n    jump: 0x{:08x} -> 0x{:08x}", self.pc, target_pc)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use rv_encoder::{add, beq, ret};

    #[test]
    fn test_display_arithmetic() {
        let log = InstLog::new(
            3,
            0x1008,
            add(Gpr::A0, Gpr::A0, Gpr::A1),
            Effect::Arithmetic {
                rd: Gpr::A0,
                rs1_val: 5,
                rs2_val: Some(10),
                rd_old: 5,
                rd_new: 15,
            },
        );
        assert_eq!(
            log.to_string(),
            "[   3] 0x00001008: add a0, a0, a1\n    a0: 5 -> 15 (rs1=5, rs2=10)"
        );
    }

    #[test]
    fn test_display_branch_and_return() {
        let taken = InstLog::new(
            1,
            0x1000,
            beq(Gpr::A0, Gpr::A1, 8),
            Effect::Branch {
                rs1_val: 1,
                rs2_val: 1,
                taken: true,
                target_pc: 0x1008,
            },
        );
        assert!(taken
            .to_string()
            .contains("branch taken: 0x00001000 -> 0x00001008"));

        let returning = InstLog::new(
            2,
            0x1008,
            ret(),
            Effect::Jump {
                link: None,
                target_pc: 0,
            },
        );
        assert!(returning.to_string().ends_with("return to host"));
    }
}
