//! Format executors.
//!
//! Each executor mutates the machine state for one decoded instruction and
//! leaves the PC pointing at the next instruction to fetch: `pc + 4` for
//! straight-line code, `pc + imm` for a taken branch or JAL, and the value of
//! `rs1` for JALR.

use rv_encoder::Gpr;

use crate::{
    decoder::{BranchCond, DecodedInstruction, IOp, ROp},
    logging::{Effect, InstLog},
    state::MachineState,
};

/// Execute one decoded instruction and describe what it did.
pub fn execute_instruction(
    state: &mut MachineState,
    inst: DecodedInstruction,
    instruction: u32,
    cycle: u64,
) -> InstLog {
    let pc = state.pc();
    let effect = match inst {
        DecodedInstruction::R { op, rd, rs1, rs2 } => exec_r(state, op, rd, rs1, rs2),
        DecodedInstruction::I { op, rd, rs1, imm } => exec_i(state, op, rd, rs1, imm),
        DecodedInstruction::S { rs1, rs2, imm } => exec_s(state, rs1, rs2, imm),
        DecodedInstruction::B {
            cond,
            rs1,
            rs2,
            imm,
        } => exec_b(state, cond, rs1, rs2, imm),
        DecodedInstruction::U { rd, imm } => exec_u(state, rd, imm),
        DecodedInstruction::J { rd, imm } => exec_j(state, rd, imm),
        DecodedInstruction::Jalr { rs1 } => exec_jalr(state, rs1),
    };
    InstLog::new(cycle, pc, instruction, effect)
}

fn exec_r(state: &mut MachineState, op: ROp, rd: Gpr, rs1: Gpr, rs2: Gpr) -> Effect {
    let val1 = state.reg(rs1);
    let val2 = state.reg(rs2);
    let result = match op {
        ROp::Add => val1.wrapping_add(val2),
        ROp::Sub => val1.wrapping_sub(val2),
        ROp::Mul => val1.wrapping_mul(val2),
    };
    let rd_old = state.set_reg(rd, result);
    state.advance();
    Effect::Arithmetic {
        rd,
        rs1_val: val1,
        rs2_val: Some(val2),
        rd_old,
        rd_new: result,
    }
}

fn exec_i(state: &mut MachineState, op: IOp, rd: Gpr, rs1: Gpr, imm: i64) -> Effect {
    let val1 = state.reg(rs1);
    let result = match op {
        IOp::Addi => val1.wrapping_add(imm),
        // shift amount is the low six bits of the immediate
        IOp::Srli => (val1 as u64).wrapping_shr(imm as u32) as i64,
        IOp::Li => imm,
    };
    let rd_old = state.set_reg(rd, result);
    state.advance();
    match op {
        IOp::Li => Effect::Immediate {
            rd,
            rd_old,
            rd_new: result,
        },
        IOp::Addi | IOp::Srli => Effect::Arithmetic {
            rd,
            rs1_val: val1,
            rs2_val: None,
            rd_old,
            rd_new: result,
        },
    }
}

fn exec_s(state: &mut MachineState, rs1: Gpr, rs2: Gpr, imm: i64) -> Effect {
    let rs2_val = state.reg(rs2);
    let result = rs2_val.wrapping_add(imm);
    let rs1_old = state.set_reg(rs1, result);
    state.advance();
    Effect::Move {
        rs1,
        rs2_val,
        rs1_old,
        rs1_new: result,
    }
}

fn exec_b(state: &mut MachineState, cond: BranchCond, rs1: Gpr, rs2: Gpr, imm: i64) -> Effect {
    let rs1_val = state.reg(rs1);
    let rs2_val = state.reg(rs2);
    let taken = cond.holds(rs1_val, rs2_val);
    let target_pc = state.pc().wrapping_add_signed(imm);
    if taken {
        state.set_pc(target_pc);
    } else {
        state.advance();
    }
    Effect::Branch {
        rs1_val,
        rs2_val,
        taken,
        target_pc,
    }
}

fn exec_u(state: &mut MachineState, rd: Gpr, imm: i64) -> Effect {
    let rd_old = state.set_reg(rd, imm);
    state.advance();
    Effect::Immediate {
        rd,
        rd_old,
        rd_new: imm,
    }
}

fn exec_j(state: &mut MachineState, rd: Gpr, imm: i64) -> Effect {
    let pc = state.pc();
    let link = pc.wrapping_add(4) as i64;
    let rd_old = state.set_reg(rd, link);
    let target_pc = pc.wrapping_add_signed(imm);
    state.set_pc(target_pc);
    Effect::Jump {
        link: Some((rd, rd_old, link)),
        target_pc,
    }
}

fn exec_jalr(state: &mut MachineState, rs1: Gpr) -> Effect {
    let target_pc = state.reg(rs1) as u64;
    state.set_pc(target_pc);
    Effect::Jump {
        link: None,
        target_pc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decoder::decode_instruction, state::StackLayout};
    use rstest::rstest;
    use rv_encoder::*;

    fn state_at(pc: u64) -> MachineState {
        MachineState::init(pc, [0; 4], StackLayout::new(0x8000_0000, 16).unwrap())
    }

    fn exec(state: &mut MachineState, iw: u32) -> InstLog {
        let inst = decode_instruction(iw).expect("decodable");
        execute_instruction(state, inst, iw, 1)
    }

    #[rstest]
    #[case(add(Gpr::A0, Gpr::A1, Gpr::A2), 7, -3, 4)]
    #[case(sub(Gpr::A0, Gpr::A1, Gpr::A2), 7, -3, 10)]
    #[case(mul(Gpr::A0, Gpr::A1, Gpr::A2), 7, -3, -21)]
    #[case(add(Gpr::A0, Gpr::A1, Gpr::A2), i64::MAX, 1, i64::MIN)]
    fn test_r_type(#[case] iw: u32, #[case] a: i64, #[case] b: i64, #[case] expected: i64) {
        let mut state = state_at(0x1000);
        state.set_reg(Gpr::A1, a);
        state.set_reg(Gpr::A2, b);
        exec(&mut state, iw);
        assert_eq!(state.reg(Gpr::A0), expected);
        assert_eq!(state.pc(), 0x1004);
    }

    #[test]
    fn test_addi_negative_immediate() {
        let mut state = state_at(0x1000);
        state.set_reg(Gpr::A0, 10);
        exec(&mut state, addi(Gpr::A0, Gpr::A0, -2048));
        assert_eq!(state.reg(Gpr::A0), 10 - 2048);
        assert_eq!(state.pc(), 0x1004);
    }

    #[test]
    fn test_srli_is_logical() {
        let mut state = state_at(0x1000);
        state.set_reg(Gpr::A1, -16);
        exec(&mut state, srli(Gpr::A0, Gpr::A1, 2));
        assert_eq!(state.reg(Gpr::A0) as u64, (-16i64 as u64) >> 2);
        assert!(state.reg(Gpr::A0) > 0);
    }

    #[test]
    fn test_i_type_effects() {
        let mut state = state_at(0x1000);
        state.set_reg(Gpr::A1, 64);
        let log = exec(&mut state, srli(Gpr::A0, Gpr::A1, 3));
        assert_eq!(
            log.effect,
            Effect::Arithmetic {
                rd: Gpr::A0,
                rs1_val: 64,
                rs2_val: None,
                rd_old: 0,
                rd_new: 8,
            }
        );
        let log = exec(&mut state, addi(Gpr::A0, Gpr::A0, 2));
        assert!(matches!(log.effect, Effect::Arithmetic { rd_old: 8, rd_new: 10, .. }));
        let log = exec(&mut state, li(Gpr::A0, -7));
        assert_eq!(
            log.effect,
            Effect::Immediate {
                rd: Gpr::A0,
                rd_old: 10,
                rd_new: -7,
            }
        );
    }

    #[test]
    fn test_li_sign_extends() {
        let mut state = state_at(0x1000);
        exec(&mut state, li(Gpr::A3, -1));
        assert_eq!(state.reg(Gpr::A3), -1);
        exec(&mut state, li(Gpr::A3, 2047));
        assert_eq!(state.reg(Gpr::A3), 2047);
        assert_eq!(state.pc(), 0x1008);
    }

    #[test]
    fn test_s_type_moves_into_rs1() {
        let mut state = state_at(0x1000);
        state.set_reg(Gpr::A1, 100);
        let log = exec(&mut state, sb(Gpr::A0, Gpr::A1, -8));
        assert_eq!(state.reg(Gpr::A0), 92);
        assert_eq!(state.reg(Gpr::A1), 100);
        assert_eq!(state.pc(), 0x1004);
        assert!(matches!(log.effect, Effect::Move { rs1: Gpr::A0, rs1_new: 92, .. }));
    }

    #[rstest]
    #[case(beq(Gpr::A0, Gpr::A1, 16), 5, 5, true)]
    #[case(beq(Gpr::A0, Gpr::A1, 16), 5, 6, false)]
    #[case(bne(Gpr::A0, Gpr::A1, 16), 5, 6, true)]
    #[case(bne(Gpr::A0, Gpr::A1, 16), 5, 5, false)]
    #[case(blt(Gpr::A0, Gpr::A1, 16), 3, 7, true)]
    #[case(bge(Gpr::A0, Gpr::A1, 16), 3, 7, false)]
    #[case(blt(Gpr::A0, Gpr::A1, 16), -1, 0, true)]
    #[case(bge(Gpr::A0, Gpr::A1, 16), 7, 7, true)]
    fn test_branches(#[case] iw: u32, #[case] a: i64, #[case] b: i64, #[case] taken: bool) {
        let mut state = state_at(0x1000);
        state.set_reg(Gpr::A0, a);
        state.set_reg(Gpr::A1, b);
        exec(&mut state, iw);
        let expected = if taken { 0x1010 } else { 0x1004 };
        assert_eq!(state.pc(), expected);
    }

    #[test]
    fn test_backward_branch() {
        let mut state = state_at(0x1010);
        exec(&mut state, beq(Gpr::A0, Gpr::A1, -16));
        assert_eq!(state.pc(), 0x1000);
    }

    #[test]
    fn test_lui_places_upper_bits() {
        let mut state = state_at(0x1000);
        exec(&mut state, lui(Gpr::A0, 0x12343));
        assert_eq!(state.reg(Gpr::A0), 0x1234_3000);
        exec(&mut state, lui(Gpr::A1, 0xffffb));
        assert_eq!(state.reg(Gpr::A1), 0xffff_b000);
        assert_eq!(state.pc(), 0x1008);
    }

    #[test]
    fn test_jal_links_and_jumps() {
        let mut state = state_at(100);
        let log = exec(&mut state, jal(Gpr::RA, 0x800));
        assert_eq!(state.reg(Gpr::RA), 104);
        assert_eq!(state.pc(), 100 + 0x800);
        assert_eq!(
            log.effect,
            Effect::Jump {
                link: Some((Gpr::RA, 0, 104)),
                target_pc: 100 + 0x800,
            }
        );
    }

    #[test]
    fn test_jalr_replaces_pc() {
        let mut state = state_at(0x1000);
        state.set_reg(Gpr::T0, 0x2000);
        exec(&mut state, jalr(Gpr::RA, Gpr::T0, 12));
        assert_eq!(state.pc(), 0x2000);
        // no link write
        assert_eq!(state.reg(Gpr::RA), 0);

        exec(&mut state, ret());
        assert_eq!(state.pc(), 0);
    }
}
