//! Disassembly for the emulator's instruction dialect.

use alloc::{format, string::String, vec::Vec};

use crate::{
    fields::{funct3, funct7, imm_b, imm_i, imm_j, imm_s, imm_u, opcode, rd, rs1, rs2},
    opcodes::{self, funct3 as f3, funct7 as f7},
};

/// Disassemble a single instruction word.
///
/// Words the emulator would reject are rendered as `unknown ...` with the raw
/// word so they can still be located in a listing.
pub fn disassemble_instruction(inst: u32) -> String {
    let (rd, rs1, rs2) = (rd(inst), rs1(inst), rs2(inst));

    match opcode(inst) {
        opcodes::OP => match (funct3(inst), funct7(inst)) {
            (f3::ARITH, f7::ADD) => format!("add {}, {}, {}", rd, rs1, rs2),
            (f3::ARITH, f7::SUB) => format!("sub {}, {}, {}", rd, rs1, rs2),
            (f3::ARITH, f7::MUL) => format!("mul {}, {}, {}", rd, rs1, rs2),
            _ => format!("unknown_r_type 0x{:08x}", inst),
        },
        opcodes::OP_IMM | opcodes::LOAD => match funct3(inst) {
            f3::SRLI => format!("srli {}, {}, {}", rd, rs1, imm_i(inst)),
            f3::ADDI => format!("addi {}, {}, {}", rd, rs1, imm_i(inst)),
            f3::LI => format!("li {}, {}", rd, imm_i(inst)),
            _ => format!("unknown_i_type 0x{:08x}", inst),
        },
        opcodes::STORE => match funct3(inst) {
            f3::MOVE => format!("sb {}, {}({})", rs2, imm_s(inst), rs1),
            _ => format!("unknown_s_type 0x{:08x}", inst),
        },
        opcodes::BRANCH => {
            let mnemonic = match funct3(inst) {
                f3::BEQ => "beq",
                f3::BNE => "bne",
                f3::BLT => "blt",
                f3::BGE => "bge",
                _ => return format!("unknown_branch 0x{:08x}", inst),
            };
            format!("{} {}, {}, {}", mnemonic, rs1, rs2, imm_b(inst))
        }
        opcodes::LUI if funct3(inst) == f3::LUI => {
            format!("lui {}, 0x{:05x}", rd, imm_u(inst) >> 12)
        }
        opcodes::JAL if funct3(inst) == f3::JAL => format!("jal {}, {}", rd, imm_j(inst)),
        opcodes::JALR => format!("jalr {}", rs1),
        op => format!("unknown 0x{:08x} (opcode=0x{:02x})", inst, op),
    }
}

/// Disassemble each complete little-endian word of `code`, paired with its
/// address. Stops at the top of the address space rather than wrapping.
pub fn disassemble_listing(code: &[u8], base: u64) -> Vec<(u64, String)> {
    code.chunks_exact(4)
        .zip((0u64..).map_while(|i| base.checked_add(i.checked_mul(4)?)))
        .map(|(chunk, addr)| {
            let inst = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            (addr, disassemble_instruction(inst))
        })
        .collect()
}

/// Disassemble a little-endian code buffer, one line per word, with byte
/// offsets relative to `base`.
pub fn disassemble_code(code: &[u8], base: u64) -> String {
    let mut result = String::new();
    for (addr, text) in disassemble_listing(code, base) {
        result.push_str(&format!("0x{:08x}: {}\n", addr, text));
    }

    let tail = code.len() % 4;
    if tail != 0 {
        if let Some(addr) = base.checked_add((code.len() - tail) as u64) {
            result.push_str(&format!("0x{:08x}: <incomplete instruction>\n", addr));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode::*, Gpr};

    #[test]
    fn test_disassemble_arith() {
        assert_eq!(disassemble_instruction(add(Gpr::A0, Gpr::A1, Gpr::A2)), "add a0, a1, a2");
        assert_eq!(disassemble_instruction(sub(Gpr::A0, Gpr::A1, Gpr::A2)), "sub a0, a1, a2");
        assert_eq!(disassemble_instruction(mul(Gpr::T0, Gpr::T1, Gpr::T2)), "mul t0, t1, t2");
    }

    #[test]
    fn test_disassemble_immediates() {
        assert_eq!(disassemble_instruction(addi(Gpr::A0, Gpr::A1, -5)), "addi a0, a1, -5");
        assert_eq!(disassemble_instruction(li(Gpr::A2, 77)), "li a2, 77");
        assert_eq!(disassemble_instruction(srli(Gpr::A0, Gpr::A0, 3)), "srli a0, a0, 3");
        assert_eq!(disassemble_instruction(sb(Gpr::SP, Gpr::A0, -16)), "sb a0, -16(sp)");
    }

    #[test]
    fn test_disassemble_control_flow() {
        assert_eq!(disassemble_instruction(bge(Gpr::A0, Gpr::A1, -8)), "bge a0, a1, -8");
        assert_eq!(disassemble_instruction(jal(Gpr::RA, 16)), "jal ra, 16");
        assert_eq!(disassemble_instruction(ret()), "jalr ra");
        assert_eq!(disassemble_instruction(lui(Gpr::A0, 0x12343)), "lui a0, 0x12343");
    }

    #[test]
    fn test_disassemble_unknown() {
        assert_eq!(
            disassemble_instruction(0x0000_0073),
            "unknown 0x00000073 (opcode=0x73)"
        );
        assert!(disassemble_instruction(lui(Gpr::A0, 0x12345)).starts_with("unknown"));
    }

    #[test]
    fn test_disassemble_code() {
        let mut code: Vec<u8> = encode_program(&[addi(Gpr::A0, Gpr::A0, 5), ret()]);
        code.push(0xaa);

        let text = disassemble_code(&code, 0x1000);
        assert!(text.contains("0x00001000: addi a0, a0, 5"));
        assert!(text.contains("0x00001004: jalr ra"));
        assert!(text.contains("0x00001008: <incomplete instruction>"));
    }

    #[test]
    fn test_listing_stops_at_top_of_address_space() {
        let code = encode_program(&[li(Gpr::A0, 1), li(Gpr::A0, 2), ret()]);
        let listing = disassemble_listing(&code, 0xffff_ffff_ffff_fff8);
        assert_eq!(
            listing,
            [
                (0xffff_ffff_ffff_fff8, String::from("li a0, 1")),
                (0xffff_ffff_ffff_fffc, String::from("li a0, 2")),
            ]
        );
        assert_eq!(disassemble_code(&code, 0xffff_ffff_ffff_fff8).lines().count(), 2);
    }
}
