//! Bit-field extraction from raw instruction words.
//!
//! Every function here is total over `u32`. Immediates are returned already
//! sign-extended to 64 bits (except U-type, which is zero-extended) so
//! executors can add them straight onto register values.

use crate::Gpr;

/// Bits [6:0].
pub const fn opcode(iw: u32) -> u8 {
    (iw & 0x7f) as u8
}

/// Bits [11:7].
pub const fn rd(iw: u32) -> Gpr {
    Gpr::from_field(iw >> 7)
}

/// Bits [19:15].
pub const fn rs1(iw: u32) -> Gpr {
    Gpr::from_field(iw >> 15)
}

/// Bits [24:20].
pub const fn rs2(iw: u32) -> Gpr {
    Gpr::from_field(iw >> 20)
}

/// Bits [14:12].
pub const fn funct3(iw: u32) -> u8 {
    ((iw >> 12) & 0x7) as u8
}

/// Bits [31:25].
pub const fn funct7(iw: u32) -> u8 {
    ((iw >> 25) & 0x7f) as u8
}

/// Sign-extend the low `width` bits of `value`.
pub const fn sign_extend(value: u32, width: u32) -> i64 {
    let shift = 64 - width;
    ((value as u64) << shift) as i64 >> shift
}

/// I-type: bits [31:20].
pub const fn imm_i(iw: u32) -> i64 {
    (iw as i32 >> 20) as i64
}

/// S-type: bits [31:25] above bits [11:7].
pub const fn imm_s(iw: u32) -> i64 {
    let hi = (iw >> 25) & 0x7f;
    let lo = (iw >> 7) & 0x1f;
    sign_extend((hi << 5) | lo, 12)
}

/// B-type: imm[12|10:5] in bits [31:25], imm[4:1|11] in bits [11:7].
pub const fn imm_b(iw: u32) -> i64 {
    let imm_12 = (iw >> 31) & 0x1;
    let imm_11 = (iw >> 7) & 0x1;
    let imm_10_5 = (iw >> 25) & 0x3f;
    let imm_4_1 = (iw >> 8) & 0xf;
    sign_extend(
        (imm_12 << 12) | (imm_11 << 11) | (imm_10_5 << 5) | (imm_4_1 << 1),
        13,
    )
}

/// U-type: bits [31:12] in place, low 12 bits zero. Zero-extended.
pub const fn imm_u(iw: u32) -> i64 {
    (iw & 0xffff_f000) as i64
}

/// J-type: imm[20|10:1|11|19:12] in bits [31:12].
pub const fn imm_j(iw: u32) -> i64 {
    let imm_20 = (iw >> 31) & 0x1;
    let imm_19_12 = (iw >> 12) & 0xff;
    let imm_11 = (iw >> 20) & 0x1;
    let imm_10_1 = (iw >> 21) & 0x3ff;
    sign_extend(
        (imm_20 << 20) | (imm_19_12 << 12) | (imm_11 << 11) | (imm_10_1 << 1),
        21,
    )
}
