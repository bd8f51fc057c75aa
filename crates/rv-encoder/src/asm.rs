//! A small line-oriented assembler for the emulator's dialect.
//!
//! ```text
//! # comment
//! start:
//!     addi a0, a0, 5
//!     beq  a0, a1, done
//!     sb   a0, 8(sp)
//! done:
//!     ret
//! ```
//!
//! Branch and `jal` targets may be labels or literal byte offsets.

use alloc::{
    collections::BTreeMap,
    format,
    string::String,
    vec::Vec,
};

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, hex_digit1, space0},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::{encode, encode_program, fields, opcodes::funct3, Gpr};

/// Assembly failure, tagged with the 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct AsmError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand<'a> {
    Reg(Gpr),
    Imm(i64),
    Mem { offset: i64, base: Gpr },
    Label(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Statement<'a> {
    mnemonic: &'a str,
    operands: Vec<Operand<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line<'a> {
    label: Option<&'a str>,
    statement: Option<Statement<'a>>,
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.')(input)
}

/// Decimal or `0x` hex literal with an optional leading minus.
fn integer(input: &str) -> IResult<&str, i64> {
    let hex = map_res(preceded(tag_no_case("0x"), hex_digit1), |s: &str| {
        i64::from_str_radix(s, 16)
    });
    let dec = map_res(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<i64>()
    });
    map(pair(opt(char('-')), alt((hex, dec))), |(neg, v)| {
        if neg.is_some() {
            -v
        } else {
            v
        }
    })(input)
}

fn register(input: &str) -> IResult<&str, Gpr> {
    map_res(identifier, Gpr::from_name)(input)
}

fn operand(input: &str) -> IResult<&str, Operand<'_>> {
    alt((
        map(
            pair(integer, delimited(char('('), register, char(')'))),
            |(offset, base)| Operand::Mem { offset, base },
        ),
        map(integer, Operand::Imm),
        map(register, Operand::Reg),
        map(identifier, Operand::Label),
    ))(input)
}

fn statement(input: &str) -> IResult<&str, Statement<'_>> {
    map(
        pair(
            terminated(identifier, space0),
            separated_list0(delimited(space0, char(','), space0), operand),
        ),
        |(mnemonic, operands)| Statement { mnemonic, operands },
    )(input)
}

fn line(input: &str) -> IResult<&str, Line<'_>> {
    map(
        all_consuming(tuple((
            space0,
            opt(terminated(
                recognize(identifier),
                pair(space0, tag(":")),
            )),
            space0,
            opt(statement),
            space0,
        ))),
        |(_, label, _, statement, _)| Line { label, statement },
    )(input)
}

fn strip_comment(text: &str) -> &str {
    let end = text.find(['#', ';']).unwrap_or(text.len());
    &text[..end]
}

/// Assemble source text into instruction words.
pub fn assemble_words(source: &str) -> Result<Vec<u32>, AsmError> {
    let mut parsed = Vec::new();
    let mut labels = BTreeMap::new();

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let (_, parsed_line) = line(strip_comment(raw)).map_err(|_| AsmError {
            line: line_no,
            message: format!("cannot parse `{}`", raw.trim()),
        })?;

        if let Some(label) = parsed_line.label {
            let offset = (parsed.len() * 4) as i64;
            if labels.insert(label, offset).is_some() {
                return Err(AsmError {
                    line: line_no,
                    message: format!("duplicate label `{}`", label),
                });
            }
        }
        if let Some(stmt) = parsed_line.statement {
            parsed.push((line_no, stmt));
        }
    }

    parsed
        .iter()
        .enumerate()
        .map(|(i, (line_no, stmt))| {
            encode_statement(stmt, (i * 4) as i64, &labels).map_err(|message| AsmError {
                line: *line_no,
                message,
            })
        })
        .collect()
}

/// Assemble source text into little-endian code bytes.
pub fn assemble_code(source: &str) -> Result<Vec<u8>, AsmError> {
    assemble_words(source).map(|words| encode_program(&words))
}

/// Assemble a single instruction with no label context.
pub fn assemble_instruction(source: &str) -> Result<u32, AsmError> {
    let words = assemble_words(source)?;
    match words.as_slice() {
        [word] => Ok(*word),
        _ => Err(AsmError {
            line: 1,
            message: format!("expected exactly one instruction, found {}", words.len()),
        }),
    }
}

fn signed_field(value: i64, bits: u32, what: &str) -> Result<i32, String> {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    if value < min || value > max {
        return Err(format!("{} {} out of range [{}, {}]", what, value, min, max));
    }
    Ok(value as i32)
}

/// `.word` takes any value that fits in 32 bits, signed or unsigned.
fn word_value(value: i64) -> Result<u32, String> {
    if !(i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
        return Err(format!(".word value {} does not fit in 32 bits", value));
    }
    Ok(value as u32)
}

fn pc_relative(
    target: &Operand<'_>,
    pc: i64,
    labels: &BTreeMap<&str, i64>,
    bits: u32,
) -> Result<i32, String> {
    let offset = match target {
        Operand::Imm(imm) => *imm,
        Operand::Label(name) => labels
            .get(name)
            .map(|addr| addr - pc)
            .ok_or_else(|| format!("undefined label `{}`", name))?,
        other => return Err(format!("expected a label or offset, found {:?}", other)),
    };
    if offset % 2 != 0 {
        return Err(format!("offset {} is not 2-byte aligned", offset));
    }
    signed_field(offset, bits, "offset")
}

/// LUI and JAL immediates overlap the funct3 bits, which the emulator
/// requires to hold a fixed selector.
fn with_selector(word: u32, expected: u8, mnemonic: &str) -> Result<u32, String> {
    let found = fields::funct3(word);
    if found != expected {
        return Err(format!(
            "{} immediate sets bits [14:12] to 0b{:03b}, expected 0b{:03b}",
            mnemonic, found, expected
        ));
    }
    Ok(word)
}

fn encode_statement(
    stmt: &Statement<'_>,
    pc: i64,
    labels: &BTreeMap<&str, i64>,
) -> Result<u32, String> {
    use Operand::{Imm, Mem, Reg};

    let mnemonic = stmt.mnemonic.to_ascii_lowercase();
    let ops = stmt.operands.as_slice();

    let word = match (mnemonic.as_str(), ops) {
        ("add", [Reg(rd), Reg(rs1), Reg(rs2)]) => encode::add(*rd, *rs1, *rs2),
        ("sub", [Reg(rd), Reg(rs1), Reg(rs2)]) => encode::sub(*rd, *rs1, *rs2),
        ("mul", [Reg(rd), Reg(rs1), Reg(rs2)]) => encode::mul(*rd, *rs1, *rs2),
        ("addi", [Reg(rd), Reg(rs1), Imm(imm)]) => {
            encode::addi(*rd, *rs1, signed_field(*imm, 12, "immediate")?)
        }
        ("srli", [Reg(rd), Reg(rs1), Imm(shamt)]) => {
            if !(0..64).contains(shamt) {
                return Err(format!("shift amount {} out of range [0, 63]", shamt));
            }
            encode::srli(*rd, *rs1, *shamt as i32)
        }
        ("li", [Reg(rd), Imm(imm)]) => encode::li(*rd, signed_field(*imm, 12, "immediate")?),
        ("sb", [Reg(rs2), Mem { offset, base }]) => {
            encode::sb(*base, *rs2, signed_field(*offset, 12, "offset")?)
        }
        ("beq" | "bne" | "blt" | "bge", [Reg(rs1), Reg(rs2), target]) => {
            let imm = pc_relative(target, pc, labels, 13)?;
            match mnemonic.as_str() {
                "beq" => encode::beq(*rs1, *rs2, imm),
                "bne" => encode::bne(*rs1, *rs2, imm),
                "blt" => encode::blt(*rs1, *rs2, imm),
                _ => encode::bge(*rs1, *rs2, imm),
            }
        }
        ("lui", [Reg(rd), Imm(imm20)]) => {
            if !(0..=0xfffff).contains(imm20) {
                return Err(format!("upper immediate 0x{:x} exceeds 20 bits", imm20));
            }
            with_selector(encode::lui(*rd, *imm20 as u32), funct3::LUI, "lui")?
        }
        ("jal", [Reg(rd), target]) => {
            let imm = pc_relative(target, pc, labels, 21)?;
            with_selector(encode::jal(*rd, imm), funct3::JAL, "jal")?
        }
        ("jal", [target]) => {
            let imm = pc_relative(target, pc, labels, 21)?;
            with_selector(encode::jal(Gpr::RA, imm), funct3::JAL, "jal")?
        }
        ("jalr", [Reg(rs1)]) => encode::jalr(Gpr::ZERO, *rs1, 0),
        ("jalr", [Reg(rd), Reg(rs1), Imm(imm)]) => {
            encode::jalr(*rd, *rs1, signed_field(*imm, 12, "immediate")?)
        }
        ("jalr", [Reg(rd), Mem { offset, base }]) => {
            encode::jalr(*rd, *base, signed_field(*offset, 12, "offset")?)
        }
        ("ret", []) => encode::ret(),
        (".word", [Imm(value)]) => word_value(*value)?,
        _ => {
            return Err(format!(
                "unsupported instruction or operands: {} {:?}",
                stmt.mnemonic,
                ops.iter().map(|o| format!("{:?}", o)).collect::<Vec<_>>()
            ))
        }
    };

    Ok(word)
}
