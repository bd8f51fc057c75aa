use std::{io::Write, process::Command};

use rv_encoder::{addi, encode_program, jalr, Gpr};
use tempfile::NamedTempFile;

fn rv_emu() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rv-emu"))
}

fn write_temp(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents).expect("write temp file");
    file
}

#[test]
fn test_runs_raw_image() {
    let image = encode_program(&[
        addi(Gpr::A0, Gpr::A0, 5),
        addi(Gpr::A0, Gpr::A0, 10),
        jalr(Gpr::ZERO, Gpr::RA, 0),
    ]);
    let file = write_temp(&image);

    let output = rv_emu().arg(file.path()).output().expect("run rv-emu");
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "15\n");
}

#[test]
fn test_runs_assembly_with_args() {
    let file = write_temp(b"add a0, a0, a1\nret\n");

    let output = rv_emu()
        .arg(file.path())
        .args(["--asm", "--arg", "40", "--arg", "2"])
        .output()
        .expect("run rv-emu");
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "42\n");
}

#[test]
fn test_unsupported_instruction_exits_nonzero() {
    let file = write_temp(b"li a0, 1\n.word 0x73\nret\n");

    let output = rv_emu()
        .arg(file.path())
        .args(["--asm", "--trace"])
        .output()
        .expect("run rv-emu");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown opcode 0x73"), "{}", stderr);
    assert!(stderr.contains(">>> "), "{}", stderr);
}

#[test]
fn test_instruction_limit_exits_nonzero() {
    let file = write_temp(b"spin: beq zero, zero, spin\n");

    let output = rv_emu()
        .arg(file.path())
        .args(["--asm", "--max-instructions", "10"])
        .output()
        .expect("run rv-emu");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Instruction limit exceeded"));
}

#[test]
fn test_image_past_top_of_memory_exits_nonzero() {
    let file = write_temp(b"li a0, 7\nret\n");

    let output = rv_emu()
        .arg(file.path())
        .args(["--asm", "--base", "0xffff_ffff_ffff_fffc"])
        .output()
        .expect("run rv-emu");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not fit in the address space"));
}
