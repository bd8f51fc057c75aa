//! Load a program image, run it to completion, and print the value of A0.
//!
//! Any emulation error ends the process with a non-zero status.

use std::{fs, path::PathBuf};

use anyhow::{ensure, Context, Result};
use clap::{builder::RangedU64ValueParser, Parser};
use rv_emulator::{
    CodeImage, EmulatorConfig, LogLevel, RvEmulator, StackPolicy, DEFAULT_CODE_BASE, MAX_STACK_WORDS,
};

#[derive(Parser, Debug)]
#[command(name = "rv-emu", about = "Run a program image in the RISC-V dialect interpreter")]
struct Cli {
    /// Raw little-endian instruction image, or assembly text with --asm
    image: PathBuf,

    /// Treat the input file as assembly source
    #[arg(long)]
    asm: bool,

    /// Load address of the image
    #[arg(long, value_parser = parse_u64, default_value_t = DEFAULT_CODE_BASE)]
    base: u64,

    /// Entry address (defaults to the load address)
    #[arg(long, value_parser = parse_u64)]
    entry: Option<u64>,

    /// Initial argument, repeat for A0 through A3
    #[arg(long = "arg", allow_hyphen_values = true)]
    args: Vec<i64>,

    /// Stack capacity in 64-bit words
    #[arg(
        long,
        default_value_t = EmulatorConfig::DEFAULT_STACK_WORDS,
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_STACK_WORDS as u64)
    )]
    stack_words: usize,

    /// Fail if SP leaves the stack region
    #[arg(long)]
    checked_stack: bool,

    /// Stop after N instructions
    #[arg(long)]
    max_instructions: Option<u64>,

    /// Keep an instruction trace and print it with debug info on failure
    #[arg(long)]
    trace: bool,
}

/// Parse a decimal or `0x`-prefixed hexadecimal address.
fn parse_u64(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid address `{}`: {}", s, e))
}

fn load_image(cli: &Cli) -> Result<CodeImage> {
    let bytes = if cli.asm {
        let source = fs::read_to_string(&cli.image)
            .with_context(|| format!("reading {}", cli.image.display()))?;
        rv_encoder::assemble_code(&source)
            .with_context(|| format!("assembling {}", cli.image.display()))?
    } else {
        fs::read(&cli.image).with_context(|| format!("reading {}", cli.image.display()))?
    };
    log::info!(
        "loaded {} bytes from {} at 0x{:08x}",
        bytes.len(),
        cli.image.display(),
        cli.base
    );
    Ok(CodeImage::new(bytes, cli.base)?)
}

fn build_emulator(cli: &Cli) -> Result<RvEmulator> {
    ensure!(
        cli.args.len() <= 4,
        "at most 4 arguments are supported, got {}",
        cli.args.len()
    );
    let mut args = [0i64; 4];
    args[..cli.args.len()].copy_from_slice(&cli.args);

    let config = EmulatorConfig {
        stack_words: cli.stack_words,
        stack_policy: if cli.checked_stack {
            StackPolicy::Checked
        } else {
            StackPolicy::Unchecked
        },
        max_instructions: cli.max_instructions,
        log_level: if cli.trace {
            LogLevel::Instructions
        } else {
            LogLevel::Errors
        },
        ..EmulatorConfig::default()
    };

    let image = load_image(cli)?;
    let entry = cli.entry.unwrap_or(cli.base);
    Ok(RvEmulator::with_config(image, entry, args, config)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut emu = build_emulator(&cli)?;
    match emu.run() {
        Ok(a0) => {
            if cli.trace {
                eprint!("{}", emu.format_logs());
            }
            println!("{}", a0);
            Ok(())
        }
        Err(err) => {
            if cli.trace {
                eprintln!("{}", emu.format_debug_info(err.pc(), 20));
                eprintln!("{}", emu.dump_state());
            }
            Err(err.into())
        }
    }
}
