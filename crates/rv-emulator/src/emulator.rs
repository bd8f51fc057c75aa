//! Fetch-execute loop and the public emulator handle.

use alloc::{format, string::String, vec::Vec};
use core::fmt::Write;

use rv_encoder::{disassemble_instruction, disassemble_listing, Gpr};

use crate::{
    config::{EmulatorConfig, StackPolicy},
    decoder::decode_instruction,
    error::EmulatorError,
    executor::execute_instruction,
    logging::{InstLog, LogLevel},
    memory::CodeImage,
    state::{MachineState, StackLayout, NREGS},
};

/// Number of trace entries kept in the rolling buffer.
const LOG_CAPACITY: usize = 100;

/// Result of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Instruction executed, PC points at the next one.
    Continue,
    /// PC reached the 0 sentinel; carries the value of A0.
    Returned(i64),
}

/// Interpreter for the supported RISC-V subset.
pub struct RvEmulator {
    image: CodeImage,
    state: MachineState,
    config: EmulatorConfig,
    instruction_count: u64,
    log_buffer: Vec<InstLog>,
}

impl RvEmulator {
    /// Create an emulator with the default configuration, entering at
    /// `entry` with A0-A3 set to `args`.
    pub fn new(image: CodeImage, entry: u64, args: [i64; 4]) -> Self {
        Self::build(image, entry, args, EmulatorConfig::default(), StackLayout::default())
    }

    /// Create an emulator with an explicit configuration.
    ///
    /// Fails with [`EmulatorError::InvalidStackLayout`] if the configured
    /// stack is too large or does not fit in the address space.
    pub fn with_config(
        image: CodeImage,
        entry: u64,
        args: [i64; 4],
        config: EmulatorConfig,
    ) -> Result<Self, EmulatorError> {
        let layout = config.stack_layout()?;
        Ok(Self::build(image, entry, args, config, layout))
    }

    fn build(
        image: CodeImage,
        entry: u64,
        args: [i64; 4],
        config: EmulatorConfig,
        layout: StackLayout,
    ) -> Self {
        let state = MachineState::init(entry, args, layout);
        log::debug!(
            "init: entry=0x{:08x} image=[0x{:08x}, 0x{:08x}) stack=[0x{:08x}, 0x{:08x}) args={:?}",
            entry,
            image.base(),
            image.end(),
            state.stack_base(),
            state.stack_end(),
            args
        );
        Self {
            image,
            state,
            config,
            instruction_count: 0,
            log_buffer: Vec::new(),
        }
    }

    /// Set the maximum number of instructions to execute.
    pub fn with_max_instructions(mut self, limit: u64) -> Self {
        self.config.max_instructions = Some(limit);
        self
    }

    /// Set the logging level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    pub fn with_stack_policy(mut self, policy: StackPolicy) -> Self {
        self.config.stack_policy = policy;
        self
    }

    /// Execute a single instruction.
    ///
    /// Stepping with PC already at 0 executes nothing and reports the return
    /// value again.
    pub fn step(&mut self) -> Result<StepResult, EmulatorError> {
        let pc = self.state.pc();
        if pc == 0 {
            return Ok(StepResult::Returned(self.state.reg(Gpr::A0)));
        }

        if let Some(limit) = self.config.max_instructions {
            if self.instruction_count >= limit {
                return Err(self.fail(EmulatorError::InstructionLimitExceeded {
                    limit,
                    executed: self.instruction_count,
                    pc,
                    regs: *self.state.regs(),
                }));
            }
        }

        let instruction = match self.image.fetch(pc) {
            Ok(word) => word,
            Err(kind) => {
                return Err(self.fail(EmulatorError::InstructionFetch {
                    address: pc,
                    kind,
                    regs: *self.state.regs(),
                }))
            }
        };

        let decoded = match decode_instruction(instruction) {
            Ok(decoded) => decoded,
            Err(reason) => {
                log::warn!(
                    "unsupported instruction 0x{:08x} at 0x{:08x}: {}",
                    instruction,
                    pc,
                    reason
                );
                return Err(self.fail(EmulatorError::UnsupportedInstruction {
                    pc,
                    instruction,
                    reason,
                    regs: *self.state.regs(),
                }));
            }
        };

        // Counted before execution so the trace cycle starts at 1
        self.instruction_count += 1;
        let entry = execute_instruction(&mut self.state, decoded, instruction, self.instruction_count);
        log::trace!("0x{:08x}: {}", pc, disassemble_instruction(instruction));
        self.log_instruction(entry);

        if self.config.stack_policy == StackPolicy::Checked && !self.state.sp_in_bounds() {
            return Err(self.fail(EmulatorError::StackOverflow {
                sp: self.state.reg(Gpr::SP) as u64,
                low: self.state.stack_base(),
                high: self.state.stack_end(),
                pc,
                regs: *self.state.regs(),
            }));
        }

        if self.state.pc() == 0 {
            Ok(StepResult::Returned(self.state.reg(Gpr::A0)))
        } else {
            Ok(StepResult::Continue)
        }
    }

    /// Run until the program returns to the host, yielding the final A0.
    pub fn run(&mut self) -> Result<i64, EmulatorError> {
        loop {
            if let StepResult::Returned(a0) = self.step()? {
                log::debug!(
                    "returned a0={} after {} instructions",
                    a0,
                    self.instruction_count
                );
                return Ok(a0);
            }
        }
    }

    pub fn get_register(&self, reg: Gpr) -> i64 {
        self.state.reg(reg)
    }

    /// Set the value of a register. x0 is writable like any other register.
    pub fn set_register(&mut self, reg: Gpr, value: i64) {
        self.state.set_reg(reg, value);
    }

    pub fn registers(&self) -> &[i64; NREGS] {
        self.state.regs()
    }

    pub fn get_pc(&self) -> u64 {
        self.state.pc()
    }

    pub fn set_pc(&mut self, pc: u64) {
        self.state.set_pc(pc);
    }

    /// Get the number of instructions executed so far.
    pub fn get_instruction_count(&self) -> u64 {
        self.instruction_count
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Mutable access for seeding registers or stack contents before a run.
    pub fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    pub fn image(&self) -> &CodeImage {
        &self.image
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Read the stack word at an emulated address.
    pub fn stack_word(&self, address: u64) -> Result<u64, EmulatorError> {
        self.state.stack_word(address)
    }

    /// Captured trace entries, oldest first.
    pub fn get_logs(&self) -> &[InstLog] {
        &self.log_buffer
    }

    pub fn format_logs(&self) -> String {
        let mut result = String::new();
        for log in &self.log_buffer {
            let _ = writeln!(result, "{}", log);
        }
        result
    }

    pub fn clear_logs(&mut self) {
        self.log_buffer.clear();
    }

    /// Dump the current emulator state as a human-readable string.
    pub fn dump_state(&self) -> String {
        let mut result = String::new();
        let _ = writeln!(result, "PC: 0x{:08x}", self.state.pc());
        let _ = writeln!(result, "Instructions executed: {}", self.instruction_count);
        let _ = writeln!(
            result,
            "Stack: [0x{:08x}, 0x{:08x}) ({} words)",
            self.state.stack_base(),
            self.state.stack_end(),
            self.state.stack().len()
        );
        result.push_str("\nRegisters:\n");

        // Zero registers are elided except x0, ra and sp
        for (num, value) in self.state.regs().iter().enumerate() {
            let reg = Gpr::new(num as u8);
            if *value != 0 || matches!(reg, Gpr::ZERO | Gpr::RA | Gpr::SP) {
                let _ = writeln!(
                    result,
                    "  {:>4} (x{:<2}) = 0x{:016x} ({})",
                    reg.abi_name(),
                    num,
                    *value as u64,
                    value
                );
            }
        }

        let sp = self.state.reg(Gpr::SP) as u64;
        let used: Vec<(u64, u64)> = self
            .state
            .stack()
            .iter()
            .enumerate()
            .map(|(slot, word)| (self.state.slot_address(slot), *word))
            .filter(|(address, word)| *word != 0 || *address == sp)
            .collect();
        if !used.is_empty() {
            result.push_str("\nStack:\n");
            for (address, word) in used {
                let marker = if address == sp { " <- sp" } else { "" };
                let _ = writeln!(result, "  0x{:08x}: 0x{:016x}{}", address, word, marker);
            }
        }

        result
    }

    /// Format debug information including disassembly and execution logs.
    ///
    /// # Arguments
    ///
    /// * `highlight_pc` - PC to mark with `>>>` (usually the faulting one)
    /// * `log_count` - Number of recent trace entries to show
    pub fn format_debug_info(&self, highlight_pc: Option<u64>, log_count: usize) -> String {
        let listing = disassemble_listing(self.image.bytes(), self.image.base());

        // Long listings are windowed around the highlighted PC, or show the tail
        let (start, end) = if listing.len() <= 50 {
            (0, listing.len())
        } else if let Some(pc) = highlight_pc {
            let idx = listing.iter().position(|(addr, _)| *addr == pc).unwrap_or(0);
            (idx.saturating_sub(10), (idx + 11).min(listing.len()))
        } else {
            (listing.len().saturating_sub(20), listing.len())
        };

        let mut result = String::from("Disassembly:\n");
        if start > 0 {
            result.push_str("  ...\n");
        }
        for (idx, (addr, text)) in listing.iter().enumerate().take(end).skip(start) {
            let marker = if Some(*addr) == highlight_pc { ">>> " } else { "    " };
            let _ = writeln!(result, "{}{:3}: 0x{:08x}: {}", marker, idx, addr, text);
        }
        if end < listing.len() {
            result.push_str("  ...\n");
        }

        if !self.log_buffer.is_empty() {
            result.push_str("\nLast execution logs:\n");
            let first = self.log_buffer.len().saturating_sub(log_count);
            for log in &self.log_buffer[first..] {
                result.push_str(&format!("{}\n", log));
            }
        }

        result
    }

    fn log_instruction(&mut self, log: InstLog) {
        match self.config.log_level {
            LogLevel::None | LogLevel::Errors => {}
            LogLevel::Instructions | LogLevel::Verbose => {
                if self.config.log_level == LogLevel::Verbose {
                    log::debug!("{}", log);
                }
                if self.log_buffer.len() >= LOG_CAPACITY {
                    self.log_buffer.remove(0);
                }
                self.log_buffer.push(log);
            }
        }
    }

    fn fail(&self, err: EmulatorError) -> EmulatorError {
        if self.config.log_level != LogLevel::None {
            log::error!("{}", err);
        }
        err
    }
}
