//! Register file, emulated stack, and program counter.

use alloc::{vec, vec::Vec};

use rv_encoder::Gpr;

use crate::{config::EmulatorConfig, error::EmulatorError};

/// Number of general-purpose registers.
pub const NREGS: usize = 32;

/// Bytes per stack slot.
pub const WORD_BYTES: u64 = 8;

/// Largest stack the emulator will allocate, in words (128 MiB).
pub const MAX_STACK_WORDS: usize = 1 << 24;

/// Placement of the emulated stack. The whole region, including the
/// one-past-the-end initial SP, is addressable without overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLayout {
    base: u64,
    words: usize,
    end: u64,
}

impl StackLayout {
    pub fn new(base: u64, words: usize) -> Result<Self, EmulatorError> {
        let invalid = EmulatorError::InvalidStackLayout {
            base,
            words,
            limit: MAX_STACK_WORDS,
        };
        if words > MAX_STACK_WORDS {
            return Err(invalid);
        }
        let end = (words as u64)
            .checked_mul(WORD_BYTES)
            .and_then(|len| base.checked_add(len))
            .ok_or(invalid)?;
        Ok(Self { base, words, end })
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn words(&self) -> usize {
        self.words
    }

    /// One past the last slot; the initial SP.
    pub fn end(&self) -> u64 {
        self.end
    }
}

impl Default for StackLayout {
    fn default() -> Self {
        let base = EmulatorConfig::DEFAULT_STACK_BASE;
        let words = EmulatorConfig::DEFAULT_STACK_WORDS;
        Self {
            base,
            words,
            end: base + words as u64 * WORD_BYTES,
        }
    }
}

/// Mutable machine state for one emulation run.
///
/// x0 is an ordinary register here; nothing forces it to read as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    regs: [i64; NREGS],
    stack: Vec<u64>,
    layout: StackLayout,
    pc: u64,
}

impl MachineState {
    /// Zero the registers and stack, point PC at `entry`, RA at the 0
    /// sentinel, SP one past the last stack slot, and load A0-A3.
    pub fn init(entry: u64, args: [i64; 4], layout: StackLayout) -> Self {
        let mut state = Self {
            regs: [0; NREGS],
            stack: vec![0; layout.words()],
            layout,
            pc: entry,
        };
        state.set_reg(Gpr::RA, 0);
        state.set_reg(Gpr::SP, state.stack_end() as i64);
        for (reg, value) in [Gpr::A0, Gpr::A1, Gpr::A2, Gpr::A3].into_iter().zip(args) {
            state.set_reg(reg, value);
        }
        state
    }

    pub fn reg(&self, reg: Gpr) -> i64 {
        self.regs[reg.index()]
    }

    /// Write a register, returning its previous value.
    pub fn set_reg(&mut self, reg: Gpr, value: i64) -> i64 {
        core::mem::replace(&mut self.regs[reg.index()], value)
    }

    pub fn regs(&self) -> &[i64; NREGS] {
        &self.regs
    }

    pub fn pc(&self) -> u64 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u64) {
        self.pc = pc;
    }

    /// Advance to the next sequential instruction. A PC fetched from a
    /// [`CodeImage`](crate::CodeImage) is at least 4 below `u64::MAX`, so
    /// this never wraps onto the 0 sentinel.
    pub(crate) fn advance(&mut self) {
        self.pc = self.pc.wrapping_add(4);
    }

    pub fn stack(&self) -> &[u64] {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut [u64] {
        &mut self.stack
    }

    /// Emulated address of stack slot 0.
    pub fn stack_base(&self) -> u64 {
        self.layout.base()
    }

    /// Emulated address one past the last stack slot; the initial SP.
    pub fn stack_end(&self) -> u64 {
        self.layout.end()
    }

    /// Emulated address of stack slot `slot`.
    pub fn slot_address(&self, slot: usize) -> u64 {
        self.layout.base() + slot as u64 * WORD_BYTES
    }

    /// Whether SP currently lies within `[stack_base, stack_end]`.
    pub fn sp_in_bounds(&self) -> bool {
        let sp = self.reg(Gpr::SP) as u64;
        (self.stack_base()..=self.stack_end()).contains(&sp)
    }

    fn slot(&self, address: u64) -> Result<usize, EmulatorError> {
        address
            .checked_sub(self.layout.base())
            .filter(|offset| offset % WORD_BYTES == 0)
            .map(|offset| (offset / WORD_BYTES) as usize)
            .filter(|slot| *slot < self.stack.len())
            .ok_or(EmulatorError::StackAccess { address })
    }

    /// Read the stack word at an emulated address.
    pub fn stack_word(&self, address: u64) -> Result<u64, EmulatorError> {
        self.slot(address).map(|slot| self.stack[slot])
    }

    /// Write the stack word at an emulated address.
    pub fn set_stack_word(&mut self, address: u64, value: u64) -> Result<(), EmulatorError> {
        let slot = self.slot(address)?;
        self.stack[slot] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_state() -> MachineState {
        MachineState::init(0x1000, [0; 4], StackLayout::new(0x100, 4).unwrap())
    }

    #[test]
    fn test_init_layout() {
        let layout = StackLayout::new(0x8000_0000, 16).unwrap();
        let state = MachineState::init(0x1000, [1, 2, 3, -4], layout);

        assert_eq!(state.pc(), 0x1000);
        assert_eq!(state.reg(Gpr::RA), 0);
        assert_eq!(state.reg(Gpr::SP) as u64, 0x8000_0000 + 16 * 8);
        assert_eq!(state.reg(Gpr::A0), 1);
        assert_eq!(state.reg(Gpr::A1), 2);
        assert_eq!(state.reg(Gpr::A2), 3);
        assert_eq!(state.reg(Gpr::A3), -4);
        assert_eq!(state.reg(Gpr::A4), 0);
        assert!(state.stack().iter().all(|w| *w == 0));
        assert!(state.sp_in_bounds());
    }

    #[test]
    fn test_set_reg_returns_previous() {
        let mut state = small_state();
        assert_eq!(state.set_reg(Gpr::T0, 9), 0);
        assert_eq!(state.set_reg(Gpr::T0, 10), 9);
        // x0 holds whatever is written to it
        state.set_reg(Gpr::ZERO, 5);
        assert_eq!(state.reg(Gpr::ZERO), 5);
    }

    #[test]
    fn test_stack_word_bounds() {
        let mut state = small_state();
        state.set_stack_word(0x118, 77).unwrap();
        assert_eq!(state.stack_word(0x118), Ok(77));
        assert_eq!(state.stack()[3], 77);

        assert_eq!(
            state.stack_word(0x120),
            Err(EmulatorError::StackAccess { address: 0x120 })
        );
        assert!(state.stack_word(0xf8).is_err());
        assert!(state.stack_word(0x104).is_err());
    }

    #[test]
    fn test_sp_bounds() {
        let mut state = small_state();
        state.set_reg(Gpr::SP, 0x100);
        assert!(state.sp_in_bounds());
        state.set_reg(Gpr::SP, 0xf8);
        assert!(!state.sp_in_bounds());
    }

    #[test]
    fn test_stack_layout_checked() {
        let layout = StackLayout::new(0x100, 4).unwrap();
        assert_eq!(layout.end(), 0x120);
        assert_eq!(small_state().slot_address(3), 0x118);

        // the initial SP may be u64::MAX itself, but not past it
        let top = StackLayout::new(u64::MAX - 8, 1).unwrap();
        assert_eq!(top.end(), u64::MAX);
        assert!(StackLayout::new(u64::MAX - 7, 1).is_err());
        assert!(StackLayout::new(0, MAX_STACK_WORDS + 1).is_err());
        assert!(StackLayout::new(0, usize::MAX).is_err());
    }
}
