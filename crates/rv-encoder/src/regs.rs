//! General-purpose register names.

use alloc::{format, string::String};
use core::fmt;

/// ABI names indexed by register number.
const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// One of the 32 general-purpose registers x0-x31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gpr(u8);

impl Gpr {
    pub const ZERO: Gpr = Gpr(0);
    /// Return address.
    pub const RA: Gpr = Gpr(1);
    /// Stack pointer.
    pub const SP: Gpr = Gpr(2);
    pub const GP: Gpr = Gpr(3);
    pub const TP: Gpr = Gpr(4);
    pub const T0: Gpr = Gpr(5);
    pub const T1: Gpr = Gpr(6);
    pub const T2: Gpr = Gpr(7);
    pub const S0: Gpr = Gpr(8);
    pub const S1: Gpr = Gpr(9);
    /// First argument / return value.
    pub const A0: Gpr = Gpr(10);
    pub const A1: Gpr = Gpr(11);
    pub const A2: Gpr = Gpr(12);
    pub const A3: Gpr = Gpr(13);
    pub const A4: Gpr = Gpr(14);
    pub const A5: Gpr = Gpr(15);
    pub const A6: Gpr = Gpr(16);
    pub const A7: Gpr = Gpr(17);
    pub const T6: Gpr = Gpr(31);

    /// Create a register from its number.
    ///
    /// # Panics
    ///
    /// Panics if `num >= 32`.
    pub fn new(num: u8) -> Self {
        assert!(num < 32, "Register number must be < 32");
        Self(num)
    }

    /// Build a register from a 5-bit instruction field. Upper bits are ignored,
    /// so this never fails.
    pub const fn from_field(field: u32) -> Self {
        Self((field & 0x1f) as u8)
    }

    /// Register number (0-31).
    pub const fn num(self) -> u8 {
        self.0
    }

    /// Register number as an index into a register file.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// ABI name, e.g. `a0`.
    pub fn abi_name(self) -> &'static str {
        ABI_NAMES[self.index()]
    }

    /// Parse `x0`..`x31`, an ABI name, or the `fp` alias.
    pub fn from_name(name: &str) -> Result<Self, String> {
        if name == "fp" {
            return Ok(Gpr::S0);
        }
        if let Some(pos) = ABI_NAMES.iter().position(|n| *n == name) {
            return Ok(Gpr(pos as u8));
        }
        name.strip_prefix('x')
            .and_then(|digits| digits.parse::<u8>().ok())
            .filter(|num| *num < 32)
            .map(Gpr)
            .ok_or_else(|| format!("Invalid register name: {}", name))
    }
}

impl fmt::Display for Gpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}
