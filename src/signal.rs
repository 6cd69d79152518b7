//! Two-valued signal algebra.
//!
//! NAND is the only primitive. Every other operation is built from it so the
//! gate library stays honest about what the hardware can actually do.

use std::fmt;
use std::ops::Not;

/// A binary logic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    /// Logic 0. Unconnected inputs read as `Low`.
    #[default]
    Low,
    /// Logic 1.
    High,
}

impl Signal {
    /// Check if the signal is high.
    pub fn is_high(self) -> bool {
        self == Signal::High
    }

    /// Bit value (0 or 1).
    pub fn bit(self) -> u64 {
        match self {
            Signal::Low => 0,
            Signal::High => 1,
        }
    }
}

impl From<bool> for Signal {
    fn from(value: bool) -> Self {
        if value {
            Signal::High
        } else {
            Signal::Low
        }
    }
}

impl From<Signal> for bool {
    fn from(value: Signal) -> Self {
        value.is_high()
    }
}

impl Not for Signal {
    type Output = Signal;

    fn not(self) -> Signal {
        not(self)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bit())
    }
}

/// Low only when both inputs are high.
pub fn nand(a: Signal, b: Signal) -> Signal {
    match (a, b) {
        (Signal::High, Signal::High) => Signal::Low,
        _ => Signal::High,
    }
}

pub fn not(a: Signal) -> Signal {
    nand(a, a)
}

pub fn and(a: Signal, b: Signal) -> Signal {
    not(nand(a, b))
}

pub fn or(a: Signal, b: Signal) -> Signal {
    nand(not(a), not(b))
}

/// Four-NAND exclusive or.
pub fn xor(a: Signal, b: Signal) -> Signal {
    let n = nand(a, b);
    nand(nand(a, n), nand(b, n))
}
