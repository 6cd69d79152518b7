//! Fixed-point simulation engine.
//!
//! Each call to [`settle`] runs evaluation rounds until no output pin changes
//! or the iteration cap is reached:
//!
//! 1. Every component (in declaration order) pulls each input from its
//!    upstream output, or `Low` when unconnected
//! 2. The component's outputs are snapshotted and `evaluate` is run
//! 3. A round that changes no output ends the loop: the circuit is stable
//!
//! Circuits that never settle (ring oscillators) stop at the cap and keep the
//! last computed values. That is designed behaviour, not an error.
//! Components nested inside custom components settle with the same loop.

mod settle;
mod simulator;

pub use settle::{settle, SettleReport};
pub use simulator::{Simulator, SimulatorConfig};

/// Default cap on evaluation rounds per settle.
pub const MAX_ITERATIONS: usize = 1000;
