//! # Nandboard Core
//!
//! A digital logic simulator built on a single primitive, the NAND gate.
//!
//! This library provides:
//! - A circuit model of NAND gates, switches, LEDs, clocks and bus markers
//! - Bounded fixed-point simulation that settles feedback loops such as latches
//! - Custom components: any circuit packaged and nested as a single part
//! - An orthogonal wire router with manual path overrides
//! - JSON persistence for circuits and component libraries
//!
//! ## Architecture
//!
//! - [`signal`] - Logic levels and the NAND primitive
//! - [`circuit`] - Components, pins and wires in index-based tables
//! - [`components`] - Component kinds and their evaluation rules
//! - [`solver`] - The settle loop and clocked simulation
//! - [`library`] - Named custom component definitions
//! - [`routing`] - Auto-routing, manual paths and wire layout
//! - [`persist`] - JSON documents on disk
//! - [`truth_table`] - Exhaustive input enumeration
//! - [`session`] - Editing surface for front ends
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! nandboard latch.json --library parts/ --set "Switch 1=1" --ticks 10
//! ```
//!
//! ### Library
//!
//! ```
//! use nandboard_core::components::{ComponentKind, Led, Nand, Switch};
//! use nandboard_core::{Circuit, Point, Signal};
//!
//! let mut circuit = Circuit::new("demo");
//! let a = circuit.add_component(ComponentKind::Switch(Switch::new(true)), Point::new(0.0, 0.0));
//! let gate = circuit.add_component(ComponentKind::Nand(Nand), Point::new(100.0, 0.0));
//! let led = circuit.add_component(ComponentKind::Led(Led::default()), Point::new(200.0, 0.0));
//!
//! let a_q = circuit.output_pin(a, 0).unwrap();
//! circuit.connect(a_q, circuit.input_pin(gate, 0).unwrap());
//! let led_in = circuit.input_pin(led, 0).unwrap();
//! circuit.connect(circuit.output_pin(gate, 0).unwrap(), led_in);
//!
//! // NAND(High, Low) with the second input unconnected
//! circuit.simulate();
//! assert_eq!(circuit.pin_value(led_in), Signal::High);
//! ```
//!
//! ## Simulation Method
//!
//! Each settle runs evaluation rounds over the components in declaration
//! order. A component reads its inputs from the upstream output values
//! (unconnected inputs read Low) and computes new outputs. The circuit is
//! stable once a round changes nothing; a circuit that keeps oscillating is
//! cut off after [`solver::MAX_ITERATIONS`] rounds and keeps its last values.

pub mod circuit;
pub mod components;
pub mod error;
pub mod library;
pub mod persist;
pub mod routing;
pub mod session;
pub mod signal;
pub mod solver;
pub mod truth_table;

// Re-export main types for convenience
pub use circuit::{Circuit, ComponentId, PinId, Point, Rect, GRID_SIZE};
pub use error::{BuildError, NandboardError, Result};
pub use library::ComponentLibrary;
pub use routing::{Router, RouterConfig, WireLayout};
pub use session::{Session, Status, StatusLevel};
pub use signal::Signal;
pub use solver::{Simulator, SimulatorConfig};
pub use truth_table::TruthTable;

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmCircuit;

/// Default simulated seconds per CLI tick
pub const DEFAULT_TICK_SECONDS: f32 = 1.0 / 60.0;
