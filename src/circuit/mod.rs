//! Circuit graph representation and validation.
//!
//! This module provides the in-memory representation of a circuit. The
//! [`Circuit`] struct owns all components, the pin table and the wires
//! recorded on input pins, and answers geometric queries about them.

mod graph;
mod pin;
mod types;
mod validate;

pub use graph::{Circuit, Connection, TitleCounters};
pub use pin::Pin;
pub use types::*;
pub use validate::{is_valid_name, validate_selection};
