//! Pin records stored in the circuit-wide pin table.

use super::types::{ComponentId, PinDirection, PinId, Point};
use crate::signal::Signal;

/// A named terminal on a component.
#[derive(Debug, Clone)]
pub struct Pin {
    pub name: String,
    pub direction: PinDirection,
    /// Component this pin belongs to
    pub owner: ComponentId,
    /// Value after the last evaluation round
    pub value: Signal,
    /// Upstream output pin (input pins only)
    pub source: Option<PinId>,
    /// Position relative to the owner's top-left corner
    pub offset: Point,
    /// User-authored wire path for the connection ending at this input,
    /// from the source pin to this pin
    pub manual_path: Option<Vec<Point>>,
}

impl Pin {
    pub fn new(name: String, direction: PinDirection, owner: ComponentId, offset: Point) -> Self {
        Self {
            name,
            direction,
            owner,
            value: Signal::Low,
            source: None,
            offset,
            manual_path: None,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }
}
