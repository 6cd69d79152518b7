//! Component models for logic simulation.
//!
//! This module provides every placeable circuit element:
//! - Gates: NAND (the only primitive)
//! - Controls: Switch, LED
//! - Sources: Clock, bus input/output markers
//! - Hierarchy: custom components wrapping a nested circuit
//!
//! Each kind implements [`Element`]; [`ComponentKind`] is the closed set of
//! kinds a circuit can hold.

mod controls;
mod custom;
mod gates;
mod sources;

pub use controls::{Led, Switch};
pub use custom::CustomComponent;
pub(crate) use custom::marker_pin_names;
pub use gates::Nand;
pub use sources::{BusInput, BusOutput, Clock};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::circuit::{ComponentId, PinId, Point, Rect};
use crate::persist::ComponentDoc;
use crate::signal::Signal;

/// Type tag of a component, as written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentType {
    #[default]
    #[serde(rename = "NAND")]
    Nand,
    Switch,
    #[serde(rename = "LED")]
    Led,
    Clock,
    BusInput,
    BusOutput,
    Custom,
}

impl ComponentType {
    /// Prefix used for generated titles.
    pub fn label(&self) -> &'static str {
        match self {
            ComponentType::Nand => "NAND",
            ComponentType::Switch => "Switch",
            ComponentType::Led => "LED",
            ComponentType::Clock => "Clock",
            ComponentType::BusInput => "In",
            ComponentType::BusOutput => "Out",
            ComponentType::Custom => "Custom",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Behaviour shared by every component kind.
pub trait Element {
    /// Type tag used for titles and persistence.
    fn component_type(&self) -> ComponentType;

    /// Default names of the input pins, in order.
    fn input_names(&self) -> Vec<String>;

    /// Default names of the output pins, in order.
    fn output_names(&self) -> Vec<String>;

    /// Compute new output values from the current input values.
    ///
    /// `outputs` holds the previous output values on entry.
    fn evaluate(&mut self, inputs: &[Signal], outputs: &mut [Signal]);

    /// Width of the body in grid cells.
    fn width_cells(&self) -> usize {
        2
    }

    /// Write kind-specific state into a persisted record.
    fn save_params(&self, _doc: &mut ComponentDoc) {}
}

/// The closed set of component kinds.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    Nand(Nand),
    Switch(Switch),
    Led(Led),
    Clock(Clock),
    BusInput(BusInput),
    BusOutput(BusOutput),
    Custom(Box<CustomComponent>),
}

impl ComponentKind {
    pub fn element(&self) -> &dyn Element {
        match self {
            ComponentKind::Nand(c) => c,
            ComponentKind::Switch(c) => c,
            ComponentKind::Led(c) => c,
            ComponentKind::Clock(c) => c,
            ComponentKind::BusInput(c) => c,
            ComponentKind::BusOutput(c) => c,
            ComponentKind::Custom(c) => c.as_ref(),
        }
    }

    pub fn element_mut(&mut self) -> &mut dyn Element {
        match self {
            ComponentKind::Nand(c) => c,
            ComponentKind::Switch(c) => c,
            ComponentKind::Led(c) => c,
            ComponentKind::Clock(c) => c,
            ComponentKind::BusInput(c) => c,
            ComponentKind::BusOutput(c) => c,
            ComponentKind::Custom(c) => c.as_mut(),
        }
    }

    pub fn component_type(&self) -> ComponentType {
        self.element().component_type()
    }

    /// Advance time-dependent state, descending into nested circuits.
    pub fn advance(&mut self, dt: f32) {
        match self {
            ComponentKind::Clock(clock) => clock.advance(dt),
            ComponentKind::Custom(custom) => custom.circuit.advance_clocks(dt),
            _ => {}
        }
    }

    /// Body size and pin offsets for the given grid size.
    ///
    /// Inputs sit on the left edge and outputs on the right edge, one grid
    /// cell apart, starting one cell below the top.
    pub fn layout(&self, grid: f32) -> PinLayout {
        let element = self.element();
        let n_in = element.input_names().len();
        let n_out = element.output_names().len();
        let rows = n_in.max(n_out).max(1) + 1;
        let width = element.width_cells() as f32 * grid;
        let height = rows as f32 * grid;
        PinLayout {
            width,
            height,
            inputs: (0..n_in)
                .map(|i| Point::new(0.0, (i + 1) as f32 * grid))
                .collect(),
            outputs: (0..n_out)
                .map(|i| Point::new(width, (i + 1) as f32 * grid))
                .collect(),
        }
    }
}

/// Geometry derived from a component's pin counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PinLayout {
    pub width: f32,
    pub height: f32,
    pub inputs: Vec<Point>,
    pub outputs: Vec<Point>,
}

/// A component placed in a circuit.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: ComponentId,
    /// User-visible title
    pub title: String,
    /// Top-left corner, grid aligned
    pub position: Point,
    pub width: f32,
    pub height: f32,
    /// Input pins in declaration order
    pub inputs: Vec<PinId>,
    /// Output pins in declaration order
    pub outputs: Vec<PinId>,
    pub selected: bool,
    pub kind: ComponentKind,
}

impl Component {
    pub fn component_type(&self) -> ComponentType {
        self.kind.component_type()
    }

    /// Bounding box of the body.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn as_switch_mut(&mut self) -> Option<&mut Switch> {
        match &mut self.kind {
            ComponentKind::Switch(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bus_input_mut(&mut self) -> Option<&mut BusInput> {
        match &mut self.kind {
            ComponentKind::BusInput(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomComponent> {
        match &self.kind {
            ComponentKind::Custom(c) => Some(c),
            _ => None,
        }
    }
}
