//! Custom components: a whole circuit packaged as one component.
//!
//! The inner circuit's bus input markers become the component's input pins
//! and its bus output markers become the output pins, in declaration order
//! and then bit order. Every placed instance owns its own copy of the inner
//! circuit, so instances never share simulation state.

use super::{ComponentKind, ComponentType, Element};
use crate::circuit::{Circuit, ComponentId};
use crate::persist::ComponentDoc;
use crate::signal::Signal;
use crate::solver::{settle, MAX_ITERATIONS};

#[derive(Debug, Clone)]
pub struct CustomComponent {
    /// Library name this instance was created from
    pub name: String,
    /// Owned inner circuit
    pub circuit: Circuit,
    /// Bus input markers, in pin order
    input_markers: Vec<ComponentId>,
    /// Bus output markers, in pin order
    output_markers: Vec<ComponentId>,
}

pub(crate) fn marker_pin_names(title: &str, count: usize) -> Vec<String> {
    if count == 1 {
        vec![title.to_string()]
    } else {
        (0..count).map(|i| format!("{title}[{i}]")).collect()
    }
}

impl CustomComponent {
    /// Wrap `circuit` as a component named `name`.
    pub fn new(name: impl Into<String>, circuit: Circuit) -> Self {
        let input_markers = circuit.components_of_type(ComponentType::BusInput);
        let output_markers = circuit.components_of_type(ComponentType::BusOutput);
        Self {
            name: name.into(),
            circuit,
            input_markers,
            output_markers,
        }
    }

    /// Number of visible input pins.
    pub fn input_count(&self) -> usize {
        self.input_markers
            .iter()
            .filter_map(|id| self.circuit.component(*id))
            .map(|c| c.outputs.len())
            .sum()
    }

    /// Number of visible output pins.
    pub fn output_count(&self) -> usize {
        self.output_markers
            .iter()
            .filter_map(|id| self.circuit.component(*id))
            .map(|c| c.inputs.len())
            .sum()
    }

    /// Drive the inner bus input markers from external input values.
    fn feed_inputs(&mut self, inputs: &[Signal]) {
        let mut remaining = inputs;
        for id in &self.input_markers {
            let Some(component) = self.circuit.components.get_mut(id.0).and_then(Option::as_mut)
            else {
                continue;
            };
            let width = component.outputs.len();
            let take = width.min(remaining.len());
            let (bits, rest) = remaining.split_at(take);
            if let ComponentKind::BusInput(bus) = &mut component.kind {
                bus.set_bits(bits);
            }
            remaining = rest;
        }
    }
}

impl Element for CustomComponent {
    fn component_type(&self) -> ComponentType {
        ComponentType::Custom
    }

    fn input_names(&self) -> Vec<String> {
        self.input_markers
            .iter()
            .filter_map(|id| self.circuit.component(*id))
            .flat_map(|c| marker_pin_names(&c.title, c.outputs.len()))
            .collect()
    }

    fn output_names(&self) -> Vec<String> {
        self.output_markers
            .iter()
            .filter_map(|id| self.circuit.component(*id))
            .flat_map(|c| marker_pin_names(&c.title, c.inputs.len()))
            .collect()
    }

    fn evaluate(&mut self, inputs: &[Signal], outputs: &mut [Signal]) {
        self.feed_inputs(inputs);
        // A non-settling inner circuit keeps its last values.
        settle(&mut self.circuit, MAX_ITERATIONS);

        let values = self
            .output_markers
            .iter()
            .filter_map(|id| self.circuit.component(*id))
            .flat_map(|c| c.inputs.iter())
            .map(|pin| self.circuit.pin_value(*pin));
        for (out, value) in outputs.iter_mut().zip(values) {
            *out = value;
        }
    }

    fn width_cells(&self) -> usize {
        4
    }

    fn save_params(&self, doc: &mut ComponentDoc) {
        doc.custom_name = Some(self.name.clone());
    }
}
