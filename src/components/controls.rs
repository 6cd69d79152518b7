//! Control components: Switch and LED.

use super::{ComponentType, Element};
use crate::persist::ComponentDoc;
use crate::signal::Signal;

/// A toggle switch driving its single output.
///
/// The state is changed from outside the simulation loop (user clicks);
/// evaluation only reflects it onto the output pin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Switch {
    pub on: bool,
}

impl Switch {
    /// Create a new switch.
    pub fn new(on: bool) -> Self {
        Self { on }
    }

    /// Set the switch state.
    pub fn set_state(&mut self, on: bool) {
        self.on = on;
    }

    /// Toggle the switch state.
    pub fn toggle(&mut self) {
        self.on = !self.on;
    }

    /// Get the current output level.
    pub fn signal(&self) -> Signal {
        Signal::from(self.on)
    }
}

impl Element for Switch {
    fn component_type(&self) -> ComponentType {
        ComponentType::Switch
    }

    fn input_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn output_names(&self) -> Vec<String> {
        vec!["Q".to_string()]
    }

    fn evaluate(&mut self, _inputs: &[Signal], outputs: &mut [Signal]) {
        if let Some(q) = outputs.first_mut() {
            *q = self.signal();
        }
    }

    fn save_params(&self, doc: &mut ComponentDoc) {
        doc.state = Some(self.on);
    }
}

/// An indicator lamp. Lit while its input is high.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Led {
    pub lit: bool,
}

impl Element for Led {
    fn component_type(&self) -> ComponentType {
        ComponentType::Led
    }

    fn input_names(&self) -> Vec<String> {
        vec!["A".to_string()]
    }

    fn output_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn evaluate(&mut self, inputs: &[Signal], _outputs: &mut [Signal]) {
        self.lit = inputs.first().is_some_and(|s| s.is_high());
    }
}
