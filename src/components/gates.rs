//! The NAND gate.

use super::{ComponentType, Element};
use crate::signal::{nand, Signal};

/// Two-input NAND gate: `Q = nand(A, B)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nand;

impl Element for Nand {
    fn component_type(&self) -> ComponentType {
        ComponentType::Nand
    }

    fn input_names(&self) -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    fn output_names(&self) -> Vec<String> {
        vec!["Q".to_string()]
    }

    fn evaluate(&mut self, inputs: &[Signal], outputs: &mut [Signal]) {
        let a = inputs.first().copied().unwrap_or_default();
        let b = inputs.get(1).copied().unwrap_or_default();
        if let Some(q) = outputs.first_mut() {
            *q = nand(a, b);
        }
    }

    fn width_cells(&self) -> usize {
        3
    }
}
