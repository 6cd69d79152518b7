//! Exhaustive truth tables.
//!
//! Every combination of bus input bits is driven into a copy of the circuit,
//! the copy is settled, and the bus output bits are recorded. The first input
//! column is the most significant, so row `r` holds the inputs of `r` in
//! binary.

use std::fmt;

use crate::circuit::{Circuit, ComponentId};
use crate::components::{marker_pin_names, ComponentKind, ComponentType};
use crate::error::{NandboardError, Result};
use crate::library::ComponentLibrary;
use crate::signal::Signal;
use crate::solver::{settle, MAX_ITERATIONS};

/// Most input bits a table will enumerate.
pub const MAX_INPUT_BITS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthRow {
    pub inputs: Vec<Signal>,
    pub outputs: Vec<Signal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthTable {
    /// Input column names
    pub inputs: Vec<String>,
    /// Output column names
    pub outputs: Vec<String>,
    pub rows: Vec<TruthRow>,
}

fn columns(circuit: &Circuit, markers: &[ComponentId], use_outputs: bool) -> Vec<String> {
    markers
        .iter()
        .filter_map(|id| circuit.component(*id))
        .flat_map(|c| {
            let width = if use_outputs { c.outputs.len() } else { c.inputs.len() };
            marker_pin_names(&c.title, width)
        })
        .collect()
}

impl TruthTable {
    /// Enumerate the truth table of `circuit`. The circuit itself is not touched.
    pub fn generate(circuit: &Circuit) -> Result<Self> {
        let mut work = circuit.clone();
        let sources = work.components_of_type(ComponentType::BusInput);
        let sinks = work.components_of_type(ComponentType::BusOutput);

        let inputs = columns(&work, &sources, true);
        let outputs = columns(&work, &sinks, false);
        if inputs.len() > MAX_INPUT_BITS {
            return Err(NandboardError::TooManyInputs {
                count: inputs.len(),
                max: MAX_INPUT_BITS,
            });
        }

        let sink_pins: Vec<_> = sinks
            .iter()
            .filter_map(|id| work.component(*id))
            .flat_map(|c| c.inputs.iter().copied())
            .collect();

        let n = inputs.len();
        let mut rows = Vec::with_capacity(1 << n);
        for combination in 0u64..(1 << n) {
            let bits: Vec<Signal> = (0..n)
                .map(|column| Signal::from((combination >> (n - 1 - column)) & 1 == 1))
                .collect();
            drive(&mut work, &sources, &bits);
            settle(&mut work, MAX_ITERATIONS);
            rows.push(TruthRow {
                inputs: bits,
                outputs: sink_pins.iter().map(|p| work.pin_value(*p)).collect(),
            });
        }

        Ok(Self { inputs, outputs, rows })
    }

    /// Truth table of a library definition.
    pub fn for_definition(library: &ComponentLibrary, name: &str) -> Result<Self> {
        let definition = library
            .get(name)
            .ok_or_else(|| NandboardError::UnknownCustomComponent {
                name: name.to_string(),
            })?;
        Self::generate(definition)
    }

    /// Outputs for the row whose inputs spell `combination` in binary.
    pub fn output_for(&self, combination: usize) -> Option<&[Signal]> {
        self.rows.get(combination).map(|r| r.outputs.as_slice())
    }
}

/// Spread `bits` over the bus input markers, in column order.
fn drive(circuit: &mut Circuit, sources: &[ComponentId], bits: &[Signal]) {
    let mut remaining = bits;
    for id in sources {
        let Some(component) = circuit.component_mut(*id) else {
            continue;
        };
        let width = component.outputs.len().min(remaining.len());
        let (mine, rest) = remaining.split_at(width);
        if let ComponentKind::BusInput(bus) = &mut component.kind {
            bus.set_bits(mine);
        }
        remaining = rest;
    }
}

impl fmt::Display for TruthTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .inputs
            .iter()
            .chain(&self.outputs)
            .map(|name| name.len().max(1))
            .collect();
        let split = self.inputs.len();

        let line = |cells: Vec<String>| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            let (left, right) = padded.split_at(split.min(padded.len()));
            format!("{} | {}", left.join(" "), right.join(" "))
                .trim()
                .to_string()
        };

        writeln!(f, "{}", line(self.inputs.iter().chain(&self.outputs).cloned().collect()))?;
        for row in &self.rows {
            let cells = row.inputs.iter().chain(&row.outputs).map(Signal::to_string).collect();
            writeln!(f, "{}", line(cells))?;
        }
        Ok(())
    }
}
