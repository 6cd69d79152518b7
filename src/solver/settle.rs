//! The bounded settle loop.

use tracing::debug;

use crate::circuit::Circuit;
use crate::signal::Signal;

/// Outcome of one settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleReport {
    /// Evaluation rounds run
    pub iterations: usize,
    /// Whether the last round changed nothing
    pub stable: bool,
}

/// Evaluate `circuit` until it is stable or `max_iterations` rounds have run.
pub fn settle(circuit: &mut Circuit, max_iterations: usize) -> SettleReport {
    let Circuit {
        components,
        order,
        pins,
        ..
    } = &mut *circuit;

    let mut inputs: Vec<Signal> = Vec::new();
    let mut previous: Vec<Signal> = Vec::new();
    let mut outputs: Vec<Signal> = Vec::new();

    for iteration in 1..=max_iterations {
        let mut changed = false;

        for id in order.iter() {
            let Some(component) = components[id.0].as_mut() else {
                continue;
            };

            // Pull inputs from upstream outputs
            inputs.clear();
            for pin_id in &component.inputs {
                let upstream = pins[pin_id.0]
                    .as_ref()
                    .and_then(|pin| pin.source)
                    .and_then(|src| pins[src.0].as_ref())
                    .map(|src| src.value)
                    .unwrap_or_default();
                if let Some(pin) = pins[pin_id.0].as_mut() {
                    pin.value = upstream;
                }
                inputs.push(upstream);
            }

            previous.clear();
            previous.extend(component.outputs.iter().map(|pin_id| {
                pins[pin_id.0]
                    .as_ref()
                    .map(|pin| pin.value)
                    .unwrap_or_default()
            }));
            outputs.clear();
            outputs.extend_from_slice(&previous);

            component.kind.element_mut().evaluate(&inputs, &mut outputs);

            if outputs != previous {
                changed = true;
                for (pin_id, value) in component.outputs.iter().zip(&outputs) {
                    if let Some(pin) = pins[pin_id.0].as_mut() {
                        pin.value = *value;
                    }
                }
            }
        }

        if !changed {
            return SettleReport {
                iterations: iteration,
                stable: true,
            };
        }
    }

    debug!(
        circuit = %circuit.name,
        max_iterations,
        "circuit did not settle, keeping last values"
    );
    SettleReport {
        iterations: max_iterations,
        stable: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{ComponentId, Point};
    use crate::components::{ComponentKind, Led, Nand, Switch};
    use crate::solver::MAX_ITERATIONS;

    fn led_lit(circuit: &Circuit, id: ComponentId) -> bool {
        match &circuit.component(id).unwrap().kind {
            ComponentKind::Led(led) => led.lit,
            _ => panic!("not an LED"),
        }
    }

    /// Two switches feeding a NAND gate wired to an LED.
    fn switch_nand_led(a_on: bool, b_on: bool) -> (Circuit, [ComponentId; 4]) {
        let mut circuit = Circuit::new("demo");
        let a = circuit.add_component(
            ComponentKind::Switch(Switch::new(a_on)),
            Point::new(0.0, 0.0),
        );
        let b = circuit.add_component(
            ComponentKind::Switch(Switch::new(b_on)),
            Point::new(0.0, 80.0),
        );
        let gate = circuit.add_component(ComponentKind::Nand(Nand), Point::new(100.0, 40.0));
        let led = circuit.add_component(
            ComponentKind::Led(Led::default()),
            Point::new(220.0, 40.0),
        );
        circuit.connect(circuit.output_pin(a, 0).unwrap(), circuit.input_pin(gate, 0).unwrap());
        circuit.connect(circuit.output_pin(b, 0).unwrap(), circuit.input_pin(gate, 1).unwrap());
        circuit.connect(circuit.output_pin(gate, 0).unwrap(), circuit.input_pin(led, 0).unwrap());
        (circuit, [a, b, gate, led])
    }

    #[test]
    fn test_unconnected_nand_outputs_high() {
        let mut circuit = Circuit::new("lone");
        let gate = circuit.add_component(ComponentKind::Nand(Nand), Point::default());
        let report = circuit.simulate();
        assert!(report.stable);
        assert_eq!(circuit.pin_value(circuit.output_pin(gate, 0).unwrap()), Signal::High);
    }

    #[test]
    fn test_switch_scenario() {
        let (mut circuit, [_, b, _, led]) = switch_nand_led(true, false);
        assert!(circuit.simulate().stable);
        assert!(led_lit(&circuit, led));

        circuit.toggle_switch(b);
        assert!(circuit.simulate().stable);
        assert!(!led_lit(&circuit, led));
    }

    #[test]
    fn test_settle_is_idempotent() {
        let (mut circuit, _) = switch_nand_led(true, true);
        circuit.simulate();
        let first: Vec<Signal> = circuit.pins.iter().flatten().map(|p| p.value).collect();
        let report = circuit.simulate();
        let second: Vec<Signal> = circuit.pins.iter().flatten().map(|p| p.value).collect();
        assert_eq!(first, second);
        assert!(report.stable);
        assert_eq!(report.iterations, 1);
    }

    #[test]
    fn test_nand_latch_settles() {
        // Cross-coupled SR latch with active-low set/reset switches
        let mut circuit = Circuit::new("latch");
        let set_n = circuit.add_component(
            ComponentKind::Switch(Switch::new(false)),
            Point::new(0.0, 0.0),
        );
        let reset_n = circuit.add_component(
            ComponentKind::Switch(Switch::new(true)),
            Point::new(0.0, 100.0),
        );
        let top = circuit.add_component(ComponentKind::Nand(Nand), Point::new(100.0, 0.0));
        let bottom = circuit.add_component(ComponentKind::Nand(Nand), Point::new(100.0, 100.0));
        let q = circuit.output_pin(top, 0).unwrap();
        let q_n = circuit.output_pin(bottom, 0).unwrap();
        circuit.connect(circuit.output_pin(set_n, 0).unwrap(), circuit.input_pin(top, 0).unwrap());
        circuit.connect(q_n, circuit.input_pin(top, 1).unwrap());
        circuit.connect(
            circuit.output_pin(reset_n, 0).unwrap(),
            circuit.input_pin(bottom, 1).unwrap(),
        );
        circuit.connect(q, circuit.input_pin(bottom, 0).unwrap());

        let report = settle(&mut circuit, MAX_ITERATIONS);
        assert!(report.stable);
        assert!(report.iterations < MAX_ITERATIONS);
        assert_eq!(circuit.pin_value(q), Signal::High);
        assert_eq!(circuit.pin_value(q_n), Signal::Low);

        // Release set: the latch holds its state
        circuit.set_switch(set_n, true);
        assert!(circuit.simulate().stable);
        assert_eq!(circuit.pin_value(q), Signal::High);
        assert_eq!(circuit.pin_value(q_n), Signal::Low);

        // Pull reset: the latch flips
        circuit.set_switch(reset_n, false);
        assert!(circuit.simulate().stable);
        assert_eq!(circuit.pin_value(q), Signal::Low);
        assert_eq!(circuit.pin_value(q_n), Signal::High);
    }

    #[test]
    fn test_ring_oscillator_hits_cap() {
        // Three NANDs wired as inverters in a loop
        let mut circuit = Circuit::new("ring");
        let a = circuit.add_component(ComponentKind::Nand(Nand), Point::new(0.0, 0.0));
        let b = circuit.add_component(ComponentKind::Nand(Nand), Point::new(100.0, 0.0));
        let c = circuit.add_component(ComponentKind::Nand(Nand), Point::new(200.0, 0.0));
        for (from, to) in [(a, b), (b, c), (c, a)] {
            let out = circuit.output_pin(from, 0).unwrap();
            circuit.connect(out, circuit.input_pin(to, 0).unwrap());
            circuit.connect(out, circuit.input_pin(to, 1).unwrap());
        }

        let report = settle(&mut circuit, 50);
        assert!(!report.stable);
        assert_eq!(report.iterations, 50);
    }

    #[test]
    fn test_removal_reverts_inputs_to_low() {
        let mut circuit = Circuit::new("fanout");
        let source = circuit.add_component(
            ComponentKind::Switch(Switch::new(true)),
            Point::default(),
        );
        let out = circuit.output_pin(source, 0).unwrap();
        let gates: Vec<ComponentId> = (0..3)
            .map(|i| {
                circuit.add_component(ComponentKind::Nand(Nand), Point::new(100.0, 80.0 * i as f32))
            })
            .collect();
        for gate in &gates {
            circuit.connect(out, circuit.input_pin(*gate, 0).unwrap());
        }
        circuit.simulate();
        for gate in &gates {
            assert_eq!(circuit.pin_value(circuit.input_pin(*gate, 0).unwrap()), Signal::High);
        }

        circuit.remove_component(source);
        circuit.simulate();
        for gate in &gates {
            let input = circuit.input_pin(*gate, 0).unwrap();
            assert_eq!(circuit.pin_value(input), Signal::Low);
            assert!(circuit.pin(input).unwrap().source.is_none());
        }
    }
}
