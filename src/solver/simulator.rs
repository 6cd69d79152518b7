//! Main simulator interface.

use tracing::trace;

use crate::circuit::Circuit;

use super::{settle, SettleReport, MAX_ITERATIONS};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Maximum evaluation rounds per tick.
    pub max_iterations: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum evaluation rounds per tick.
    ///
    /// The cap bounds per-frame cost regardless of convergence. Oscillating
    /// circuits always use the full budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }
}

/// Drives a circuit tick by tick: clocks advance, then the circuit settles.
pub struct Simulator {
    /// The circuit being simulated
    circuit: Circuit,
    config: SimulatorConfig,
    /// Simulated seconds since creation
    elapsed: f64,
    /// Ticks run so far
    ticks: u64,
    last_report: Option<SettleReport>,
}

impl Simulator {
    /// Create a new simulator for the given circuit with default configuration.
    pub fn new(circuit: Circuit) -> Self {
        Self::with_config(circuit, SimulatorConfig::default())
    }

    /// Create a new simulator for the given circuit with custom configuration.
    pub fn with_config(circuit: Circuit, config: SimulatorConfig) -> Self {
        Self {
            circuit,
            config,
            elapsed: 0.0,
            ticks: 0,
            last_report: None,
        }
    }

    /// Settle without advancing time.
    pub fn settle(&mut self) -> SettleReport {
        let report = settle(&mut self.circuit, self.config.max_iterations);
        self.last_report = Some(report);
        report
    }

    /// Advance clocks by `dt` seconds and settle.
    pub fn step(&mut self, dt: f32) -> SettleReport {
        self.circuit.advance_clocks(dt);
        self.elapsed += f64::from(dt);
        self.ticks += 1;
        let report = self.settle();
        trace!(tick = self.ticks, iterations = report.iterations, stable = report.stable, "tick");
        report
    }

    /// Run `ticks` steps of `dt` seconds, returning the last report.
    pub fn run(&mut self, ticks: usize, dt: f32) -> Option<SettleReport> {
        (0..ticks).map(|_| self.step(dt)).last()
    }

    /// Simulated seconds since creation.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_report(&self) -> Option<SettleReport> {
        self.last_report
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Get a reference to the circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Get a mutable reference to the circuit.
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }
}
