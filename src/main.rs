//! Nandboard - NAND logic simulator
//!
//! Loads a circuit (and optionally a directory of custom components), drives
//! its switches and bus inputs, runs a number of clock ticks and prints the
//! resulting LED states and bus output values.
//!
//! # Usage
//!
//! ```bash
//! nandboard adder.json --library parts/ --set "a=3" --set "b=1" --ticks 1
//! nandboard xor.json --library parts/ --truth-table
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use nandboard_core::{
    components::ComponentKind,
    error::{NandboardError, Result},
    persist,
    solver::MAX_ITERATIONS,
    ComponentLibrary, Simulator, SimulatorConfig, TruthTable, DEFAULT_TICK_SECONDS,
};

/// NAND logic circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the circuit file (.json)
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: PathBuf,

    /// Directory of custom component definitions
    #[arg(short, long, value_name = "DIR")]
    library: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 1)]
    ticks: usize,

    /// Simulated seconds per tick
    #[arg(long, default_value_t = DEFAULT_TICK_SECONDS)]
    dt: f32,

    /// Evaluation rounds allowed per tick
    #[arg(long, default_value_t = MAX_ITERATIONS)]
    max_iterations: usize,

    /// Drive a switch or bus input before simulating (TITLE=VALUE)
    #[arg(short, long = "set", value_name = "TITLE=VALUE")]
    set: Vec<String>,

    /// Print the truth table over all bus inputs instead of simulating
    #[arg(long)]
    truth_table: bool,
}

fn parse_assignment(text: &str) -> Result<(&str, u64)> {
    let (title, value) = text.split_once('=').ok_or_else(|| {
        NandboardError::invalid_parameter(format!("expected TITLE=VALUE, got '{text}'"))
    })?;
    let value = value
        .trim()
        .parse::<u64>()
        .map_err(|e| NandboardError::invalid_parameter(format!("bad value in '{text}': {e}")))?;
    Ok((title.trim(), value))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load custom components first so the circuit can resolve them
    let library = match &args.library {
        Some(dir) => persist::load_library(dir)?,
        None => ComponentLibrary::new(),
    };
    let mut circuit = persist::load_file(&args.circuit_file, &library)?;

    for assignment in &args.set {
        let (title, value) = parse_assignment(assignment)?;
        circuit.set_input(title, value)?;
    }

    if args.truth_table {
        print!("{}", TruthTable::generate(&circuit)?);
        return Ok(());
    }

    let config = SimulatorConfig::new().with_max_iterations(args.max_iterations);
    let mut simulator = Simulator::with_config(circuit, config);
    let report = match simulator.run(args.ticks, args.dt) {
        Some(report) => report,
        None => simulator.settle(),
    };
    if !report.stable {
        warn!(
            iterations = report.iterations,
            "circuit did not settle; values are from the last round"
        );
    }

    for component in simulator.circuit().components() {
        match &component.kind {
            ComponentKind::Led(led) => {
                println!("{}: {}", component.title, if led.lit { "on" } else { "off" });
            }
            ComponentKind::BusOutput(bus) => println!("{} = {}", component.title, bus.value()),
            _ => {}
        }
    }

    Ok(())
}
