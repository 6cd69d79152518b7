//! Editing session: the surface collaborators (renderer, input handling,
//! dialogs) talk to.
//!
//! A [`Session`] owns the working circuit, the custom component library and
//! the router. Structural edits go straight to the circuit; routed wires are
//! recomputed lazily when the circuit's revision moves on. File operations
//! never return errors: failures end up in [`Session::status`].

use std::fmt;
use std::path::Path;

use tracing::{error, info};

use crate::circuit::{snap_down, Circuit, ComponentId, PinId, Point, GRID_SIZE};
use crate::components::ComponentKind;
use crate::error::NandboardError;
use crate::library::ComponentLibrary;
use crate::persist;
use crate::routing::{RoutedWire, Router, RouterConfig, WireLayout};
use crate::signal::Signal;
use crate::solver::{settle, SettleReport, SimulatorConfig};
use crate::truth_table::TruthTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

/// Outcome of the last user-facing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub message: String,
    /// Reason code for rejected custom component builds
    pub code: Option<&'static str>,
}

impl Status {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            message: message.into(),
            code: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            message: message.into(),
            code: None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Default)]
pub struct Session {
    circuit: Circuit,
    library: ComponentLibrary,
    router: Router,
    config: SimulatorConfig,
    layout: Option<WireLayout>,
    status: Option<Status>,
}

impl Session {
    /// Start with an empty circuit and library.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_circuit(circuit: Circuit, library: ComponentLibrary) -> Self {
        Self {
            circuit,
            library,
            ..Self::default()
        }
    }

    pub fn with_router_config(mut self, config: RouterConfig) -> Self {
        self.router = Router::new(config);
        self.layout = None;
        self
    }

    pub fn with_simulator_config(mut self, config: SimulatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    /// Swap in a different working circuit.
    pub fn set_circuit(&mut self, circuit: Circuit) {
        self.circuit = circuit;
        self.layout = None;
    }

    pub fn library(&self) -> &ComponentLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut ComponentLibrary {
        &mut self.library
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Last status message, if any.
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    fn report(&mut self, status: Status) {
        match status.level {
            StatusLevel::Info => info!(message = %status.message, "status"),
            StatusLevel::Error => error!(message = %status.message, "status"),
        }
        self.status = Some(status);
    }

    // ============ Editing ============

    pub fn place(&mut self, kind: ComponentKind, position: Point) -> ComponentId {
        self.circuit.add_component(kind, position)
    }

    /// Place an instance of a library definition.
    pub fn place_custom(&mut self, name: &str, position: Point) -> Option<ComponentId> {
        match self.library.instantiate(name) {
            Some(kind) => Some(self.circuit.add_component(kind, position)),
            None => {
                let err = NandboardError::UnknownCustomComponent {
                    name: name.to_string(),
                };
                self.report(Status::error(err.to_string()));
                None
            }
        }
    }

    pub fn move_component(&mut self, id: ComponentId, position: Point) -> bool {
        self.circuit.move_component(id, position)
    }

    pub fn delete_component(&mut self, id: ComponentId) -> bool {
        self.circuit.remove_component(id)
    }

    pub fn connect(&mut self, a: PinId, b: PinId) -> bool {
        self.circuit.connect(a, b)
    }

    pub fn disconnect(&mut self, input: PinId) -> bool {
        self.circuit.disconnect(input)
    }

    /// Make the wire ending at `input` manually routed, seeded with a straight
    /// run between its two pins.
    pub fn promote_wire(&mut self, input: PinId) -> bool {
        self.circuit.promote_to_manual(input)
    }

    /// Insert a node on a manual wire near `point`.
    pub fn insert_wire_node(&mut self, input: PinId, point: Point) -> Option<usize> {
        let tolerance = self.router.config().hit_tolerance;
        self.circuit.insert_wire_node(input, point, tolerance)
    }

    pub fn move_wire_node(&mut self, input: PinId, index: usize, point: Point) -> bool {
        self.circuit.move_wire_node(input, index, point)
    }

    pub fn remove_wire_node(&mut self, input: PinId, index: usize) -> bool {
        self.circuit.remove_wire_node(input, index)
    }

    /// Hand a manual wire back to the router.
    pub fn unroute_wire(&mut self, input: PinId) -> bool {
        self.circuit.clear_manual_path(input)
    }

    /// Package the current selection as custom component `name`.
    ///
    /// Positions inside the definition are relative to the selection's
    /// top-left grid corner.
    pub fn build_component(&mut self, name: &str) -> bool {
        let selection = self.circuit.selected();
        let origin = self
            .circuit
            .components()
            .filter(|c| c.selected)
            .map(|c| c.position)
            .reduce(|a, b| Point::new(a.x.min(b.x), a.y.min(b.y)))
            .map(|p| Point::new(snap_down(p.x, GRID_SIZE), snap_down(p.y, GRID_SIZE)))
            .unwrap_or_default();

        match self
            .library
            .build_component(name, &self.circuit, &selection, origin)
        {
            Ok(_) => {
                self.report(Status::info(format!("Built custom component '{}'", name.trim())));
                true
            }
            Err(err) => {
                let mut status = Status::error(format!("Cannot build '{name}': {err}"));
                status.code = Some(err.code());
                self.report(status);
                false
            }
        }
    }

    /// Remove a library definition. Placed instances keep working.
    pub fn delete_custom(&mut self, name: &str) -> bool {
        let removed = self.library.delete(name);
        let status = if removed {
            Status::info(format!("Deleted custom component '{name}'"))
        } else {
            Status::error(
                NandboardError::UnknownCustomComponent {
                    name: name.to_string(),
                }
                .to_string(),
            )
        };
        self.report(status);
        removed
    }

    // ============ Simulation ============

    /// Settle the working circuit.
    pub fn simulate(&mut self) -> SettleReport {
        settle(&mut self.circuit, self.config.max_iterations)
    }

    /// Advance clocks by `dt` seconds, then settle.
    pub fn step(&mut self, dt: f32) -> SettleReport {
        self.circuit.advance_clocks(dt);
        self.simulate()
    }

    pub fn pin_value(&self, pin: PinId) -> Signal {
        self.circuit.pin_value(pin)
    }

    /// Truth table of the working circuit, or `None` with an error status.
    pub fn truth_table(&mut self) -> Option<TruthTable> {
        match TruthTable::generate(&self.circuit) {
            Ok(table) => Some(table),
            Err(err) => {
                self.report(Status::error(err.to_string()));
                None
            }
        }
    }

    // ============ Queries ============

    pub fn component_at(&self, point: Point) -> Option<ComponentId> {
        self.circuit.component_at(point)
    }

    /// Pin within half a grid cell of `point`.
    pub fn pin_at(&self, point: Point) -> Option<PinId> {
        self.circuit
            .pin_at(point, self.router.config().grid_size / 2.0)
    }

    /// Wire (identified by its input pin) passing near `point`.
    pub fn wire_at(&mut self, point: Point) -> Option<PinId> {
        let tolerance = self.router.config().hit_tolerance;
        self.layout().wire_at(point, tolerance)
    }

    /// Routed wires, recomputed if the circuit changed since the last call.
    pub fn layout(&mut self) -> &WireLayout {
        if !self
            .layout
            .as_ref()
            .is_some_and(|l| l.is_current(&self.circuit))
        {
            self.layout = None;
        }
        self.layout
            .get_or_insert_with(|| WireLayout::compute(&self.circuit, &self.router))
    }

    pub fn wires(&mut self) -> &[RoutedWire] {
        self.layout().wires()
    }

    // ============ Files ============

    /// Replace the working circuit with the one at `path`.
    ///
    /// On failure the current circuit is kept.
    pub fn load(&mut self, path: &Path) -> bool {
        match persist::load_file(path, &self.library) {
            Ok(circuit) => {
                let status = Status::info(format!("Loaded '{}'", circuit.name));
                self.set_circuit(circuit);
                self.report(status);
                true
            }
            Err(err) => {
                self.report(Status::error(err.to_string()));
                false
            }
        }
    }

    pub fn save(&mut self, path: &Path) -> bool {
        match persist::save_file(&self.circuit, path) {
            Ok(()) => {
                self.report(Status::info(format!("Saved '{}'", path.display())));
                true
            }
            Err(err) => {
                self.report(Status::error(err.to_string()));
                false
            }
        }
    }

    /// Replace the library with the definitions in `dir`.
    pub fn load_library(&mut self, dir: &Path) -> bool {
        match persist::load_library(dir) {
            Ok(library) => {
                let status = Status::info(format!("Loaded {} custom components", library.len()));
                self.library = library;
                self.report(status);
                true
            }
            Err(err) => {
                self.report(Status::error(err.to_string()));
                false
            }
        }
    }

    pub fn save_library(&mut self, dir: &Path) -> bool {
        match persist::save_library(&self.library, dir) {
            Ok(count) => {
                self.report(Status::info(format!("Saved {count} custom components")));
                true
            }
            Err(err) => {
                self.report(Status::error(err.to_string()));
                false
            }
        }
    }
}
