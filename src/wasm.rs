//! WASM bindings for Nandboard Core.
//!
//! This module exposes an editing session to JavaScript front ends. Ids are
//! plain numbers on the JS side; wires are identified by their input pin.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCircuit } from 'nandboard_core';
//!
//! await init();
//!
//! const board = new WasmCircuit("demo");
//! const sw = board.add_component("Switch", 0, 0);
//! const led = board.add_component("LED", 200, 0);
//! board.connect(board.output_pin(sw, 0), board.input_pin(led, 0));
//!
//! // Once per animation frame:
//! board.step(1 / 60);
//! const lit = board.pin_value(board.input_pin(led, 0));
//! const wires = board.wire_points(); // [x0, y0, x1, y1, ..., NaN, NaN, ...]
//! ```

use wasm_bindgen::prelude::*;

use crate::circuit::{ComponentId, PinId, Point};
use crate::components::{BusInput, BusOutput, Clock, ComponentKind, Led, Nand, Switch};
use crate::error::NandboardError;
use crate::library::ComponentLibrary;
use crate::persist;
use crate::session::Session;
use crate::truth_table::TruthTable;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_error(err: NandboardError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn primitive_kind(type_name: &str) -> Option<ComponentKind> {
    let kind = match type_name {
        "NAND" => ComponentKind::Nand(Nand),
        "Switch" => ComponentKind::Switch(Switch::default()),
        "LED" => ComponentKind::Led(Led::default()),
        "Clock" => ComponentKind::Clock(Clock::default()),
        "BusInput" => ComponentKind::BusInput(BusInput::default()),
        "BusOutput" => ComponentKind::BusOutput(BusOutput::default()),
        _ => return None,
    };
    Some(kind)
}

/// WASM-compatible editing session.
#[wasm_bindgen]
pub struct WasmCircuit {
    session: Session,
}

#[wasm_bindgen]
impl WasmCircuit {
    /// Create an empty circuit.
    #[wasm_bindgen(constructor)]
    pub fn new(name: &str) -> WasmCircuit {
        let session = Session::with_circuit(crate::Circuit::new(name), ComponentLibrary::new());
        WasmCircuit { session }
    }

    /// Load a circuit from JSON, resolving custom components in the current library.
    #[wasm_bindgen]
    pub fn load_json(&mut self, json: &str) -> Result<(), JsValue> {
        let circuit = persist::from_json(json, self.session.library()).map_err(js_error)?;
        self.session.set_circuit(circuit);
        Ok(())
    }

    /// Serialize the circuit to JSON.
    #[wasm_bindgen]
    pub fn to_json(&self) -> Result<String, JsValue> {
        persist::to_json(self.session.circuit()).map_err(js_error)
    }

    /// Add a library definition from its JSON document.
    #[wasm_bindgen]
    pub fn add_definition(&mut self, name: &str, json: &str) -> Result<(), JsValue> {
        let definition = persist::from_json(json, self.session.library()).map_err(js_error)?;
        self.session.library_mut().insert(name, definition);
        Ok(())
    }

    /// Place a component by type name (`NAND`, `Switch`, `LED`, `Clock`,
    /// `BusInput`, `BusOutput`) or by custom component name.
    #[wasm_bindgen]
    pub fn add_component(&mut self, type_name: &str, x: f32, y: f32) -> Result<usize, JsValue> {
        let position = Point::new(x, y);
        match primitive_kind(type_name) {
            Some(kind) => Ok(self.session.place(kind, position).0),
            None => self
                .session
                .place_custom(type_name, position)
                .map(|id| id.0)
                .ok_or_else(|| {
                    js_error(NandboardError::UnknownCustomComponent {
                        name: type_name.to_string(),
                    })
                }),
        }
    }

    #[wasm_bindgen]
    pub fn move_component(&mut self, id: usize, x: f32, y: f32) -> bool {
        self.session.move_component(ComponentId(id), Point::new(x, y))
    }

    #[wasm_bindgen]
    pub fn remove_component(&mut self, id: usize) -> bool {
        self.session.delete_component(ComponentId(id))
    }

    #[wasm_bindgen]
    pub fn input_pin(&self, id: usize, index: usize) -> Option<usize> {
        self.session.circuit().input_pin(ComponentId(id), index).map(|p| p.0)
    }

    #[wasm_bindgen]
    pub fn output_pin(&self, id: usize, index: usize) -> Option<usize> {
        self.session.circuit().output_pin(ComponentId(id), index).map(|p| p.0)
    }

    #[wasm_bindgen]
    pub fn connect(&mut self, a: usize, b: usize) -> bool {
        self.session.connect(PinId(a), PinId(b))
    }

    #[wasm_bindgen]
    pub fn disconnect(&mut self, input: usize) -> bool {
        self.session.disconnect(PinId(input))
    }

    #[wasm_bindgen]
    pub fn toggle_switch(&mut self, id: usize) -> Option<bool> {
        self.session.circuit_mut().toggle_switch(ComponentId(id))
    }

    #[wasm_bindgen]
    pub fn set_selected(&mut self, id: usize, selected: bool) -> bool {
        self.session.circuit_mut().set_selected(ComponentId(id), selected)
    }

    /// Package the selection as a custom component. Returns the status message.
    #[wasm_bindgen]
    pub fn build_component(&mut self, name: &str) -> Result<String, JsValue> {
        let built = self.session.build_component(name);
        let message = self.session.status().map(|s| s.message.clone()).unwrap_or_default();
        if built {
            Ok(message)
        } else {
            Err(JsValue::from_str(&message))
        }
    }

    #[wasm_bindgen]
    pub fn delete_custom(&mut self, name: &str) -> bool {
        self.session.delete_custom(name)
    }

    /// Advance clocks by `dt` seconds and settle. Returns whether the circuit settled.
    #[wasm_bindgen]
    pub fn step(&mut self, dt: f32) -> bool {
        self.session.step(dt).stable
    }

    #[wasm_bindgen]
    pub fn pin_value(&self, pin: usize) -> bool {
        self.session.pin_value(PinId(pin)).is_high()
    }

    #[wasm_bindgen]
    pub fn component_at(&self, x: f32, y: f32) -> Option<usize> {
        self.session.component_at(Point::new(x, y)).map(|id| id.0)
    }

    #[wasm_bindgen]
    pub fn pin_at(&self, x: f32, y: f32) -> Option<usize> {
        self.session.pin_at(Point::new(x, y)).map(|id| id.0)
    }

    /// Input pin of the wire under the point.
    #[wasm_bindgen]
    pub fn wire_at(&mut self, x: f32, y: f32) -> Option<usize> {
        self.session.wire_at(Point::new(x, y)).map(|id| id.0)
    }

    /// Switch the wire ending at `input` to a manual path.
    #[wasm_bindgen]
    pub fn promote_wire(&mut self, input: usize) -> bool {
        self.session.promote_wire(PinId(input))
    }

    #[wasm_bindgen]
    pub fn insert_wire_node(&mut self, input: usize, x: f32, y: f32) -> Option<usize> {
        self.session.insert_wire_node(PinId(input), Point::new(x, y))
    }

    #[wasm_bindgen]
    pub fn move_wire_node(&mut self, input: usize, index: usize, x: f32, y: f32) -> bool {
        self.session.move_wire_node(PinId(input), index, Point::new(x, y))
    }

    #[wasm_bindgen]
    pub fn remove_wire_node(&mut self, input: usize, index: usize) -> bool {
        self.session.remove_wire_node(PinId(input), index)
    }

    /// Every routed wire as flat `x, y` pairs, wires separated by a `NaN, NaN` pair.
    #[wasm_bindgen]
    pub fn wire_points(&mut self) -> Vec<f32> {
        let mut flat = Vec::new();
        for wire in self.session.wires() {
            for p in &wire.points {
                flat.extend([p.x, p.y]);
            }
            flat.extend([f32::NAN, f32::NAN]);
        }
        flat
    }

    /// Overlap count for each segment of the wire ending at `input`.
    #[wasm_bindgen]
    pub fn wire_overlaps(&mut self, input: usize) -> Vec<u32> {
        let layout = self.session.layout();
        layout
            .wire(PinId(input))
            .map(|wire| {
                wire.points
                    .windows(2)
                    .map(|seg| layout.overlap(seg[0], seg[1]) as u32)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Truth table of the circuit as text.
    #[wasm_bindgen]
    pub fn truth_table(&self) -> Result<String, JsValue> {
        TruthTable::generate(self.session.circuit())
            .map(|table| table.to_string())
            .map_err(js_error)
    }
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
