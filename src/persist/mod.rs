//! Persisted circuit format.
//!
//! Circuits are stored as JSON documents:
//!
//! ```json
//! {
//!   "name": "half-adder",
//!   "isCustomComponent": false,
//!   "components": [
//!     { "id": 0, "type": "Switch", "x": 0.0, "y": 0.0, "title": "A", "state": true },
//!     { "id": 1, "type": "Custom", "x": 100.0, "y": 0.0, "customName": "XOR" }
//!   ],
//!   "connections": [
//!     { "fromComponentId": 0, "fromPinIndex": 0, "toComponentId": 1, "toPinIndex": 0,
//!       "manualWirePath": [[60.0, 20.0], [100.0, 20.0]] }
//!   ]
//! }
//! ```
//!
//! Custom components are stored by name only and resolved against a
//! [`ComponentLibrary`] on load. Damaged entries (unknown custom names,
//! dangling ids, pin indices out of range) are skipped with a warning;
//! only unparseable JSON fails a load.

mod files;

pub use files::{load_file, load_library, save_file, save_library};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::circuit::{Circuit, ComponentId, PinId, Point};
use crate::components::{
    BusInput, BusOutput, Clock, ComponentKind, ComponentType, Led, Nand, Switch,
};
use crate::error::{NandboardError, Result};
use crate::library::ComponentLibrary;

/// A whole circuit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitDoc {
    #[serde(default)]
    pub name: String,
    /// Set on library definitions
    #[serde(default)]
    pub is_custom_component: bool,
    #[serde(default)]
    pub components: Vec<ComponentDoc>,
    #[serde(default)]
    pub connections: Vec<ConnectionDoc>,
}

/// One placed component. Kind-specific fields are only set for their kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDoc {
    pub id: usize,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Switch state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<bool>,
    /// Clock frequency in Hz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f32>,
    /// Library name of a custom component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Bus marker width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_count: Option<u32>,
    /// Bus input value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_titles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_titles: Vec<String>,
}

/// A wire, addressed by component id and positional pin index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDoc {
    pub from_component_id: usize,
    pub from_pin_index: usize,
    pub to_component_id: usize,
    pub to_pin_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_wire_path: Option<Vec<[f32; 2]>>,
}

/// Convert a circuit into its persisted form.
///
/// Components are numbered by declaration order, so ids in the document are
/// dense even after removals.
pub fn to_doc(circuit: &Circuit) -> CircuitDoc {
    let mut ids: HashMap<ComponentId, usize> = HashMap::new();
    let mut components = Vec::with_capacity(circuit.len());

    for (index, component) in circuit.components().enumerate() {
        ids.insert(component.id, index);
        let mut doc = ComponentDoc {
            id: index,
            component_type: component.component_type(),
            x: component.position.x,
            y: component.position.y,
            title: Some(component.title.clone()),
            input_titles: pin_names(circuit, &component.inputs),
            output_titles: pin_names(circuit, &component.outputs),
            ..ComponentDoc::default()
        };
        component.kind.element().save_params(&mut doc);
        components.push(doc);
    }

    let connections = circuit
        .connections()
        .into_iter()
        .filter_map(|conn| {
            let from = circuit.pin(conn.from)?;
            let to = circuit.pin(conn.to)?;
            let from_pin_index = circuit
                .component(from.owner)?
                .outputs
                .iter()
                .position(|p| *p == conn.from)?;
            let to_pin_index = circuit
                .component(to.owner)?
                .inputs
                .iter()
                .position(|p| *p == conn.to)?;
            Some(ConnectionDoc {
                from_component_id: *ids.get(&from.owner)?,
                from_pin_index,
                to_component_id: *ids.get(&to.owner)?,
                to_pin_index,
                manual_wire_path: to
                    .manual_path
                    .as_ref()
                    .map(|path| path.iter().map(|p| [p.x, p.y]).collect()),
            })
        })
        .collect();

    CircuitDoc {
        name: circuit.name.clone(),
        is_custom_component: false,
        components,
        connections,
    }
}

fn pin_names(circuit: &Circuit, pins: &[PinId]) -> Vec<String> {
    pins.iter()
        .filter_map(|p| circuit.pin(*p))
        .map(|p| p.name.clone())
        .collect()
}

/// Build the component kind a document entry describes.
///
/// `None` when a custom component isn't in the library.
fn kind_from_doc(doc: &ComponentDoc, library: &ComponentLibrary) -> Option<ComponentKind> {
    let kind = match doc.component_type {
        ComponentType::Nand => ComponentKind::Nand(Nand),
        ComponentType::Switch => ComponentKind::Switch(Switch::new(doc.state.unwrap_or(false))),
        ComponentType::Led => ComponentKind::Led(Led::default()),
        ComponentType::Clock => ComponentKind::Clock(Clock::new(doc.frequency.unwrap_or(1.0))),
        ComponentType::BusInput => {
            let mut bus = BusInput::new(doc.bit_count.unwrap_or(1));
            bus.set_value(doc.value.unwrap_or(0));
            ComponentKind::BusInput(bus)
        }
        ComponentType::BusOutput => {
            ComponentKind::BusOutput(BusOutput::new(doc.bit_count.unwrap_or(1)))
        }
        ComponentType::Custom => {
            let name = doc.custom_name.as_deref().unwrap_or_default();
            return library.instantiate(name);
        }
    };
    Some(kind)
}

/// Rebuild a circuit from its persisted form.
pub fn from_doc(doc: &CircuitDoc, library: &ComponentLibrary) -> Circuit {
    let mut circuit = Circuit::new(doc.name.clone());
    let mut ids: HashMap<usize, ComponentId> = HashMap::new();

    for entry in &doc.components {
        if ids.contains_key(&entry.id) {
            warn!(circuit = %doc.name, id = entry.id, "duplicate component id, skipping");
            continue;
        }
        let Some(kind) = kind_from_doc(entry, library) else {
            warn!(
                circuit = %doc.name,
                id = entry.id,
                custom_name = entry.custom_name.as_deref().unwrap_or_default(),
                "unknown custom component, skipping"
            );
            continue;
        };
        let id = circuit.add_titled(kind, Point::new(entry.x, entry.y), entry.title.clone());
        rename_pins(&mut circuit, id, &entry.input_titles, &entry.output_titles);
        ids.insert(entry.id, id);
    }

    for conn in &doc.connections {
        let (Some(&from_owner), Some(&to_owner)) =
            (ids.get(&conn.from_component_id), ids.get(&conn.to_component_id))
        else {
            warn!(
                circuit = %doc.name,
                from = conn.from_component_id,
                to = conn.to_component_id,
                "connection refers to a missing component, dropping"
            );
            continue;
        };
        let (Some(from), Some(to)) = (
            circuit.output_pin(from_owner, conn.from_pin_index),
            circuit.input_pin(to_owner, conn.to_pin_index),
        ) else {
            warn!(
                circuit = %doc.name,
                from_pin = conn.from_pin_index,
                to_pin = conn.to_pin_index,
                "pin index out of range, dropping connection"
            );
            continue;
        };
        if !circuit.connect(from, to) {
            continue;
        }
        if let Some(path) = &conn.manual_wire_path {
            let points = path.iter().map(|[x, y]| Point::new(*x, *y)).collect();
            circuit.set_manual_path(to, points);
        }
    }

    circuit.rebuild_title_counters();
    circuit
}

fn rename_pins(circuit: &mut Circuit, id: ComponentId, inputs: &[String], outputs: &[String]) {
    for (index, name) in inputs.iter().enumerate() {
        if let Some(pin) = circuit.input_pin(id, index) {
            circuit.set_pin_name(pin, name.clone());
        }
    }
    for (index, name) in outputs.iter().enumerate() {
        if let Some(pin) = circuit.output_pin(id, index) {
            circuit.set_pin_name(pin, name.clone());
        }
    }
}

/// Serialize a circuit to pretty-printed JSON.
pub fn to_json(circuit: &Circuit) -> Result<String> {
    serde_json::to_string_pretty(&to_doc(circuit)).map_err(|source| NandboardError::EncodeError {
        name: circuit.name.clone(),
        source,
    })
}

/// Parse a circuit from JSON, resolving custom components against `library`.
pub fn from_json(json: &str, library: &ComponentLibrary) -> Result<Circuit> {
    let doc: CircuitDoc =
        serde_json::from_str(json).map_err(|source| NandboardError::InvalidDocument {
            path: "<inline>".to_string(),
            source,
        })?;
    Ok(from_doc(&doc, library))
}
