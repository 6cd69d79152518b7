//! Library of custom component definitions.
//!
//! A definition is a circuit stored by name. Building one deep-clones a
//! selection out of a working circuit; instantiating one clones the stored
//! circuit again, so neither the source circuit nor other instances are ever
//! aliased.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::info;

use crate::circuit::{validate_selection, Circuit, ComponentId, Point};
use crate::components::{ComponentKind, CustomComponent};
use crate::error::BuildError;

/// Name → definition map of custom components.
#[derive(Debug, Clone, Default)]
pub struct ComponentLibrary {
    definitions: BTreeMap<String, Circuit>,
}

impl ComponentLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Definition circuit stored under `name`.
    pub fn get(&self, name: &str) -> Option<&Circuit> {
        self.definitions.get(name)
    }

    /// Definition names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.definitions.keys().map(String::as_str)
    }

    /// Definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Circuit)> + '_ {
        self.definitions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Store a definition, replacing any previous one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, mut circuit: Circuit) {
        let name = name.into();
        circuit.name = name.clone();
        self.definitions.insert(name, circuit);
    }

    /// Package the selected components of `circuit` as definition `name`.
    ///
    /// Positions are stored relative to `grid_offset`. Wires crossing the
    /// selection boundary are dropped.
    pub fn build_component(
        &mut self,
        name: &str,
        circuit: &Circuit,
        selection: &[ComponentId],
        grid_offset: Point,
    ) -> Result<&Circuit, BuildError> {
        validate_selection(circuit, name, selection)?;
        let name = name.trim().to_string();
        let definition = extract_selection(circuit, selection, grid_offset, &name);
        info!(
            name = %name,
            components = definition.len(),
            wires = definition.connections().len(),
            "built custom component"
        );
        self.definitions.insert(name.clone(), definition);
        Ok(&self.definitions[&name])
    }

    /// Remove a definition. Placed instances keep working.
    pub fn delete(&mut self, name: &str) -> bool {
        let removed = self.definitions.remove(name).is_some();
        if removed {
            info!(name, "deleted custom component");
        }
        removed
    }

    /// Create a fresh instance of a definition.
    pub fn instantiate(&self, name: &str) -> Option<ComponentKind> {
        let definition = self.definitions.get(name)?;
        Some(ComponentKind::Custom(Box::new(CustomComponent::new(
            name,
            definition.clone(),
        ))))
    }
}

/// Deep-clone the selected components and the wires between them.
pub fn extract_selection(
    circuit: &Circuit,
    selection: &[ComponentId],
    offset: Point,
    name: &str,
) -> Circuit {
    let selected: HashSet<ComponentId> = selection.iter().copied().collect();
    let mut extracted = Circuit::new(name);
    let mut id_map: HashMap<ComponentId, ComponentId> = HashMap::new();

    // Declaration order is kept so the clone evaluates like the original.
    for component in circuit.components().filter(|c| selected.contains(&c.id)) {
        let new_id = extracted.add_titled(
            component.kind.clone(),
            component.position - offset,
            Some(component.title.clone()),
        );
        id_map.insert(component.id, new_id);

        let renames = component
            .inputs
            .iter()
            .enumerate()
            .map(|(i, p)| (extracted.input_pin(new_id, i), *p))
            .chain(
                component
                    .outputs
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (extracted.output_pin(new_id, i), *p)),
            )
            .collect::<Vec<_>>();
        for (new_pin, old_pin) in renames {
            if let (Some(new_pin), Some(old)) = (new_pin, circuit.pin(old_pin)) {
                extracted.set_pin_name(new_pin, old.name.clone());
            }
        }
    }

    for component in circuit.components().filter(|c| selected.contains(&c.id)) {
        for (to_index, input) in component.inputs.iter().enumerate() {
            let Some(pin) = circuit.pin(*input) else { continue };
            let Some(source) = pin.source.and_then(|s| circuit.pin(s)) else {
                continue;
            };
            let Some(&new_owner) = id_map.get(&source.owner) else {
                continue;
            };
            let Some(from_index) = circuit
                .component(source.owner)
                .and_then(|c| c.outputs.iter().position(|p| Some(*p) == pin.source))
            else {
                continue;
            };
            let (Some(from), Some(to)) = (
                extracted.output_pin(new_owner, from_index),
                extracted.input_pin(id_map[&component.id], to_index),
            ) else {
                continue;
            };
            extracted.connect(from, to);
            if let Some(path) = &pin.manual_path {
                extracted.set_manual_path(to, path.iter().map(|p| *p - offset).collect());
            }
        }
    }

    extracted.rebuild_title_counters();
    extracted
}
