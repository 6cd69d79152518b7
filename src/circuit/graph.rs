//! Circuit graph structure.

use std::collections::HashMap;

use tracing::trace;

use super::pin::Pin;
use super::types::{ComponentId, PinDirection, PinId, Point, Rect, GRID_SIZE};
use crate::components::{Component, ComponentKind, ComponentType};
use crate::error::{NandboardError, Result};
use crate::signal::Signal;
use crate::solver::{settle, SettleReport, MAX_ITERATIONS};

/// A wire between an output pin and an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: PinId,
    pub to: PinId,
}

/// Per-prefix counters used to title new components ("NAND 3").
#[derive(Debug, Clone, Default)]
pub struct TitleCounters {
    counters: HashMap<String, usize>,
}

impl TitleCounters {
    /// Produce the next title for `prefix`.
    pub fn next(&mut self, prefix: &str) -> String {
        let n = self.counters.entry(prefix.to_string()).or_insert(0);
        *n += 1;
        format!("{prefix} {n}")
    }

    /// Raise the counter for a prefix if `title` uses a higher number.
    pub fn observe(&mut self, prefix: &str, title: &str) {
        let Some(rest) = title.strip_prefix(prefix).and_then(|r| r.strip_prefix(' ')) else {
            return;
        };
        if let Ok(n) = rest.parse::<usize>() {
            let entry = self.counters.entry(prefix.to_string()).or_insert(0);
            *entry = (*entry).max(n);
        }
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }
}

fn title_prefix(kind: &ComponentKind) -> String {
    match kind {
        ComponentKind::Custom(custom) => custom.name.clone(),
        other => other.component_type().label().to_string(),
    }
}

/// A circuit: components, their pins and the wires between them.
///
/// Components live in slots indexed by [`ComponentId`] and pins in a single
/// table indexed by [`PinId`]. Ids are never reused, so a removed component
/// leaves an empty slot. Evaluation follows declaration order.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    /// Circuit name (file stem or custom component name)
    pub name: String,
    pub(crate) components: Vec<Option<Component>>,
    /// Live component ids in declaration order
    pub(crate) order: Vec<ComponentId>,
    pub(crate) pins: Vec<Option<Pin>>,
    titles: TitleCounters,
    revision: u64,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Counter bumped by every structural or geometric change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // ============ Components ============

    /// Place a component at `position` (snapped to the grid) with a generated title.
    pub fn add_component(&mut self, kind: ComponentKind, position: Point) -> ComponentId {
        self.add_titled(kind, position, None)
    }

    /// Place a component with an explicit title, or a generated one if `None`.
    pub fn add_titled(
        &mut self,
        kind: ComponentKind,
        position: Point,
        title: Option<String>,
    ) -> ComponentId {
        let id = ComponentId(self.components.len());
        let layout = kind.layout(GRID_SIZE);
        let element = kind.element();

        let mut inputs = Vec::with_capacity(layout.inputs.len());
        for (name, offset) in element.input_names().into_iter().zip(&layout.inputs) {
            inputs.push(self.push_pin(Pin::new(name, PinDirection::Input, id, *offset)));
        }
        let mut outputs = Vec::with_capacity(layout.outputs.len());
        for (name, offset) in element.output_names().into_iter().zip(&layout.outputs) {
            outputs.push(self.push_pin(Pin::new(name, PinDirection::Output, id, *offset)));
        }

        let title = match title {
            Some(t) => {
                self.titles.observe(&title_prefix(&kind), &t);
                t
            }
            None => self.titles.next(&title_prefix(&kind)),
        };

        trace!(%id, %title, "adding component");
        self.components.push(Some(Component {
            id,
            title,
            position: position.snapped(GRID_SIZE),
            width: layout.width,
            height: layout.height,
            inputs,
            outputs,
            selected: false,
            kind,
        }));
        self.order.push(id);
        self.touch();
        id
    }

    fn push_pin(&mut self, pin: Pin) -> PinId {
        let id = PinId(self.pins.len());
        self.pins.push(Some(pin));
        id
    }

    /// Remove a component and every wire touching it.
    ///
    /// Inputs elsewhere that were fed by this component revert to `Low`.
    pub fn remove_component(&mut self, id: ComponentId) -> bool {
        let Some(component) = self.components.get_mut(id.0).and_then(Option::take) else {
            return false;
        };
        self.order.retain(|c| *c != id);

        for pin in self.pins.iter_mut().flatten() {
            if pin.source.is_some_and(|s| component.outputs.contains(&s)) {
                pin.source = None;
                pin.manual_path = None;
                pin.value = Signal::Low;
            }
        }
        for pin_id in component.inputs.iter().chain(&component.outputs) {
            self.pins[pin_id.0] = None;
        }
        self.touch();
        true
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0).and_then(Option::as_ref)
    }

    /// Mutable access to a component. Counts as a change for cached layouts.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.touch();
        self.components.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Live components in declaration order.
    pub fn components(&self) -> impl Iterator<Item = &Component> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.components[id.0].as_ref())
    }

    /// Live component ids in declaration order.
    pub fn component_ids(&self) -> &[ComponentId] {
        &self.order
    }

    /// Ids of components of the given type, in declaration order.
    pub fn components_of_type(&self, ty: ComponentType) -> Vec<ComponentId> {
        self.components()
            .filter(|c| c.component_type() == ty)
            .map(|c| c.id)
            .collect()
    }

    /// Find a component by title.
    pub fn find_by_title(&self, title: &str) -> Option<ComponentId> {
        self.components().find(|c| c.title == title).map(|c| c.id)
    }

    /// Move a component to `position`, snapped to the grid.
    ///
    /// Manual wire paths touching the component keep their endpoints on the
    /// pins.
    pub fn move_component(&mut self, id: ComponentId, position: Point) -> bool {
        let Some(component) = self.components.get_mut(id.0).and_then(Option::as_mut) else {
            return false;
        };
        component.position = position.snapped(GRID_SIZE);
        self.sync_manual_endpoints(id);
        self.touch();
        true
    }

    /// Rename a component.
    pub fn set_title(&mut self, id: ComponentId, title: impl Into<String>) -> bool {
        let Some(component) = self.components.get_mut(id.0).and_then(Option::as_mut) else {
            return false;
        };
        component.title = title.into();
        self.touch();
        true
    }

    /// Re-derive title counters from existing titles (after bulk load).
    pub fn rebuild_title_counters(&mut self) {
        self.titles.clear();
        for slot in self.components.iter().flatten() {
            self.titles.observe(&title_prefix(&slot.kind), &slot.title);
        }
    }

    // ============ Pins ============

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Current value of a pin. Unknown pins read `Low`.
    pub fn pin_value(&self, id: PinId) -> Signal {
        self.pin(id).map(|p| p.value).unwrap_or_default()
    }

    /// Absolute position of a pin.
    pub fn pin_position(&self, id: PinId) -> Option<Point> {
        let pin = self.pin(id)?;
        let owner = self.component(pin.owner)?;
        Some(owner.position + pin.offset)
    }

    pub fn input_pin(&self, component: ComponentId, index: usize) -> Option<PinId> {
        self.component(component)?.inputs.get(index).copied()
    }

    pub fn output_pin(&self, component: ComponentId, index: usize) -> Option<PinId> {
        self.component(component)?.outputs.get(index).copied()
    }

    /// Rename a pin.
    pub fn set_pin_name(&mut self, id: PinId, name: impl Into<String>) -> bool {
        match self.pin_mut(id) {
            Some(pin) => {
                pin.name = name.into();
                true
            }
            None => false,
        }
    }

    // ============ Wires ============

    /// Connect an output pin to an input pin, in either argument order.
    ///
    /// Requests that don't pair one output with one input on different
    /// components are ignored and return `false`. An input that is already
    /// connected gets its upstream replaced.
    pub fn connect(&mut self, a: PinId, b: PinId) -> bool {
        let (Some(pa), Some(pb)) = (self.pin(a), self.pin(b)) else {
            return false;
        };
        if pa.owner == pb.owner || pa.direction == pb.direction {
            return false;
        }
        let (from, to) = if pa.is_output() { (a, b) } else { (b, a) };
        if let Some(input) = self.pin_mut(to) {
            if input.source != Some(from) {
                input.manual_path = None;
            }
            input.source = Some(from);
        }
        self.touch();
        true
    }

    /// Disconnect the wire ending at `input`.
    pub fn disconnect(&mut self, input: PinId) -> bool {
        let Some(pin) = self.pin_mut(input) else {
            return false;
        };
        if pin.source.take().is_none() {
            return false;
        }
        pin.manual_path = None;
        pin.value = Signal::Low;
        self.touch();
        true
    }

    /// Disconnect every wire touching a component, leaving it in place.
    pub fn disconnect_component(&mut self, id: ComponentId) -> bool {
        let Some(component) = self.component(id) else {
            return false;
        };
        let inputs = component.inputs.clone();
        let outputs = component.outputs.clone();
        for pin_id in inputs {
            self.disconnect(pin_id);
        }
        for pin in self.pins.iter_mut().flatten() {
            if pin.source.is_some_and(|s| outputs.contains(&s)) {
                pin.source = None;
                pin.manual_path = None;
                pin.value = Signal::Low;
            }
        }
        self.touch();
        true
    }

    /// All wires, ordered by the input side's declaration order.
    pub fn connections(&self) -> Vec<Connection> {
        self.components()
            .flat_map(|c| c.inputs.iter())
            .filter_map(|input| {
                let pin = self.pin(*input)?;
                pin.source.map(|from| Connection { from, to: *input })
            })
            .collect()
    }

    // ============ External state ============

    /// Flip a switch. Returns the new state.
    pub fn toggle_switch(&mut self, id: ComponentId) -> Option<bool> {
        let switch = self.component_mut(id)?.as_switch_mut()?;
        switch.toggle();
        Some(switch.on)
    }

    pub fn set_switch(&mut self, id: ComponentId, on: bool) -> bool {
        match self.component_mut(id).and_then(Component::as_switch_mut) {
            Some(switch) => {
                switch.set_state(on);
                true
            }
            None => false,
        }
    }

    /// Set the value driven by a bus input marker.
    pub fn set_bus_value(&mut self, id: ComponentId, value: u64) -> bool {
        match self.component_mut(id).and_then(Component::as_bus_input_mut) {
            Some(bus) => {
                bus.set_value(value);
                true
            }
            None => false,
        }
    }

    /// Drive the switch or bus input titled `title`. Switches are on for any
    /// non-zero value.
    pub fn set_input(&mut self, title: &str, value: u64) -> Result<()> {
        let id = self
            .find_by_title(title)
            .ok_or_else(|| NandboardError::TitleNotFound {
                title: title.to_string(),
            })?;
        let Some(component) = self.component_mut(id) else {
            return Err(NandboardError::ComponentNotFound { id: id.0 });
        };
        match &mut component.kind {
            ComponentKind::Switch(switch) => switch.set_state(value != 0),
            ComponentKind::BusInput(bus) => bus.set_value(value),
            other => {
                return Err(NandboardError::invalid_parameter(format!(
                    "'{title}' is a {}, not a switch or bus input",
                    other.component_type()
                )))
            }
        }
        Ok(())
    }

    /// Advance every clock by `dt` seconds, including clocks nested inside
    /// custom components.
    pub fn advance_clocks(&mut self, dt: f32) {
        for component in self.components.iter_mut().flatten() {
            component.kind.advance(dt);
        }
    }

    /// Settle the circuit with the default iteration cap.
    pub fn simulate(&mut self) -> SettleReport {
        settle(self, MAX_ITERATIONS)
    }

    // ============ Selection ============

    pub fn set_selected(&mut self, id: ComponentId, selected: bool) -> bool {
        match self.components.get_mut(id.0).and_then(Option::as_mut) {
            Some(c) => {
                c.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        for c in self.components.iter_mut().flatten() {
            c.selected = false;
        }
    }

    /// Select every component whose body intersects `area`.
    pub fn select_in_rect(&mut self, area: Rect) -> usize {
        let mut count = 0;
        for c in self.components.iter_mut().flatten() {
            c.selected = c.bounds().intersects(&area);
            count += usize::from(c.selected);
        }
        count
    }

    /// Selected component ids in declaration order.
    pub fn selected(&self) -> Vec<ComponentId> {
        self.components()
            .filter(|c| c.selected)
            .map(|c| c.id)
            .collect()
    }

    // ============ Geometry ============

    /// Topmost component whose body contains `point`.
    pub fn component_at(&self, point: Point) -> Option<ComponentId> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.component(*id))
            .find(|c| c.bounds().contains(point))
            .map(|c| c.id)
    }

    /// Closest pin within `radius` of `point`.
    pub fn pin_at(&self, point: Point, radius: f32) -> Option<PinId> {
        let mut best: Option<(PinId, f32)> = None;
        for component in self.components() {
            for pin_id in component.inputs.iter().chain(&component.outputs) {
                let Some(pin) = self.pin(*pin_id) else { continue };
                let d = (component.position + pin.offset).distance(point);
                if d <= radius && best.map_or(true, |(_, bd)| d < bd) {
                    best = Some((*pin_id, d));
                }
            }
        }
        best.map(|(id, _)| id)
    }

    /// Bodies of every component, in declaration order.
    pub fn obstacles(&self) -> Vec<Rect> {
        self.components().map(Component::bounds).collect()
    }
}
