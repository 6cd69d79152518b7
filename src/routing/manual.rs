//! Manual wire paths.
//!
//! A manual path replaces the auto-router for one wire. It is stored on the
//! wire's input pin as grid points whose first and last entries always sit
//! on the live pin positions. Only interior points are editable.

use crate::circuit::{Circuit, ComponentId, PinId, Point, GRID_SIZE};

impl Circuit {
    /// Manual path of the wire ending at `input`, if it has one.
    pub fn manual_path(&self, input: PinId) -> Option<&[Point]> {
        self.pin(input)?.manual_path.as_deref()
    }

    /// Live `(source, destination)` pin positions of the wire ending at `input`.
    pub fn wire_endpoints(&self, input: PinId) -> Option<(Point, Point)> {
        let source = self.pin(input)?.source?;
        Some((self.pin_position(source)?, self.pin_position(input)?))
    }

    /// Give the wire ending at `input` an explicit path.
    ///
    /// Points are snapped to the grid and the endpoints replaced by the live
    /// pin positions. Needs at least two points and a connected input.
    pub fn set_manual_path(&mut self, input: PinId, mut points: Vec<Point>) -> bool {
        if points.len() < 2 {
            return false;
        }
        let Some((start, end)) = self.wire_endpoints(input) else {
            return false;
        };
        for p in points.iter_mut() {
            *p = p.snapped(GRID_SIZE);
        }
        let last = points.len() - 1;
        points[0] = start;
        points[last] = end;

        let Some(pin) = self.pin_mut(input) else {
            return false;
        };
        pin.manual_path = Some(points);
        self.touch();
        true
    }

    /// Hand the wire back to the auto-router.
    pub fn clear_manual_path(&mut self, input: PinId) -> bool {
        let cleared = self
            .pin_mut(input)
            .is_some_and(|pin| pin.manual_path.take().is_some());
        if cleared {
            self.touch();
        }
        cleared
    }

    /// Turn an auto-routed wire into a manual one seeded with its two endpoints.
    pub fn promote_to_manual(&mut self, input: PinId) -> bool {
        if self.manual_path(input).is_some() {
            return false;
        }
        match self.wire_endpoints(input) {
            Some((start, end)) => self.set_manual_path(input, vec![start, end]),
            None => false,
        }
    }

    /// Insert a node on the segment nearest `point`, if one lies within
    /// `tolerance`. Returns the index of the new node.
    pub fn insert_wire_node(
        &mut self,
        input: PinId,
        point: Point,
        tolerance: f32,
    ) -> Option<usize> {
        let path = self.manual_path(input)?;
        let (segment, distance) = path
            .windows(2)
            .enumerate()
            .map(|(i, seg)| (i, point.distance_to_segment(seg[0], seg[1])))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        if distance > tolerance {
            return None;
        }

        let index = segment + 1;
        let path = self.pin_mut(input)?.manual_path.as_mut()?;
        path.insert(index, point.snapped(GRID_SIZE));
        self.touch();
        Some(index)
    }

    /// Delete an interior node. Endpoints cannot be deleted.
    pub fn remove_wire_node(&mut self, input: PinId, index: usize) -> bool {
        let Some(path) = self.pin_mut(input).and_then(|p| p.manual_path.as_mut()) else {
            return false;
        };
        if index == 0 || index + 1 >= path.len() {
            return false;
        }
        path.remove(index);
        self.touch();
        true
    }

    /// Drag an interior node to `point`, snapped to the grid.
    pub fn move_wire_node(&mut self, input: PinId, index: usize, point: Point) -> bool {
        let Some(path) = self.pin_mut(input).and_then(|p| p.manual_path.as_mut()) else {
            return false;
        };
        if index == 0 || index + 1 >= path.len() {
            return false;
        }
        path[index] = point.snapped(GRID_SIZE);
        self.touch();
        true
    }

    /// Re-pin manual path endpoints touching component `id` after it moved.
    pub(crate) fn sync_manual_endpoints(&mut self, id: ComponentId) {
        let Some(component) = self.component(id) else {
            return;
        };
        let outputs = component.outputs.clone();

        // Wires into this component end on its inputs; wires out of it start
        // on its outputs. Both are stored on the receiving input pin.
        let affected: Vec<PinId> = self
            .pins
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                let pin = slot.as_ref()?;
                pin.manual_path.as_ref()?;
                let touches = pin.owner == id || pin.source.is_some_and(|s| outputs.contains(&s));
                touches.then_some(PinId(i))
            })
            .collect();

        for input in affected {
            let Some((start, end)) = self.wire_endpoints(input) else {
                continue;
            };
            if let Some(path) = self.pin_mut(input).and_then(|p| p.manual_path.as_mut()) {
                if let Some(first) = path.first_mut() {
                    *first = start;
                }
                if let Some(last) = path.last_mut() {
                    *last = end;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::circuit::{Circuit, PinId, Point};
    use crate::components::{ComponentKind, Nand};

    /// NAND at (0, 0) wired to a NAND at (200, 100).
    /// The wire runs from (60, 20) to (200, 120).
    fn wired() -> (Circuit, PinId) {
        let mut circuit = Circuit::new("manual");
        let a = circuit.add_component(ComponentKind::Nand(Nand), Point::new(0.0, 0.0));
        let b = circuit.add_component(ComponentKind::Nand(Nand), Point::new(200.0, 100.0));
        let input = circuit.input_pin(b, 0).unwrap();
        circuit.connect(circuit.output_pin(a, 0).unwrap(), input);
        (circuit, input)
    }

    fn zigzag_path(circuit: &mut Circuit, input: PinId) {
        assert!(circuit.set_manual_path(
            input,
            vec![
                Point::new(60.0, 20.0),
                Point::new(120.0, 20.0),
                Point::new(120.0, 120.0),
                Point::new(200.0, 120.0),
            ],
        ));
    }

    #[test]
    fn test_set_manual_path_pins_endpoints() {
        let (mut circuit, input) = wired();
        assert!(circuit.set_manual_path(
            input,
            vec![
                Point::new(0.0, 0.0),
                Point::new(103.0, 18.0),
                Point::new(97.0, 122.0),
                Point::new(999.0, 999.0),
            ],
        ));
        assert_eq!(
            circuit.manual_path(input).unwrap(),
            &[
                Point::new(60.0, 20.0),
                Point::new(100.0, 20.0),
                Point::new(100.0, 120.0),
                Point::new(200.0, 120.0),
            ]
        );
    }

    #[test]
    fn test_set_manual_path_rejects_bad_requests() {
        let (mut circuit, input) = wired();
        assert!(!circuit.set_manual_path(input, vec![Point::new(60.0, 20.0)]));

        let lone = circuit.add_component(ComponentKind::Nand(Nand), Point::new(400.0, 0.0));
        let unconnected = circuit.input_pin(lone, 0).unwrap();
        assert!(!circuit.set_manual_path(unconnected, vec![Point::default(); 2]));
        assert!(circuit.manual_path(unconnected).is_none());
    }

    #[test]
    fn test_promote_seeds_two_points() {
        let (mut circuit, input) = wired();
        assert!(circuit.promote_to_manual(input));
        assert_eq!(
            circuit.manual_path(input).unwrap(),
            &[Point::new(60.0, 20.0), Point::new(200.0, 120.0)]
        );
        // Already manual
        assert!(!circuit.promote_to_manual(input));

        assert!(circuit.clear_manual_path(input));
        assert!(circuit.manual_path(input).is_none());
        assert!(!circuit.clear_manual_path(input));
    }

    #[test]
    fn test_insert_node_on_nearest_segment() {
        let (mut circuit, input) = wired();
        zigzag_path(&mut circuit, input);

        assert_eq!(circuit.insert_wire_node(input, Point::new(121.0, 70.0), 5.0), Some(2));
        let path = circuit.manual_path(input).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path[2], Point::new(120.0, 80.0));

        // Too far from every segment
        assert_eq!(circuit.insert_wire_node(input, Point::new(300.0, 300.0), 5.0), None);
        assert_eq!(circuit.manual_path(input).unwrap().len(), 5);
    }

    #[test]
    fn test_endpoints_cannot_be_removed_or_dragged() {
        let (mut circuit, input) = wired();
        zigzag_path(&mut circuit, input);

        assert!(!circuit.remove_wire_node(input, 0));
        assert!(!circuit.remove_wire_node(input, 3));
        assert!(!circuit.move_wire_node(input, 0, Point::new(40.0, 40.0)));
        assert!(!circuit.move_wire_node(input, 3, Point::new(40.0, 40.0)));

        assert!(circuit.move_wire_node(input, 1, Point::new(133.0, 47.0)));
        assert_eq!(circuit.manual_path(input).unwrap()[1], Point::new(140.0, 40.0));

        assert!(circuit.remove_wire_node(input, 1));
        assert_eq!(
            circuit.manual_path(input).unwrap(),
            &[
                Point::new(60.0, 20.0),
                Point::new(120.0, 120.0),
                Point::new(200.0, 120.0),
            ]
        );
    }

    #[test]
    fn test_endpoints_follow_moved_components() {
        let (mut circuit, input) = wired();
        zigzag_path(&mut circuit, input);
        let [a, b] = [circuit.component_ids()[0], circuit.component_ids()[1]];

        circuit.move_component(b, Point::new(300.0, 100.0));
        let path = circuit.manual_path(input).unwrap();
        assert_eq!(path[3], Point::new(300.0, 120.0));
        // Interior points stay where the user put them
        assert_eq!(path[1], Point::new(120.0, 20.0));

        circuit.move_component(a, Point::new(0.0, 40.0));
        assert_eq!(circuit.manual_path(input).unwrap()[0], Point::new(60.0, 60.0));
    }

    #[test]
    fn test_disconnect_drops_manual_path() {
        let (mut circuit, input) = wired();
        zigzag_path(&mut circuit, input);
        circuit.disconnect(input);
        assert!(circuit.manual_path(input).is_none());
    }
}
