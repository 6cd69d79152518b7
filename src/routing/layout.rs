//! Routed polylines for every wire of a circuit.
//!
//! A [`WireLayout`] is a derived view: it is computed from a circuit at a
//! given revision and goes stale as soon as the circuit changes. Besides the
//! polylines it tallies how many wires share each grid segment, which the
//! renderer uses to draw bundled wires thicker.

use std::collections::{HashMap, HashSet};

use crate::circuit::{Circuit, PinId, Point};

use super::router::Router;

/// Grid-unit endpoints of a segment, smaller endpoint first.
pub type SegmentKey = ((i64, i64), (i64, i64));

/// One wire with its resolved path.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedWire {
    /// Output pin driving the wire
    pub from: PinId,
    /// Input pin the wire is stored on
    pub to: PinId,
    pub points: Vec<Point>,
    /// Whether the path is user-authored
    pub manual: bool,
}

fn grid_point(p: Point, grid: f32) -> (i64, i64) {
    ((p.x / grid).round() as i64, (p.y / grid).round() as i64)
}

/// Order-independent key for the segment `a`-`b`. `None` for zero-length segments.
pub fn segment_key(a: Point, b: Point, grid: f32) -> Option<SegmentKey> {
    let (a, b) = (grid_point(a, grid), grid_point(b, grid));
    match a.cmp(&b) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Less => Some((a, b)),
        std::cmp::Ordering::Greater => Some((b, a)),
    }
}

/// Count how many paths use each segment. A path counts once per distinct segment.
pub fn count_overlaps<'a>(
    paths: impl IntoIterator<Item = &'a [Point]>,
    grid: f32,
) -> HashMap<SegmentKey, usize> {
    let mut counts = HashMap::new();
    for path in paths {
        let distinct: HashSet<SegmentKey> = path
            .windows(2)
            .filter_map(|seg| segment_key(seg[0], seg[1], grid))
            .collect();
        for key in distinct {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

impl Router {
    /// Path of the wire ending at `input`: its manual path with live
    /// endpoints, or a fresh auto-route around the circuit's bodies.
    pub fn wire_path(&self, circuit: &Circuit, input: PinId) -> Option<Vec<Point>> {
        let (start, end) = circuit.wire_endpoints(input)?;
        match circuit.manual_path(input) {
            Some(manual) => {
                let mut points = manual.to_vec();
                let last = points.len().checked_sub(1)?;
                points[0] = start;
                points[last] = end;
                Some(points)
            }
            None => Some(self.route(start, end, &circuit.obstacles())),
        }
    }
}

/// Every wire of a circuit, routed.
#[derive(Debug, Clone, Default)]
pub struct WireLayout {
    revision: u64,
    grid: f32,
    wires: Vec<RoutedWire>,
    overlaps: HashMap<SegmentKey, usize>,
}

impl WireLayout {
    /// Route every wire of `circuit`.
    pub fn compute(circuit: &Circuit, router: &Router) -> Self {
        let obstacles = circuit.obstacles();
        let wires: Vec<RoutedWire> = circuit
            .connections()
            .into_iter()
            .filter_map(|conn| {
                let manual = circuit.manual_path(conn.to).is_some();
                let points = if manual {
                    router.wire_path(circuit, conn.to)?
                } else {
                    let (start, end) = circuit.wire_endpoints(conn.to)?;
                    router.route(start, end, &obstacles)
                };
                Some(RoutedWire {
                    from: conn.from,
                    to: conn.to,
                    points,
                    manual,
                })
            })
            .collect();

        let grid = router.config().grid_size;
        let overlaps = count_overlaps(wires.iter().map(|w| w.points.as_slice()), grid);
        Self {
            revision: circuit.revision(),
            grid,
            wires,
            overlaps,
        }
    }

    /// Circuit revision this layout was computed from.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the layout still matches `circuit`.
    pub fn is_current(&self, circuit: &Circuit) -> bool {
        self.revision == circuit.revision()
    }

    pub fn wires(&self) -> &[RoutedWire] {
        &self.wires
    }

    /// The wire stored on input pin `input`.
    pub fn wire(&self, input: PinId) -> Option<&RoutedWire> {
        self.wires.iter().find(|w| w.to == input)
    }

    /// Number of wires running along segment `a`-`b`.
    pub fn overlap(&self, a: Point, b: Point) -> usize {
        segment_key(a, b, self.grid)
            .and_then(|key| self.overlaps.get(&key))
            .copied()
            .unwrap_or(0)
    }

    /// Per-segment wire counts.
    pub fn segment_overlaps(&self) -> &HashMap<SegmentKey, usize> {
        &self.overlaps
    }

    /// Input pin of the wire closest to `point`, within `tolerance`.
    pub fn wire_at(&self, point: Point, tolerance: f32) -> Option<PinId> {
        let mut best: Option<(PinId, f32)> = None;
        for wire in &self.wires {
            let d = wire
                .points
                .windows(2)
                .map(|seg| point.distance_to_segment(seg[0], seg[1]))
                .fold(f32::INFINITY, f32::min);
            if d <= tolerance && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((wire.to, d));
            }
        }
        best.map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentKind, Nand};
    use crate::routing::RouterConfig;

    /// One NAND output fanning out to both inputs of a second NAND.
    fn fan_out() -> (Circuit, PinId, PinId) {
        let mut circuit = Circuit::new("fan");
        let a = circuit.add_component(ComponentKind::Nand(Nand), Point::new(0.0, 0.0));
        let b = circuit.add_component(ComponentKind::Nand(Nand), Point::new(200.0, 100.0));
        let out = circuit.output_pin(a, 0).unwrap();
        let in0 = circuit.input_pin(b, 0).unwrap();
        let in1 = circuit.input_pin(b, 1).unwrap();
        circuit.connect(out, in0);
        circuit.connect(out, in1);
        (circuit, in0, in1)
    }

    #[test]
    fn test_segment_key_is_order_independent() {
        let a = Point::new(60.0, 20.0);
        let b = Point::new(140.0, 20.0);
        assert_eq!(segment_key(a, b, 20.0), segment_key(b, a, 20.0));
        assert_eq!(segment_key(a, b, 20.0), Some(((3, 1), (7, 1))));
        assert_eq!(segment_key(a, a, 20.0), None);
    }

    #[test]
    fn test_path_counts_each_segment_once() {
        let doubled = [
            Point::new(0.0, 0.0),
            Point::new(40.0, 0.0),
            Point::new(0.0, 0.0),
        ];
        let counts = count_overlaps([&doubled[..]], 20.0);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.values().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_fan_out_shares_leading_segment() {
        let (circuit, in0, in1) = fan_out();
        let layout = WireLayout::compute(&circuit, &Router::new(RouterConfig::default()));
        assert_eq!(layout.wires().len(), 2);
        assert_eq!(
            layout.wire(in0).unwrap().points,
            vec![
                Point::new(60.0, 20.0),
                Point::new(140.0, 20.0),
                Point::new(140.0, 120.0),
                Point::new(200.0, 120.0),
            ]
        );
        assert_eq!(layout.wire(in1).unwrap().points[2], Point::new(140.0, 140.0));

        assert_eq!(layout.overlap(Point::new(60.0, 20.0), Point::new(140.0, 20.0)), 2);
        assert_eq!(layout.overlap(Point::new(140.0, 120.0), Point::new(140.0, 20.0)), 1);
        assert_eq!(layout.overlap(Point::new(0.0, 0.0), Point::new(20.0, 0.0)), 0);
    }

    #[test]
    fn test_wire_hit_test() {
        let (circuit, in0, in1) = fan_out();
        let layout = WireLayout::compute(&circuit, &Router::default());
        assert_eq!(layout.wire_at(Point::new(170.0, 122.0), 5.0), Some(in0));
        assert_eq!(layout.wire_at(Point::new(170.0, 139.0), 5.0), Some(in1));
        assert_eq!(layout.wire_at(Point::new(100.0, 80.0), 5.0), None);
    }

    #[test]
    fn test_manual_paths_override_router() {
        let (mut circuit, in0, _) = fan_out();
        let manual = vec![
            Point::new(60.0, 20.0),
            Point::new(100.0, 20.0),
            Point::new(100.0, 120.0),
            Point::new(200.0, 120.0),
        ];
        circuit.set_manual_path(in0, manual.clone());
        let layout = WireLayout::compute(&circuit, &Router::default());
        let wire = layout.wire(in0).unwrap();
        assert!(wire.manual);
        assert_eq!(wire.points, manual);
    }

    #[test]
    fn test_layout_goes_stale_on_change() {
        let (mut circuit, in0, _) = fan_out();
        let layout = WireLayout::compute(&circuit, &Router::default());
        assert!(layout.is_current(&circuit));
        circuit.disconnect(in0);
        assert!(!layout.is_current(&circuit));
        assert_eq!(WireLayout::compute(&circuit, &Router::default()).wires().len(), 1);
    }
}
