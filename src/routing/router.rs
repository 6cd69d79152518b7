//! Orthogonal auto-router.
//!
//! Wires leave an output pin heading right and enter an input pin from the
//! left. The preferred shape is a three-segment zig-zag through a vertical
//! corridor at `mid_x`:
//!
//! ```text
//! start ──────┐
//!             │ mid_x
//!             └────── end
//! ```
//!
//! When the midpoint corridor is blocked, gaps between obstacles are tried
//! nearest-first, then a detour around every obstacle. When the input sits
//! left of (or too close to) the output, the wire wraps around above or below
//! the bodies in the way.

use tracing::debug;

use crate::circuit::{snap, snap_down, snap_up, Point, Rect, GRID_SIZE};

/// How many grid cells a detour may widen its stub columns by.
const MAX_DETOUR_STEPS: usize = 24;

/// Configuration for the router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Grid cell size; every bend lands on this grid.
    pub grid_size: f32,
    /// Margin added around each body before testing for crossings.
    pub clearance: f32,
    /// Distance within which a point counts as touching a wire.
    pub hit_tolerance: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            clearance: GRID_SIZE / 2.0,
            hit_tolerance: GRID_SIZE / 4.0,
        }
    }
}

impl RouterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the grid size. Clearance and hit tolerance scale with it.
    pub fn with_grid_size(mut self, grid_size: f32) -> Self {
        self.grid_size = grid_size.max(1.0);
        self.clearance = self.grid_size / 2.0;
        self.hit_tolerance = self.grid_size / 4.0;
        self
    }

    pub fn with_clearance(mut self, clearance: f32) -> Self {
        self.clearance = clearance.max(0.0);
        self
    }

    pub fn with_hit_tolerance(mut self, tolerance: f32) -> Self {
        self.hit_tolerance = tolerance.max(0.0);
        self
    }
}

/// Computes orthogonal wire paths between pins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    config: RouterConfig,
}

impl Router {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn grid(&self) -> f32 {
        self.config.grid_size
    }

    /// Route from an output pin at `start` to an input pin at `end`.
    ///
    /// `obstacles` are raw component bodies; they are inflated by the
    /// configured clearance. Bodies containing `start` or `end` (the wire's
    /// own components) are only avoided when the wire has to wrap around.
    pub fn route(&self, start: Point, end: Point, obstacles: &[Rect]) -> Vec<Point> {
        let g = self.grid();
        let start = start.snapped(g);
        let end = end.snapped(g);

        let inflated: Vec<Rect> = obstacles
            .iter()
            .map(|r| r.inflate(self.config.clearance))
            .collect();
        let blockers: Vec<Rect> = inflated
            .iter()
            .filter(|r| !r.contains(start) && !r.contains(end))
            .copied()
            .collect();

        if end.x - start.x >= 2.0 * g {
            self.route_forward(start, end, &blockers)
        } else {
            self.route_wrap(start, end, &inflated)
        }
    }

    /// Route when the input is comfortably right of the output.
    fn route_forward(&self, start: Point, end: Point, blockers: &[Rect]) -> Vec<Point> {
        let g = self.grid();
        let lo = start.x + g;
        let hi = end.x - g;
        let ideal = snap((start.x + end.x) / 2.0, g).clamp(lo, hi);

        let canonical = zigzag(start, end, ideal);
        if is_clear(&canonical, blockers) {
            return canonical;
        }

        // Only bodies overlapping the vertical span can block the corridor.
        let (y_min, y_max) = (start.y.min(end.y), start.y.max(end.y));
        let spanning: Vec<Rect> = blockers
            .iter()
            .filter(|r| r.top() <= y_max && r.bottom() >= y_min)
            .copied()
            .collect();

        let mut candidates: Vec<f32> = find_vertical_gaps(&spanning, g)
            .into_iter()
            .filter_map(|(a, b)| {
                let (a, b) = (a.max(lo), b.min(hi));
                if a > b {
                    return None;
                }
                let mut x = snap(ideal.clamp(a, b), g);
                if x < a {
                    x = snap_up(a, g);
                }
                if x > b {
                    x = snap_down(b, g);
                }
                (x >= a && x <= b).then_some(x)
            })
            .collect();
        candidates.sort_by(|a, b| {
            (a - ideal)
                .abs()
                .total_cmp(&(b - ideal).abs())
                .then(a.total_cmp(b))
        });
        // Corridors hugging either endpoint come last.
        candidates.extend([lo, hi]);

        for x in candidates {
            let path = zigzag(start, end, x);
            if is_clear(&path, blockers) {
                return path;
            }
        }

        // Leave the obstacle field entirely: run above or below everything
        // between the two stubs, widening the stubs if their columns are blocked.
        self.search_detour(start, end, blockers).unwrap_or(canonical)
    }

    /// Route when the input is left of, or too close to, the output.
    fn route_wrap(&self, start: Point, end: Point, inflated: &[Rect]) -> Vec<Point> {
        if let Some(path) = self.search_detour(start, end, inflated) {
            return path;
        }

        let g = self.grid();
        let x_out = start.x + g;
        let x_in = end.x - g;
        let row = find_clear_horizontal_y(
            inflated,
            x_in.min(x_out),
            x_in.max(x_out),
            start.y,
            end.y,
            g,
        );
        debug!(%start, %end, "no clear wrap found");
        let mut path = detour(start, end, x_out, x_in, row);
        path.dedup();
        path
    }

    /// Find a six-point detour `start → x_out → row → x_in → end` clear of
    /// `obstacles`.
    ///
    /// The exit column starts one cell right of `start` and the entry column
    /// one cell left of `end`; both move outward a cell at a time, least total
    /// widening first. For each column pair the cheaper clear row is tried
    /// before the other one. The stubs may cross the bodies holding their own
    /// pin; every other segment must clear everything.
    fn search_detour(&self, start: Point, end: Point, obstacles: &[Rect]) -> Option<Vec<Point>> {
        let g = self.grid();
        for spread in 0..=MAX_DETOUR_STEPS {
            for k_out in 0..=spread {
                let x_out = start.x + g * (1 + k_out) as f32;
                let x_in = end.x - g * (1 + spread - k_out) as f32;
                let (x_min, x_max) = (x_in.min(x_out), x_in.max(x_out));
                for row in candidate_rows(obstacles, x_min, x_max, start.y, end.y, g) {
                    let mut path = detour(start, end, x_out, x_in, row);
                    path.dedup();
                    if detour_is_clear(&path, obstacles) {
                        return Some(path);
                    }
                }
            }
        }
        None
    }
}

/// The canonical shape: `start → (mid_x, start.y) → (mid_x, end.y) → end`.
pub fn zigzag(start: Point, end: Point, mid_x: f32) -> Vec<Point> {
    vec![
        start,
        Point::new(mid_x, start.y),
        Point::new(mid_x, end.y),
        end,
    ]
}

fn detour(start: Point, end: Point, x_out: f32, x_in: f32, row: f32) -> Vec<Point> {
    vec![
        start,
        Point::new(x_out, start.y),
        Point::new(x_out, row),
        Point::new(x_in, row),
        Point::new(x_in, end.y),
        end,
    ]
}

/// Check that no segment of `path` passes through any of `blockers`.
pub fn is_clear(path: &[Point], blockers: &[Rect]) -> bool {
    path.windows(2)
        .all(|seg| blockers.iter().all(|r| !r.blocks_segment(seg[0], seg[1])))
}

/// Like [`is_clear`], except the first segment ignores bodies holding the
/// start point and the last segment ignores bodies holding the end point.
fn detour_is_clear(path: &[Point], obstacles: &[Rect]) -> bool {
    let (Some(&start), Some(&end)) = (path.first(), path.last()) else {
        return true;
    };
    let last = path.len().saturating_sub(2);
    path.windows(2).enumerate().all(|(i, seg)| {
        obstacles.iter().all(|r| {
            let own = (i == 0 && r.contains(start)) || (i == last && r.contains(end));
            own || !r.blocks_segment(seg[0], seg[1])
        })
    })
}

/// Horizontal intervals free of obstacles, each shrunk by one grid cell.
///
/// Obstacles are taken in left-edge order; the result holds the interval
/// before the first body, between consecutive bodies, and after the last.
/// Overlapping bodies merge.
pub fn find_vertical_gaps(obstacles: &[Rect], grid: f32) -> Vec<(f32, f32)> {
    let mut sorted = obstacles.to_vec();
    sorted.sort_by(|a, b| a.left().total_cmp(&b.left()));

    let Some(first) = sorted.first() else {
        return vec![(f32::NEG_INFINITY, f32::INFINITY)];
    };

    let mut gaps = vec![(f32::NEG_INFINITY, first.left() - grid)];
    let mut reach = first.right();
    for rect in &sorted[1..] {
        if rect.left() > reach {
            gaps.push((reach + grid, rect.left() - grid));
        }
        reach = reach.max(rect.right());
    }
    gaps.push((reach + grid, f32::INFINITY));
    gaps.retain(|(a, b)| a <= b);
    gaps
}

/// Grid rows just above and just below every obstacle overlapping
/// `[x_min, x_max]`. `None` for both when nothing overlaps.
fn clear_rows(
    obstacles: &[Rect],
    x_min: f32,
    x_max: f32,
    grid: f32,
) -> (Option<f32>, Option<f32>) {
    let in_range = obstacles
        .iter()
        .filter(|r| r.right() >= x_min && r.left() <= x_max);
    let (top, bottom) = in_range.fold((f32::INFINITY, f32::NEG_INFINITY), |(t, b), r| {
        (t.min(r.top()), b.max(r.bottom()))
    });
    if !top.is_finite() {
        return (None, None);
    }

    let mut above = snap_down(top, grid);
    if above >= top {
        above -= grid;
    }
    let mut below = snap_up(bottom, grid);
    if below <= bottom {
        below += grid;
    }
    (Some(above), Some(below))
}

/// Pick the row a wrapping wire travels along.
///
/// Compares the vertical distance needed to clear the topmost body versus
/// the bottommost body in the x-range and takes the cheaper side (above on
/// a tie). With nothing in range the row sits midway between the pins.
pub fn find_clear_horizontal_y(
    obstacles: &[Rect],
    x_min: f32,
    x_max: f32,
    start_y: f32,
    end_y: f32,
    grid: f32,
) -> f32 {
    match clear_rows(obstacles, x_min, x_max, grid) {
        (Some(above), Some(below)) => {
            let cost_above = (start_y - above).abs() + (end_y - above).abs();
            let cost_below = (start_y - below).abs() + (end_y - below).abs();
            if cost_below < cost_above {
                below
            } else {
                above
            }
        }
        _ => snap((start_y + end_y) / 2.0, grid),
    }
}

/// Both clear rows for `[x_min, x_max]`, cheaper first (above on a tie),
/// or the midway row when nothing is in range.
fn candidate_rows(
    obstacles: &[Rect],
    x_min: f32,
    x_max: f32,
    start_y: f32,
    end_y: f32,
    grid: f32,
) -> Vec<f32> {
    match clear_rows(obstacles, x_min, x_max, grid) {
        (Some(above), Some(below)) => {
            let cost = |row: f32| (start_y - row).abs() + (end_y - row).abs();
            if cost(below) < cost(above) {
                vec![below, above]
            } else {
                vec![above, below]
            }
        }
        _ => vec![snap((start_y + end_y) / 2.0, grid)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::new(RouterConfig::default())
    }

    fn assert_orthogonal(path: &[Point]) {
        for seg in path.windows(2) {
            assert!(
                seg[0].x == seg[1].x || seg[0].y == seg[1].y,
                "diagonal segment {} → {}",
                seg[0],
                seg[1]
            );
        }
    }

    fn assert_on_grid(path: &[Point]) {
        for p in path {
            assert_eq!(p.x % 20.0, 0.0, "{p} off grid");
            assert_eq!(p.y % 20.0, 0.0, "{p} off grid");
        }
    }

    #[test]
    fn test_clear_midline_is_canonical() {
        let start = Point::new(60.0, 20.0);
        let end = Point::new(200.0, 100.0);
        let path = router().route(start, end, &[]);
        assert_eq!(
            path,
            vec![
                start,
                Point::new(140.0, 20.0),
                Point::new(140.0, 100.0),
                end
            ]
        );
    }

    #[test]
    fn test_endpoint_bodies_do_not_block_forward_route() {
        // Source body ends at the output pin, destination body starts at the input pin.
        let source = Rect::new(0.0, 0.0, 60.0, 60.0);
        let dest = Rect::new(200.0, 80.0, 60.0, 60.0);
        let start = Point::new(60.0, 20.0);
        let end = Point::new(200.0, 100.0);
        let path = router().route(start, end, &[source, dest]);
        assert_eq!(path.len(), 4);
        assert_eq!(path[1].x, 140.0);
    }

    #[test]
    fn test_blocked_midline_avoids_obstacle() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(400.0, 200.0);
        // Sits right on the midpoint corridor (x = 200)
        let block = Rect::new(160.0, 40.0, 80.0, 100.0);
        let path = router().route(start, end, &[block]);

        let inflated = block.inflate(10.0);
        assert!(is_clear(&path, &[inflated]), "path {path:?} crosses {inflated:?}");
        assert_orthogonal(&path);
        assert_on_grid(&path);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        // Leaves rightward and arrives from the left
        assert!(path[1].x > start.x);
        assert!(path[path.len() - 2].x < end.x);
    }

    #[test]
    fn test_gap_nearest_to_midpoint_wins() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(600.0, 200.0);
        // The midpoint (x = 300) is covered; the corridor between the two
        // bodies is closer than the space left of the first one.
        let left = Rect::new(240.0, 40.0, 80.0, 120.0);
        let right = Rect::new(400.0, 40.0, 60.0, 120.0);
        let path = router().route(start, end, &[left, right]);
        assert_eq!(path.len(), 4);
        assert_eq!(path[1].x, 360.0);
        assert!(is_clear(&path, &[left.inflate(10.0), right.inflate(10.0)]));
    }

    #[test]
    fn test_fully_blocked_rows_detour_around_everything() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(600.0, 200.0);
        // A wall covering both pin rows
        let wall = Rect::new(220.0, -40.0, 60.0, 300.0);
        let path = router().route(start, end, &[wall]);
        assert_eq!(path.len(), 6);
        assert!(is_clear(&path, &[wall.inflate(10.0)]));
        assert_orthogonal(&path);
        assert_on_grid(&path);
        // Above costs less than below for these pins
        assert_eq!(path[2].y, -60.0);
    }

    #[test]
    fn test_wrap_when_input_is_left_of_output() {
        let source = Rect::new(200.0, 0.0, 60.0, 60.0);
        let dest = Rect::new(0.0, 100.0, 60.0, 60.0);
        let start = Point::new(260.0, 20.0);
        let end = Point::new(0.0, 120.0);
        let path = router().route(start, end, &[source, dest]);

        assert_orthogonal(&path);
        assert_on_grid(&path);
        assert_eq!(path[1], Point::new(280.0, 20.0));
        assert_eq!(path[path.len() - 2], Point::new(-20.0, 120.0));
        // The wrap row clears both bodies (above: -20 → cost 40+140, below: 180 → cost 160+60)
        let row = path[2].y;
        assert_eq!(row, -20.0);
        // Stubs touch the pins' own bodies; everything between them clears the margins.
        assert!(is_clear(&path, &[source, dest]));
        let inner = &path[1..path.len() - 1];
        assert!(is_clear(inner, &[source.inflate(10.0), dest.inflate(10.0)]));
    }

    #[test]
    fn test_tight_wrap_stays_out_of_the_source_body() {
        // The input pin is only one cell right of the output pin, below it.
        let source = Rect::new(0.0, 0.0, 60.0, 60.0);
        let dest = Rect::new(80.0, 100.0, 60.0, 60.0);
        let start = Point::new(60.0, 20.0);
        let end = Point::new(80.0, 120.0);
        let path = router().route(start, end, &[source, dest]);

        assert_orthogonal(&path);
        assert_on_grid(&path);
        // The entry column moves out past the source body's margin.
        assert_eq!(
            path,
            vec![
                start,
                Point::new(80.0, 20.0),
                Point::new(80.0, -20.0),
                Point::new(-20.0, -20.0),
                Point::new(-20.0, 120.0),
                end
            ]
        );
        let margins = [source.inflate(10.0), dest.inflate(10.0)];
        for seg in path[1..path.len() - 1].windows(2) {
            assert!(is_clear(seg, &margins), "{} → {} crosses a body", seg[0], seg[1]);
        }
        assert!(is_clear(&path, &[source, dest]));
    }

    #[test]
    fn test_find_vertical_gaps() {
        let a = Rect::new(100.0, 0.0, 40.0, 40.0);
        let b = Rect::new(120.0, 0.0, 60.0, 40.0); // overlaps a
        let c = Rect::new(300.0, 0.0, 20.0, 40.0);
        let gaps = find_vertical_gaps(&[c, a, b], 20.0);
        assert_eq!(
            gaps,
            vec![
                (f32::NEG_INFINITY, 80.0),
                (200.0, 280.0),
                (340.0, f32::INFINITY)
            ]
        );
        assert_eq!(
            find_vertical_gaps(&[], 20.0),
            vec![(f32::NEG_INFINITY, f32::INFINITY)]
        );
    }

    #[test]
    fn test_find_clear_horizontal_y_prefers_cheaper_side() {
        let body = Rect::new(0.0, 0.0, 100.0, 200.0);
        // Pins near the bottom: going below is cheaper
        assert_eq!(find_clear_horizontal_y(&[body], 0.0, 100.0, 180.0, 190.0, 20.0), 220.0);
        // Pins near the top: going above is cheaper
        assert_eq!(find_clear_horizontal_y(&[body], 0.0, 100.0, 10.0, 20.0, 20.0), -20.0);
        // Nothing in range: midway
        assert_eq!(find_clear_horizontal_y(&[body], 300.0, 400.0, 0.0, 80.0, 20.0), 40.0);
    }

    #[test]
    fn test_config_builder() {
        let config = RouterConfig::new().with_grid_size(10.0).with_hit_tolerance(3.0);
        assert_eq!(config.grid_size, 10.0);
        assert_eq!(config.clearance, 5.0);
        assert_eq!(config.hit_tolerance, 3.0);
    }
}
