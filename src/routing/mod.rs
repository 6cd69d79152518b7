//! Wire routing.
//!
//! - [`router`]: orthogonal auto-routing around component bodies
//! - [`manual`]: user-authored paths stored on input pins
//! - [`layout`]: routed polylines for a whole circuit, with overlap counts

mod layout;
mod manual;
mod router;

pub use layout::{count_overlaps, segment_key, RoutedWire, SegmentKey, WireLayout};
pub use router::{
    find_clear_horizontal_y, find_vertical_gaps, is_clear, zigzag, Router, RouterConfig,
};
