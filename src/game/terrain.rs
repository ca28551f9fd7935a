//! Navigable-terrain seam
//!
//! The match core consumes a pathfinding capability; it never implements
//! one. An oracle returns an ordered waypoint polyline from start to
//! destination, or `None` when the destination is unreachable.

use crate::ws::protocol::Vec2;

pub trait PathOracle: Send + Sync {
    /// Compute a traversable path. The first waypoint is the start point,
    /// the last is the destination. `None` means unreachable.
    fn compute_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>>;
}

/// Flat rectangular arena with no obstacles: every in-bounds destination is
/// reachable by a single straight segment.
#[derive(Debug, Clone, Copy)]
pub struct OpenField {
    pub half_width: f32,
    pub half_height: f32,
}

impl OpenField {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width,
            half_height,
        }
    }

    fn contains(&self, p: Vec2) -> bool {
        p.x.abs() <= self.half_width && p.y.abs() <= self.half_height
    }
}

impl Default for OpenField {
    fn default() -> Self {
        // Matches the default spawn-zone layout in game::spawn
        Self::new(50.0, 50.0)
    }
}

impl PathOracle for OpenField {
    fn compute_path(&self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        if !self.contains(to) {
            return None;
        }
        Some(vec![from, to])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_field_returns_straight_segment() {
        let field = OpenField::new(10.0, 10.0);
        let path = field
            .compute_path(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0))
            .unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[1], Vec2::new(3.0, 4.0));
    }

    #[test]
    fn out_of_bounds_destination_is_unreachable() {
        let field = OpenField::new(10.0, 10.0);
        assert!(field
            .compute_path(Vec2::new(0.0, 0.0), Vec2::new(11.0, 0.0))
            .is_none());
    }
}
