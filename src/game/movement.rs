//! Movement system - clipping oracle paths to the turn's movement budget

use crate::ws::protocol::Vec2;

use super::unit::MoveBudget;

/// Result of clipping a path against a movement budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathClip {
    /// Final movement target, never farther along the path than the budget
    pub destination: Vec2,
    /// True travelled distance, capped at exactly the remaining budget
    pub consumed: f32,
}

/// Movement system for validating and clipping unit travel
pub struct MovementSystem;

impl MovementSystem {
    /// Walk the waypoint polyline segment by segment, accumulating length.
    /// On the first segment where the accumulated length would meet or
    /// exceed the budget, the clip point is found by linear interpolation
    /// along that segment and travel stops there. If no segment overflows,
    /// the unit travels the full path.
    ///
    /// Returns `None` for degenerate paths (fewer than two waypoints).
    /// The computation is purely geometric and frame-rate independent.
    pub fn clip_path(waypoints: &[Vec2], budget: MoveBudget) -> Option<PathClip> {
        if waypoints.len() < 2 {
            return None;
        }

        let mut travelled = 0.0_f32;
        let mut destination = waypoints[0];

        for pair in waypoints.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let segment = from.distance_to(to);

            if let MoveBudget::Finite(remaining) = budget {
                if travelled + segment >= remaining {
                    let leftover = remaining - travelled;
                    destination = from.point_along(to, leftover);
                    travelled = remaining;
                    return Some(PathClip {
                        destination,
                        consumed: travelled,
                    });
                }
            }

            travelled += segment;
            destination = to;
        }

        Some(PathClip {
            destination,
            consumed: travelled,
        })
    }
}
