//! Unit spawning - per-player zones and starting rosters

use rand::Rng;
use uuid::Uuid;

use crate::ws::protocol::{UnitClass, Vec2};

use super::unit::Unit;

/// Axis-aligned rectangle a player's units spawn inside
#[derive(Debug, Clone, Copy)]
pub struct SpawnZone {
    pub min: Vec2,
    pub max: Vec2,
}

impl SpawnZone {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Random point inside the zone
    pub fn random_point(&self, rng: &mut impl Rng) -> Vec2 {
        Vec2 {
            x: rng.gen_range(self.min.x..=self.max.x),
            y: rng.gen_range(self.min.y..=self.max.y),
        }
    }

    /// Zone for the player at `index` in join order: first player on the
    /// west edge of the arena, everyone else on the east edge.
    pub fn for_player_index(index: usize) -> Self {
        if index == 0 {
            Self::new(Vec2::new(-45.0, -20.0), Vec2::new(-35.0, 20.0))
        } else {
            Self::new(Vec2::new(35.0, -20.0), Vec2::new(45.0, 20.0))
        }
    }
}

/// Starting roster for one player: one unit of each archetype, placed at
/// random points inside the player's zone.
pub fn starting_units(player_id: Uuid, zone: SpawnZone, rng: &mut impl Rng) -> Vec<Unit> {
    [UnitClass::Vanguard, UnitClass::Marksman]
        .into_iter()
        .map(|class| Unit::new(player_id, class, zone.random_point(rng)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn starting_roster_has_one_of_each_class() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let player = Uuid::new_v4();
        let zone = SpawnZone::for_player_index(0);
        let units = starting_units(player, zone, &mut rng);

        assert_eq!(units.len(), 2);
        assert!(units.iter().any(|u| u.class == UnitClass::Vanguard));
        assert!(units.iter().any(|u| u.class == UnitClass::Marksman));
        for unit in &units {
            assert_eq!(unit.owner_id, player);
            assert!(unit.position.x >= zone.min.x && unit.position.x <= zone.max.x);
            assert!(unit.position.y >= zone.min.y && unit.position.y <= zone.max.y);
        }
    }

    #[test]
    fn spawn_placement_is_deterministic_per_seed() {
        let player = Uuid::new_v4();
        let zone = SpawnZone::for_player_index(1);

        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);
        let a = starting_units(player, zone, &mut rng_a);
        let b = starting_units(player, zone, &mut rng_b);

        for (ua, ub) in a.iter().zip(&b) {
            assert_eq!(ua.position, ub.position);
        }
    }
}
