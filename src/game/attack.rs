//! Attack system - range checks and per-turn attack gating
//!
//! Attacks are binary: an accepted attack consumes the attacker's single
//! attack for the turn and destroys the target. There is no damage or
//! health model.

use crate::ws::protocol::Vec2;

use super::unit::Unit;

/// Why an attack request was rejected. Rejections are silent on the wire;
/// the reason feeds advisory logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackRejection {
    AlreadyAttacked,
    TargetNotAlive,
    FriendlyTarget,
    OutOfRange,
}

/// Attack system for validating attack requests
pub struct AttackSystem;

impl AttackSystem {
    /// Pure distance check against the attacker's range. No side effects;
    /// safe for visualization collaborators to call every frame.
    pub fn is_target_in_range(attacker: &Unit, target_position: Vec2) -> bool {
        attacker.position.distance_to(target_position) <= attacker.stats().attack_range
    }

    /// Validate an attack. Turn ownership is the coordinator's concern and
    /// is checked before this is called.
    pub fn validate(attacker: &Unit, target: &Unit) -> Result<(), AttackRejection> {
        if attacker.has_attacked {
            return Err(AttackRejection::AlreadyAttacked);
        }
        if !target.alive {
            return Err(AttackRejection::TargetNotAlive);
        }
        if attacker.owner_id == target.owner_id {
            return Err(AttackRejection::FriendlyTarget);
        }
        if !Self::is_target_in_range(attacker, target.position) {
            return Err(AttackRejection::OutOfRange);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::UnitClass;
    use uuid::Uuid;

    fn unit_at(owner: Uuid, class: UnitClass, x: f32, y: f32) -> Unit {
        Unit::new(owner, class, Vec2::new(x, y))
    }

    #[test]
    fn range_check_uses_class_stats() {
        let owner = Uuid::new_v4();
        let vanguard = unit_at(owner, UnitClass::Vanguard, 0.0, 0.0);
        // Vanguard range is 2.0
        assert!(AttackSystem::is_target_in_range(&vanguard, Vec2::new(2.0, 0.0)));
        assert!(!AttackSystem::is_target_in_range(&vanguard, Vec2::new(2.1, 0.0)));

        let marksman = unit_at(owner, UnitClass::Marksman, 0.0, 0.0);
        assert!(AttackSystem::is_target_in_range(&marksman, Vec2::new(0.0, 7.0)));
    }

    #[test]
    fn attack_is_consumed_once_per_turn() {
        let mut attacker = unit_at(Uuid::new_v4(), UnitClass::Marksman, 0.0, 0.0);
        let target = unit_at(Uuid::new_v4(), UnitClass::Vanguard, 3.0, 0.0);

        assert_eq!(AttackSystem::validate(&attacker, &target), Ok(()));
        attacker.has_attacked = true;
        assert_eq!(
            AttackSystem::validate(&attacker, &target),
            Err(AttackRejection::AlreadyAttacked)
        );

        attacker.reset_turn(false);
        assert_eq!(AttackSystem::validate(&attacker, &target), Ok(()));
    }

    #[test]
    fn dead_and_friendly_targets_are_rejected() {
        let owner = Uuid::new_v4();
        let attacker = unit_at(owner, UnitClass::Marksman, 0.0, 0.0);

        let friendly = unit_at(owner, UnitClass::Vanguard, 1.0, 0.0);
        assert_eq!(
            AttackSystem::validate(&attacker, &friendly),
            Err(AttackRejection::FriendlyTarget)
        );

        let mut enemy = unit_at(Uuid::new_v4(), UnitClass::Vanguard, 1.0, 0.0);
        enemy.alive = false;
        assert_eq!(
            AttackSystem::validate(&attacker, &enemy),
            Err(AttackRejection::TargetNotAlive)
        );
    }

    #[test]
    fn out_of_range_target_is_rejected() {
        let attacker = unit_at(Uuid::new_v4(), UnitClass::Vanguard, 0.0, 0.0);
        let enemy = unit_at(Uuid::new_v4(), UnitClass::Marksman, 10.0, 0.0);
        assert_eq!(
            AttackSystem::validate(&attacker, &enemy),
            Err(AttackRejection::OutOfRange)
        );
    }
}
