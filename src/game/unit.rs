//! Unit state and per-class configuration

use uuid::Uuid;

use crate::ws::protocol::{UnitClass, UnitView, Vec2};

/// Immutable stats per unit class
#[derive(Debug, Clone, Copy)]
pub struct UnitStats {
    /// Maximum distance the unit may travel in one turn
    pub max_move_distance: f32,
    /// Targets must be within this distance to be attacked
    pub attack_range: f32,
}

impl UnitStats {
    pub fn for_class(class: UnitClass) -> Self {
        match class {
            UnitClass::Vanguard => Self {
                max_move_distance: 8.0,
                attack_range: 2.0,
            },
            UnitClass::Marksman => Self {
                max_move_distance: 4.0,
                attack_range: 7.0,
            },
        }
    }
}

/// Remaining movement allowance for the current turn.
///
/// Unbounded is a real state, not a float sentinel: once late-game
/// escalation activates, resets keep the budget unbounded for the rest of
/// the match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveBudget {
    Finite(f32),
    Unbounded,
}

impl MoveBudget {
    /// Whether any movement is still allowed
    pub fn can_move(&self) -> bool {
        match self {
            MoveBudget::Finite(remaining) => *remaining > 0.0,
            MoveBudget::Unbounded => true,
        }
    }

    /// Distance still available, `None` when unbounded
    pub fn remaining(&self) -> Option<f32> {
        match self {
            MoveBudget::Finite(remaining) => Some(*remaining),
            MoveBudget::Unbounded => None,
        }
    }

    /// Spend travelled distance, flooring at zero
    pub fn consume(&mut self, distance: f32) {
        if let MoveBudget::Finite(remaining) = self {
            *remaining = (*remaining - distance).max(0.0);
        }
    }
}

/// One combatant entity (authoritative state)
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: Uuid,
    /// Owning player, immutable after spawn
    pub owner_id: Uuid,
    pub class: UnitClass,
    pub position: Vec2,
    pub budget: MoveBudget,
    pub has_attacked: bool,
    /// Cleared permanently on death; dead units stay on the roster but
    /// cannot act and are skipped by victory evaluation
    pub alive: bool,
}

impl Unit {
    pub fn new(owner_id: Uuid, class: UnitClass, position: Vec2) -> Self {
        let stats = UnitStats::for_class(class);
        Self {
            id: Uuid::new_v4(),
            owner_id,
            class,
            position,
            budget: MoveBudget::Finite(stats.max_move_distance),
            has_attacked: false,
            alive: true,
        }
    }

    pub fn stats(&self) -> UnitStats {
        UnitStats::for_class(self.class)
    }

    /// Reset budget and attack flag at the start of the owner's turn.
    /// Escalation, once active, keeps movement unbounded through resets.
    pub fn reset_turn(&mut self, escalation_active: bool) {
        self.has_attacked = false;
        self.budget = if escalation_active {
            MoveBudget::Unbounded
        } else {
            MoveBudget::Finite(self.stats().max_move_distance)
        };
    }

    /// Switch to unbounded movement (round escalation)
    pub fn set_infinite_movement(&mut self, enabled: bool) {
        self.budget = if enabled {
            MoveBudget::Unbounded
        } else {
            MoveBudget::Finite(self.stats().max_move_distance)
        };
    }

    /// Replicated view sent to clients
    pub fn view(&self) -> UnitView {
        UnitView {
            unit_id: self.id,
            owner_id: self.owner_id,
            class: self.class,
            position: self.position,
            remaining_move_distance: self.budget.remaining(),
            has_attacked: self.has_attacked,
            alive: self.alive,
        }
    }
}
