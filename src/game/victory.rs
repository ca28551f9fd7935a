//! Victory evaluation - pure functions over the unit roster

use std::collections::HashMap;
use uuid::Uuid;

use super::unit::Unit;

/// Count alive units per owner
fn alive_counts<'a>(units: impl IntoIterator<Item = &'a Unit>) -> HashMap<Uuid, usize> {
    let mut counts = HashMap::new();
    for unit in units {
        if unit.alive {
            *counts.entry(unit.owner_id).or_insert(0) += 1;
        }
    }
    counts
}

/// Attrition victory: exactly one connected player still owns at least one
/// alive unit. Run once per tick by the coordinator.
pub fn evaluate<'a>(
    units: impl IntoIterator<Item = &'a Unit>,
    connected_players: &[Uuid],
) -> Option<Uuid> {
    let counts = alive_counts(units);

    let mut survivors = connected_players
        .iter()
        .filter(|player| counts.get(player).copied().unwrap_or(0) > 0);

    match (survivors.next(), survivors.next()) {
        (Some(winner), None) => Some(*winner),
        _ => None,
    }
}

/// Round-threshold variant: with exactly two owners holding alive units,
/// the strictly greater count wins. A tie (or any other owner layout)
/// yields no decision and escalation proceeds instead.
pub fn decide_by_unit_count<'a>(units: impl IntoIterator<Item = &'a Unit>) -> Option<Uuid> {
    let counts = alive_counts(units);
    if counts.len() != 2 {
        return None;
    }

    let mut owners = counts.into_iter();
    let (first, first_count) = owners.next()?;
    let (second, second_count) = owners.next()?;

    if first_count > second_count {
        Some(first)
    } else if second_count > first_count {
        Some(second)
    } else {
        None
    }
}
