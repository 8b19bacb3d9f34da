use crate::findnearest::*;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use itertools::Itertools;
use std::collections::HashMap;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RepairPriority {
    Critical,
    High,
    Medium,
    Low,
    VeryLow,
}

pub static ORDERED_REPAIR_PRIORITIES: &[RepairPriority] = &[
    RepairPriority::Critical,
    RepairPriority::High,
    RepairPriority::Medium,
    RepairPriority::Low,
    RepairPriority::VeryLow,
];

fn map_normal_priority(hits: u32, hits_max: u32) -> Option<RepairPriority> {
    let health_fraction = (hits as f32) / (hits_max as f32);

    let priority = if health_fraction < 0.25 {
        RepairPriority::High
    } else if health_fraction < 0.5 {
        RepairPriority::Medium
    } else if health_fraction < 0.75 {
        RepairPriority::Low
    } else {
        RepairPriority::VeryLow
    };

    Some(priority)
}

fn map_high_value_priority(hits: u32, hits_max: u32) -> Option<RepairPriority> {
    let health_fraction = (hits as f32) / (hits_max as f32);

    let priority = if health_fraction < 0.5 {
        RepairPriority::Critical
    } else if health_fraction < 0.75 {
        RepairPriority::High
    } else if health_fraction < 0.95 {
        RepairPriority::Low
    } else {
        RepairPriority::VeryLow
    };

    Some(priority)
}

fn map_defense_priority(hits: u32, hits_max: u32, stored_energy: u32, under_attack: bool) -> Option<RepairPriority> {
    let health_fraction = (hits as f32) / (hits_max as f32);

    if under_attack {
        if health_fraction < 0.01 {
            Some(RepairPriority::Critical)
        } else if health_fraction < 0.25 {
            Some(RepairPriority::High)
        } else if health_fraction < 0.5 {
            Some(RepairPriority::Medium)
        } else {
            Some(RepairPriority::Low)
        }
    } else if health_fraction < 0.001 {
        Some(RepairPriority::Medium)
    } else if health_fraction < 0.1 {
        Some(RepairPriority::Low)
    } else if stored_energy > 100_000 {
        Some(RepairPriority::VeryLow)
    } else {
        None
    }
}

fn map_structure_repair_priority(
    structure: &StructureData,
    stored_energy: u32,
    under_attack: bool,
) -> Option<RepairPriority> {
    match structure.kind {
        StructureKind::Spawn | StructureKind::Tower | StructureKind::Container => {
            map_high_value_priority(structure.hits, structure.hits_max)
        }
        StructureKind::Wall | StructureKind::Rampart => {
            map_defense_priority(structure.hits, structure.hits_max, stored_energy, under_attack)
        }
        _ => map_normal_priority(structure.hits, structure.hits_max),
    }
}

/// All damaged structures in a room that are ours to maintain (owned, or
/// unowned infrastructure like roads and containers).
pub fn get_repair_targets(world: &World, room: RoomName) -> Vec<&StructureData> {
    world
        .structures_in(room)
        .filter(|structure| structure.my || !matches!(structure.kind, StructureKind::Spawn | StructureKind::Tower))
        .filter(|structure| structure.hits > 0 && structure.hits_max > 0)
        .filter(|structure| structure.needs_repair())
        .collect()
}

/// Best repair target out of a cached candidate id list, highest priority
/// bucket first, nearest inside a bucket. Ids that vanished or healed since
/// the cache was built are skipped.
pub fn select_repair_target<'a>(
    world: &'a World,
    room: RoomName,
    candidates: &[ObjectId<StructureData>],
    near: Position,
) -> Option<&'a StructureData> {
    let under_attack = world.hostile_creeps_in(room).next().is_some();

    let stored_energy = world
        .structures_in(room)
        .filter(|s| s.kind == StructureKind::Storage && s.my)
        .filter_map(|s| s.store.as_ref())
        .map(|s| s.energy())
        .sum();

    let mut buckets: HashMap<RepairPriority, Vec<&StructureData>> = candidates
        .iter()
        .filter_map(|id| world.get_structure(*id))
        .filter(|s| s.needs_repair())
        .filter_map(|s| map_structure_repair_priority(s, stored_energy, under_attack).map(|p| (p, s)))
        .into_group_map();

    for priority in ORDERED_REPAIR_PRIORITIES.iter() {
        if let Some(structures) = buckets.remove(priority) {
            if let Some(structure) = structures.into_iter().find_nearest_linear_by(near, |s| s.pos) {
                return Some(structure);
            }
        }
    }

    None
}

/// Opportunistic repair: a damaged structure within working range, no travel
/// needed. Owned structures win over unowned ones at any distance.
pub fn find_repair_in_range(ctx: &mut FindContext) -> Option<Task> {
    if !ctx.is_full() {
        return None;
    }

    let creep_pos = ctx.creep.pos;
    let range = ctx.settings.repair_range;

    let candidates: Vec<_> = get_repair_targets(ctx.world, creep_pos.room)
        .into_iter()
        .filter(|s| creep_pos.in_range_to(s.pos, range))
        .filter(|s| !ctx.memory.is_blocked(s.id.raw()))
        .collect();

    // Owned structures win outright; only fall back to unowned infrastructure
    // when nothing of ours is in range.
    let structure = candidates
        .iter()
        .filter(|s| s.my)
        .copied()
        .find_nearest_path_by(ctx.world, creep_pos, |s| s.pos)
        .or_else(|| {
            candidates
                .iter()
                .filter(|s| !s.my)
                .copied()
                .find_nearest_path_by(ctx.world, creep_pos, |s| s.pos)
        })?;

    Some(Task::new(TaskAction::Repair, TaskTarget::Structure(structure.id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defense_structures_need_no_repair_when_healthy_and_poor() {
        assert_eq!(map_defense_priority(50_000, 100_000, 0, false), None);
        assert!(map_defense_priority(50, 100_000, 0, false).is_some());
        assert_eq!(
            map_defense_priority(500, 100_000, 0, true),
            Some(RepairPriority::Critical)
        );
    }

    #[test]
    fn high_value_structures_escalate_early() {
        assert_eq!(map_high_value_priority(400, 1000), Some(RepairPriority::Critical));
        assert_eq!(map_high_value_priority(990, 1000), Some(RepairPriority::VeryLow));
    }

    #[test]
    fn cached_candidates_are_resolved_defensively() {
        let room = RoomName::new(0, 0);
        let mut world = World::new();
        world.add_room(room);

        let healed = world.add_structure(Position::new(room, 5, 5), StructureKind::Road, false);
        let near = world.add_structure(Position::new(room, 11, 10), StructureKind::Road, false);
        let far = world.add_structure(Position::new(room, 30, 10), StructureKind::Road, false);
        world.set_structure_hits(near.raw(), 100);
        world.set_structure_hits(far.raw(), 100);

        let gone = world.add_structure(Position::new(room, 6, 6), StructureKind::Road, false);
        world.remove_object(gone.raw());

        let candidates = vec![gone, healed, far, near];
        let chosen = select_repair_target(&world, room, &candidates, Position::new(room, 10, 10));

        assert_eq!(chosen.map(|s| s.id), Some(near));
    }
}
