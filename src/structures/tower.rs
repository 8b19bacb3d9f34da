use crate::config::Settings;
use crate::game::*;
use crate::jobs::utility::repair::select_repair_target;
use crate::memorysystem::GameMemory;
use log::*;

/// Tower control for one room: attack the weakest hostile, else patch up the
/// most damaged friendly creep, else repair — but only while energy stays
/// above the defense reserve. Repair candidates come from the room's cached
/// target list; the cache refreshes on structural change.
pub fn run_towers(world: &mut World, memory: &GameMemory, settings: &Settings, room: RoomName) {
    let repair_candidates: Vec<_> = memory
        .rooms
        .get(&room)
        .map(|m| m.repair_targets.clone())
        .unwrap_or_default();

    let towers: Vec<_> = world
        .structures_in(room)
        .filter(|s| s.kind == StructureKind::Tower && s.my)
        .map(|s| (s.id, s.pos, s.store.map(|store| store.energy()).unwrap_or(0)))
        .collect();

    for (tower, tower_pos, energy) in towers {
        let hostile = world
            .hostile_creeps_in(room)
            .min_by_key(|c| c.hits)
            .map(|c| c.id);

        if let Some(target) = hostile {
            if world.tower_attack(tower, target) == ReturnCode::Ok {
                continue;
            }
        }

        let wounded = world
            .creeps_in(room)
            .filter(|c| c.my && c.hits < c.hits_max)
            .min_by_key(|c| c.hits * 100 / c.hits_max.max(1))
            .map(|c| c.id);

        if let Some(target) = wounded {
            if world.tower_heal(tower, target) == ReturnCode::Ok {
                continue;
            }
        }

        // Repairing below the reserve would leave the tower dry in a fight.
        if energy <= settings.tower_repair_floor {
            continue;
        }

        let target = select_repair_target(world, room, &repair_candidates, tower_pos).map(|s| s.id);

        if let Some(target) = target {
            let code = world.tower_repair(tower, target);

            if code != ReturnCode::Ok {
                debug!("{}: tower repair of {} failed: {:?}", room, target, code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> RoomName {
        RoomName::new(0, 0)
    }

    #[test]
    fn tower_prefers_the_weakest_hostile() {
        let mut world = World::new();
        world.add_room(room());

        let tower = world.add_structure(Position::new(room(), 25, 25), StructureKind::Tower, true);
        world.set_store_energy(tower.raw(), 1000);

        world.add_creep("tank", Position::new(room(), 10, 10), vec![Part::Tough; 10], false);
        world.add_creep("scout", Position::new(room(), 12, 12), vec![Part::Move], false);

        run_towers(&mut world, &GameMemory::default(), &Settings::default(), room());

        // The single-part scout (100 hits) dies to one tower volley; the tank
        // survives.
        assert!(world.get_creep("scout").is_none());
        assert!(world.get_creep("tank").is_some());
    }

    #[test]
    fn tower_repairs_from_the_cached_target_list() {
        let mut world = World::new();
        world.add_room(room());

        let tower = world.add_structure(Position::new(room(), 25, 25), StructureKind::Tower, true);
        world.set_store_energy(tower.raw(), 1000);

        let road = world.add_structure(Position::new(room(), 20, 20), StructureKind::Road, false);
        world.set_structure_hits(road.raw(), 10);

        let mut memory = GameMemory::default();
        memory.room_mut(room()).repair_targets = vec![road];

        run_towers(&mut world, &memory, &Settings::default(), room());

        assert!(world.get_structure(road).unwrap().hits > 10);
    }

    #[test]
    fn tower_conserves_energy_instead_of_repairing() {
        let mut world = World::new();
        world.add_room(room());

        let tower = world.add_structure(Position::new(room(), 25, 25), StructureKind::Tower, true);
        world.set_store_energy(tower.raw(), 100);

        let road = world.add_structure(Position::new(room(), 20, 20), StructureKind::Road, false);
        world.set_structure_hits(road.raw(), 10);

        let mut memory = GameMemory::default();
        memory.room_mut(room()).repair_targets = vec![road];

        run_towers(&mut world, &memory, &Settings::default(), room());

        // Below the repair floor: the road stays broken.
        assert_eq!(world.get_structure(road).unwrap().hits, 10);
    }
}
