use crate::config::Settings;
use crate::constants::*;
use crate::game::*;
use crate::memorysystem::GameMemory;
use crate::room::scoring;
use log::*;

/// How much threat one defensive tower offsets when sizing up hostiles.
const TOWER_THREAT_OFFSET: i32 = 10;

/// Loose energy sitting in the room waiting to be hauled: dropped piles plus
/// container contents.
pub fn hauling_demand(world: &World, room: RoomName) -> u32 {
    let dropped: u32 = world.dropped_in(room).map(|r| r.amount).sum();

    let containerized: u32 = world
        .structures_in(room)
        .filter(|s| s.kind == StructureKind::Container)
        .filter_map(|s| s.store.as_ref())
        .map(|s| s.energy())
        .sum();

    dropped + containerized
}

/// Offensive body parts across all hostiles, offset by defensive towers.
pub fn threat_level(world: &World, room: RoomName) -> i32 {
    let hostile_parts: i32 = world
        .hostile_creeps_in(room)
        .map(|c| {
            (c.count_parts(Part::Attack) + c.count_parts(Part::RangedAttack) + c.count_parts(Part::Heal)) as i32
        })
        .sum();

    let towers = world
        .structures_in(room)
        .filter(|s| s.kind == StructureKind::Tower && s.my)
        .count() as i32;

    hostile_parts - towers * TOWER_THREAT_OFFSET
}

/// Per-room maintenance: refresh the derived caches when the room's
/// structure actually changed, keep the trend samples current, and
/// occasionally propose construction. Runs once per owned room per tick.
pub fn run_room(world: &mut World, memory: &mut GameMemory, settings: &Settings, room: RoomName) {
    let tick = world.time();

    let hostiles = world.hostile_creeps_in(room).next().is_some();
    let structure_count = world.structures_in(room).count() as u32;
    let construction_count = world.construction_sites_in(room).count() as u32;

    let room_memory = memory.room_mut(room);

    let changed = room_memory.hostiles_present != hostiles
        || room_memory.structure_count != structure_count
        || room_memory.construction_count != construction_count;

    room_memory.hostiles_present = hostiles;
    room_memory.structure_count = structure_count;
    room_memory.construction_count = construction_count;

    if changed {
        room_memory.invalidate();
    }

    if room_memory.cache_tick.is_none() {
        rebuild_caches(world, memory, room, tick);
    }

    let demand = hauling_demand(world, room);
    let threat = threat_level(world, room);
    let window = settings.demand_trend_window;

    let room_memory = memory.room_mut(room);
    room_memory.push_demand_sample(tick, demand, window);
    room_memory.push_threat_sample(tick, threat, window);

    // Construction proposals are optional work; skip them entirely while
    // hostiles are around or between maintenance intervals.
    if !hostiles && tick % settings.maintenance_interval.max(1) == 0 {
        propose_construction(world, memory, settings, room);
    }
}

fn rebuild_caches(world: &World, memory: &mut GameMemory, room: RoomName, tick: u32) {
    let upgrade_spots = world
        .controller_in(room)
        .map(|controller| scoring::upgrade_spots(world, controller))
        .unwrap_or_default();

    let harvest_spots = world
        .sources_in(room)
        .map(|source| (source.id, scoring::harvest_spots(world, source)))
        .collect();

    let repair_targets = crate::jobs::utility::repair::get_repair_targets(world, room)
        .into_iter()
        .map(|s| s.id)
        .collect();

    let room_memory = memory.room_mut(room);
    room_memory.upgrade_spots = upgrade_spots;
    room_memory.harvest_spots = harvest_spots;
    room_memory.repair_targets = repair_targets;
    room_memory.cache_tick = Some(tick);

    debug!("{}: room caches rebuilt", room);
}

fn propose_construction(world: &mut World, memory: &mut GameMemory, settings: &Settings, room: RoomName) {
    let existing = world.construction_sites_in(room).count();

    if existing >= MAX_CONSTRUCTION_SITES_PER_ROOM {
        return;
    }

    let mut budget = MAX_CONSTRUCTION_SITES_PER_ROOM - existing;

    let road_sites = {
        let room_memory = memory.room_mut(room);
        scoring::suggest_road_sites(world, room, room_memory, settings)
    };

    for pos in road_sites.into_iter().take(budget) {
        if world.create_construction_site(pos, StructureKind::Road) == ReturnCode::Ok {
            info!("{}: road site placed at {:?}", room, pos);
            budget -= 1;
        }
    }

    if budget == 0 {
        return;
    }

    // One extension proposal per pass keeps growth gradual.
    let spawn_pos = match world.my_spawns_in(room).first() {
        Some(spawn) => spawn.pos,
        None => return,
    };

    if let Some(pos) = scoring::suggest_extension_sites(world, spawn_pos, 1).first().copied() {
        if world.create_construction_site(pos, StructureKind::Extension) == ReturnCode::Ok {
            info!("{}: extension site placed at {:?}", room, pos);
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
    fn structural_change_invalidates_and_rebuilds_caches() {
        let mut world = World::new();
        world.add_room(room());
        world.add_controller(Position::new(room(), 25, 25), true);
        world.add_source(Position::new(room(), 10, 10), 3000, 3000);

        let mut memory = GameMemory::default();
        let settings = Settings::default();

        run_room(&mut world, &mut memory, &settings, room());
        let first_tick = memory.rooms[&room()].cache_tick;
        assert!(first_tick.is_some());
        assert!(!memory.rooms[&room()].upgrade_spots.is_empty());

        // No structural change: cache untouched on the next pass.
        world.set_time(1);
        run_room(&mut world, &mut memory, &settings, room());
        assert_eq!(memory.rooms[&room()].cache_tick, first_tick);

        // New structure: cache rebuilt.
        world.add_structure(Position::new(room(), 30, 30), StructureKind::Tower, true);
        world.set_time(2);
        run_room(&mut world, &mut memory, &settings, room());
        assert_eq!(memory.rooms[&room()].cache_tick, Some(2));
    }

    #[test]
    fn threat_subtracts_tower_cover() {
        let mut world = World::new();
        world.add_room(room());
        world.add_creep(
            "enemy",
            Position::new(room(), 10, 10),
            vec![Part::Attack, Part::Attack, Part::Move],
            false,
        );

        assert_eq!(threat_level(&world, room()), 2);

        world.add_structure(Position::new(room(), 20, 20), StructureKind::Tower, true);
        assert_eq!(threat_level(&world, room()), 2 - TOWER_THREAT_OFFSET);
    }
}
