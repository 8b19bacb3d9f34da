use crate::config::Settings;
use crate::constants::*;
use crate::game::*;
use crate::room::data::RoomMemory;
use itertools::Itertools;

/// All in-room tiles within chebyshev `range` of `pos`, excluding `pos`
/// itself.
pub fn positions_around(pos: Position, range: u8) -> Vec<Position> {
    let mut result = Vec::new();

    for dx in -(range as i32)..=(range as i32) {
        for dy in -(range as i32)..=(range as i32) {
            if dx == 0 && dy == 0 {
                continue;
            }

            let x = pos.x() as i32 + dx;
            let y = pos.y() as i32 + dy;

            if x < 0 || y < 0 || x >= ROOM_WIDTH as i32 || y >= ROOM_HEIGHT as i32 {
                continue;
            }

            result.push(Position::new(pos.room, x as u8, y as u8));
        }
    }

    result
}

/// Tiles around `pos` a creep could actually stand on.
pub fn open_positions_around(world: &World, pos: Position, range: u8) -> Vec<Position> {
    positions_around(pos, range)
        .into_iter()
        .filter(|p| world.is_walkable(*p))
        .collect()
}

/// Standing spots for upgraders: walkable, within working range of the
/// controller, never on top of it.
pub fn upgrade_spots(world: &World, controller: &ControllerData) -> Vec<Position> {
    open_positions_around(world, controller.pos, 2)
}

/// Obstacle-free tiles adjacent to a source; the number of these bounds how
/// many harvesters the source supports.
pub fn harvest_spots(world: &World, source: &SourceData) -> Vec<Position> {
    open_positions_around(world, source.pos, 1)
}

/// How suitable a tile is for a new extension: walkable, away from the room
/// edge, and with enough open neighbors that it will not wall in traffic.
/// Higher is better; `None` means unusable.
pub fn extension_site_score(world: &World, pos: Position, spawn_pos: Position) -> Option<u32> {
    if !world.is_walkable(pos) || pos.is_room_edge() {
        return None;
    }

    let openness = open_positions_around(world, pos, 1).len() as u32;

    if openness < 5 {
        return None;
    }

    let range = pos.range_to(spawn_pos)?;

    if range < 2 || range > 6 {
        return None;
    }

    // Prefer open tiles close to the spawn.
    Some(openness * 10 + (10 - range.min(10)))
}

/// Best candidate tiles for new extensions around a spawn.
pub fn suggest_extension_sites(world: &World, spawn_pos: Position, limit: usize) -> Vec<Position> {
    positions_around(spawn_pos, 6)
        .into_iter()
        .filter_map(|pos| extension_site_score(world, pos, spawn_pos).map(|score| (score, pos)))
        .sorted_by_key(|(score, _)| std::cmp::Reverse(*score))
        .map(|(_, pos)| pos)
        .take(limit)
        .collect()
}

/// Tiles whose accumulated creep traffic justifies a road and which do not
/// have one (or a pending site) yet.
pub fn suggest_road_sites(world: &World, room: RoomName, memory: &RoomMemory, settings: &Settings) -> Vec<Position> {
    memory
        .traffic
        .iter()
        .filter(|(_, count)| **count >= settings.road_traffic_threshold)
        .map(|(packed, count)| (Position::from_packed_xy(room, *packed), *count))
        .filter(|(pos, _)| world.is_walkable(*pos))
        .filter(|(pos, _)| {
            !world
                .structures_in(room)
                .any(|s| s.pos == *pos && s.kind == StructureKind::Road)
        })
        .filter(|(pos, _)| !world.construction_sites_in(room).any(|s| s.pos == *pos))
        .sorted_by_key(|(_, count)| std::cmp::Reverse(*count))
        .map(|(pos, _)| pos)
        .collect()
}
