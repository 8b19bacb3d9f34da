use crate::constants::*;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use rand::Rng;

/// One random walkable step. The terminal fallback of every cascade; keeps an
/// otherwise idle creep from clogging a tile forever.
pub fn find_random_move(ctx: &mut FindContext) -> Option<Task> {
    let pos = ctx.creep.pos;

    for _ in 0..8 {
        let dx: i32 = ctx.rng.random_range(-1..=1);
        let dy: i32 = ctx.rng.random_range(-1..=1);

        let x = pos.x() as i32 + dx;
        let y = pos.y() as i32 + dy;

        if (dx == 0 && dy == 0) || x < 1 || y < 1 || x >= ROOM_WIDTH as i32 - 1 || y >= ROOM_HEIGHT as i32 - 1 {
            continue;
        }

        let step = Position::new(pos.room, x as u8, y as u8);

        if ctx.world.is_walkable(step) {
            return Some(Task::new(TaskAction::MoveTo, TaskTarget::Position(step)));
        }
    }

    None
}

/// Nearest exit tile of the creep's current room; used to vacate rooms the
/// colony no longer owns.
pub fn nearest_exit(world: &World, pos: Position) -> Option<Position> {
    let terrain = world.terrain(pos.room)?;
    let mut best: Option<(u32, Position)> = None;

    let mut consider = |x: u8, y: u8| {
        if terrain.is_wall(x, y) {
            return;
        }

        let exit = Position::new(pos.room, x, y);
        let range = pos.range_to(exit).unwrap_or(u32::MAX);

        if best.map(|(r, _)| range < r).unwrap_or(true) {
            best = Some((range, exit));
        }
    };

    for x in 0..ROOM_WIDTH {
        consider(x, 0);
        consider(x, ROOM_HEIGHT - 1);
    }
    for y in 0..ROOM_HEIGHT {
        consider(0, y);
        consider(ROOM_WIDTH - 1, y);
    }

    best.map(|(_, exit)| exit)
}
