use crate::findnearest::*;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::data::TaskFinder;
use crate::jobs::utility::movement::*;

pub static INFANTRY_STRATEGIES: &[TaskFinder] = &[find_hostile_target, find_random_move];

/// Engage the nearest hostile in the current room, else head for any owned
/// room reporting hostiles.
pub fn find_hostile_target(ctx: &mut FindContext) -> Option<Task> {
    let creep_pos = ctx.creep.pos;

    let local = ctx
        .world
        .hostile_creeps_in(creep_pos.room)
        .filter(|hostile| !ctx.memory.is_blocked(hostile.id.raw()))
        .find_nearest_path_by(ctx.world, creep_pos, |hostile| hostile.pos);

    if let Some(hostile) = local {
        return Some(Task::new(TaskAction::Attack, TaskTarget::Creep(hostile.id)));
    }

    for room in ctx.world.my_rooms() {
        if room == creep_pos.room {
            continue;
        }

        if let Some(hostile) = ctx.world.hostile_creeps_in(room).next() {
            return Some(Task::new(TaskAction::Attack, TaskTarget::Creep(hostile.id)));
        }
    }

    None
}
