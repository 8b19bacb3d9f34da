use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::data::TaskFinder;
use crate::jobs::utility::movement::*;
use rand::seq::IndexedRandom;

pub static EXPLORER_STRATEGIES: &[TaskFinder] = &[find_explore_room, find_random_move];

/// Wander into a random safe exit room. Rooms flagged hostile are avoided;
/// unknown rooms are exactly what an explorer is for.
pub fn find_explore_room(ctx: &mut FindContext) -> Option<Task> {
    let here = ctx.creep.pos.room;

    let candidates: Vec<RoomName> = here
        .neighbors()
        .into_iter()
        .filter(|room| !ctx.room_is_hostile(*room))
        .collect();

    let room = candidates.choose(ctx.rng).copied()?;
    let target = Position::new(room, 25, 25);

    Some(Task::new(TaskAction::MoveTo, TaskTarget::Position(target)))
}
