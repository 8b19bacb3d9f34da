use crate::findnearest::*;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::data::TaskFinder;
use crate::jobs::utility::movement::*;
use rand::seq::IndexedRandom;

pub static RESERVER_STRATEGIES: &[TaskFinder] = &[find_reserve_controller, find_random_move];

fn reservable(controller: &ControllerData) -> bool {
    controller.reservable && !controller.my && controller.owner.is_none() && controller.reservation.is_none()
}

/// The closest controller flagged reservable; same-room candidates are ranked
/// by path, remote ones drawn uniformly at random.
pub fn find_reserve_controller(ctx: &mut FindContext) -> Option<Task> {
    let creep_pos = ctx.creep.pos;

    let local = ctx
        .world
        .rooms()
        .filter_map(|room| ctx.world.controller_in(room))
        .filter(|controller| reservable(controller))
        .filter(|controller| !ctx.memory.is_blocked(controller.id.raw()))
        .filter(|controller| controller.pos.room == creep_pos.room)
        .find_nearest_path_by(ctx.world, creep_pos, |controller| controller.pos)
        .map(|controller| controller.id);

    let chosen = match local {
        Some(id) => Some(id),
        None => {
            let remote: Vec<_> = ctx
                .world
                .rooms()
                .filter_map(|room| ctx.world.controller_in(room))
                .filter(|controller| reservable(controller))
                .filter(|controller| !ctx.memory.is_blocked(controller.id.raw()))
                .filter(|controller| controller.pos.room != creep_pos.room)
                .map(|controller| controller.id)
                .collect();

            remote.choose(ctx.rng).copied()
        }
    };

    chosen.map(|id| Task::new(TaskAction::Reserve, TaskTarget::Controller(id)))
}
