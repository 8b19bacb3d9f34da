use crate::findnearest::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::data::{Role, TaskFinder};
use crate::jobs::utility::movement::*;
use crate::jobs::utility::resource::*;

/// Carriers shuttle loose energy into the colony's consumers. They never
/// build or upgrade.
pub static CARRIER_STRATEGIES: &[TaskFinder] =
    &[find_fetch_scavenge, find_deliver, find_feed_working_creep, find_random_move];

pub fn find_fetch_scavenge(ctx: &mut FindContext) -> Option<Task> {
    select_energy_pickup(ctx, &PickupSettings::scavenge())
}

pub fn find_deliver(ctx: &mut FindContext) -> Option<Task> {
    select_energy_delivery(ctx)
}

/// With every structural consumer satisfied, top up a creep that works far
/// from the energy flow: an empty upgrader camped at the controller. Creeps
/// already promised a delivery are skipped, so two carriers never converge on
/// the same receiver.
pub fn find_feed_working_creep(ctx: &mut FindContext) -> Option<Task> {
    if ctx.is_empty() {
        return None;
    }

    let creep_pos = ctx.creep.pos;

    let hungry = ctx
        .world
        .creeps_in(creep_pos.room)
        .filter(|c| c.my && c.name != ctx.creep.name)
        .filter(|c| c.store.capacity() > 0 && c.store.is_empty())
        .filter(|c| {
            ctx.creep_memories
                .get(&c.name)
                .map(|m| m.role == Role::Upgrader && m.awaiting_delivery_from.is_none())
                .unwrap_or(false)
        })
        .filter(|c| !ctx.memory.is_blocked(c.id.raw()))
        .find_nearest_path_by(ctx.world, creep_pos, |c| c.pos)?;

    Some(Task::new(TaskAction::Transfer, TaskTarget::Creep(hungry.id)))
}
