use crate::findnearest::*;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::data::TaskFinder;
use crate::jobs::utility::movement::*;

/// Transferers park between the storage and its link and keep energy flowing
/// from the link network into storage.
pub static TRANSFERER_STRATEGIES: &[TaskFinder] = &[find_link_withdraw, find_storage_deposit, find_random_move];

fn my_storage(ctx: &FindContext) -> Option<StructureData> {
    ctx.world
        .structures_in(ctx.creep.pos.room)
        .find(|s| s.kind == StructureKind::Storage && s.my)
        .cloned()
}

/// Drain the storage-side link when it has something in it.
pub fn find_link_withdraw(ctx: &mut FindContext) -> Option<Task> {
    if !ctx.is_empty() {
        return None;
    }

    let storage = my_storage(ctx)?;
    let creep_pos = ctx.creep.pos;

    let link = ctx
        .world
        .structures_in(creep_pos.room)
        .filter(|s| s.kind == StructureKind::Link && s.my)
        .filter(|s| s.pos.in_range_to(storage.pos, 2))
        .filter(|s| s.store.map(|store| !store.is_empty()).unwrap_or(false))
        .find_nearest_linear_by(creep_pos, |s| s.pos)?;

    Some(Task::new(TaskAction::Withdraw, TaskTarget::Structure(link.id)))
}

pub fn find_storage_deposit(ctx: &mut FindContext) -> Option<Task> {
    if ctx.is_empty() {
        return None;
    }

    let storage = my_storage(ctx)?;

    if storage.store.map(|store| store.is_full()).unwrap_or(true) {
        return None;
    }

    Some(Task::new(TaskAction::Transfer, TaskTarget::Structure(storage.id)))
}
