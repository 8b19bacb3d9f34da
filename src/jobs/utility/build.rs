use crate::findnearest::*;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;

/// Opportunistic build: a construction site within working range.
pub fn find_build_in_range(ctx: &mut FindContext) -> Option<Task> {
    if !ctx.is_full() {
        return None;
    }

    let creep_pos = ctx.creep.pos;
    let range = ctx.settings.build_range;

    let site = ctx
        .world
        .construction_sites_in(creep_pos.room)
        .filter(|s| s.my)
        .filter(|s| creep_pos.in_range_to(s.pos, range))
        .filter(|s| !ctx.memory.is_blocked(s.id.raw()))
        .find_nearest_path_by(ctx.world, creep_pos, |s| s.pos)?;

    Some(Task::new(TaskAction::Build, TaskTarget::ConstructionSite(site.id)))
}

/// Any construction site in the room, for creeps already carrying energy.
pub fn find_build_anywhere(ctx: &mut FindContext) -> Option<Task> {
    if ctx.is_empty() {
        return None;
    }

    let creep_pos = ctx.creep.pos;

    let site = ctx
        .world
        .construction_sites_in(creep_pos.room)
        .filter(|s| s.my)
        .filter(|s| !ctx.memory.is_blocked(s.id.raw()))
        .find_nearest_path_by(ctx.world, creep_pos, |s| s.pos)?;

    Some(Task::new(TaskAction::Build, TaskTarget::ConstructionSite(site.id)))
}
