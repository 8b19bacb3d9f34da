use crate::findnearest::*;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::data::TaskFinder;
use itertools::Itertools;

/// Dedicated harvesters never roam: one source for life, chosen on first
/// resolution and kept in memory.
pub static HARVESTER_STRATEGIES: &[TaskFinder] = &[find_harvester_deposit, find_bound_harvest];

/// Sources in the room grouped by how many living harvesters are already
/// bound to them.
fn least_claimed_source(ctx: &FindContext) -> Option<ObjectId<SourceData>> {
    let room = ctx.creep.pos.room;

    let claims = ctx
        .creep_memories
        .values()
        .filter_map(|memory| memory.source_id)
        .counts();

    ctx.world
        .sources_in(room)
        .map(|source| (claims.get(&source.id).copied().unwrap_or(0), source))
        .sorted_by_key(|(claimed, _)| *claimed)
        .map(|(_, source)| source)
        .next()
        .map(|source| source.id)
}

/// Mine the bound source. Binding happens here on the first call and is never
/// repointed afterwards.
pub fn find_bound_harvest(ctx: &mut FindContext) -> Option<Task> {
    let source_id = match ctx.memory.source_id {
        Some(id) => id,
        None => {
            let id = least_claimed_source(ctx)?;
            ctx.memory.source_id = Some(id);
            id
        }
    };

    // A vanished source unbinds; anything else keeps the claim.
    if ctx.world.get_source(source_id).is_none() {
        ctx.memory.source_id = None;
        return None;
    }

    Some(Task::new(TaskAction::Harvest, TaskTarget::Source(source_id)))
}

/// A full harvester unloads into an adjacent container or link before going
/// back to mining; with no sink in reach it keeps mining and lets the
/// overflow drop for carriers.
pub fn find_harvester_deposit(ctx: &mut FindContext) -> Option<Task> {
    if !ctx.is_full() {
        return None;
    }

    let creep_pos = ctx.creep.pos;

    let sink = ctx
        .world
        .structures_in(creep_pos.room)
        .filter(|s| matches!(s.kind, StructureKind::Container | StructureKind::Link))
        .filter(|s| s.kind == StructureKind::Container || s.my)
        .filter(|s| s.store.map(|store| !store.is_full()).unwrap_or(false))
        .filter(|s| creep_pos.in_range_to(s.pos, 2))
        .find_nearest_linear_by(creep_pos, |s| s.pos)?;

    Some(Task::new(TaskAction::Transfer, TaskTarget::Structure(sink.id)))
}
