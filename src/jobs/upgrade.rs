use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::data::TaskFinder;
use crate::jobs::utility::controllers::*;
use crate::jobs::utility::movement::*;
use crate::jobs::utility::resource::*;

/// Upgraders feed the controller and nothing else.
pub static UPGRADER_STRATEGIES: &[TaskFinder] = &[find_fetch, find_upgrade, find_random_move];

pub fn find_fetch(ctx: &mut FindContext) -> Option<Task> {
    // A carrier has promised a delivery; wandering off would miss it.
    if ctx.memory.awaiting_delivery_from.is_some() {
        return None;
    }

    select_energy_pickup(ctx, &PickupSettings::consume())
}
