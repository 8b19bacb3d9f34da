use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::data::TaskFinder;
use crate::jobs::utility::build::*;
use crate::jobs::utility::controllers::*;
use crate::jobs::utility::movement::*;
use crate::jobs::utility::repair::*;
use crate::jobs::utility::resource::*;

/// The generalist cascade. Stage order is semantic, not just an optimization:
/// in-place repair and build avoid travel entirely, fetching only applies to
/// an empty creep, and everything after it spends what is carried.
pub static WORKER_STRATEGIES: &[TaskFinder] = &[
    find_repair_in_range,
    find_build_in_range,
    find_fetch_any,
    find_deliver,
    find_urgent_upgrade,
    find_build_anywhere,
    find_upgrade,
    find_random_move,
];

pub fn find_fetch_any(ctx: &mut FindContext) -> Option<Task> {
    select_energy_pickup(ctx, &PickupSettings::consume())
}

pub fn find_deliver(ctx: &mut FindContext) -> Option<Task> {
    select_energy_delivery(ctx)
}
