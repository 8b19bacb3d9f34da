use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;

fn own_controller(ctx: &FindContext) -> Option<ObjectId<ControllerData>> {
    let controller = ctx.world.controller_in(ctx.creep.pos.room)?;

    if controller.my {
        Some(controller.id)
    } else {
        None
    }
}

/// Upgrade only when the controller is close to downgrading.
pub fn find_urgent_upgrade(ctx: &mut FindContext) -> Option<Task> {
    if ctx.is_empty() {
        return None;
    }

    let id = own_controller(ctx)?;
    let controller = ctx.world.get_controller(id)?;

    if controller.ticks_to_downgrade >= ctx.settings.downgrade_margin {
        return None;
    }

    Some(Task::new(TaskAction::Upgrade, TaskTarget::Controller(id)))
}

/// Unconditional upgrade, the tail of the worker cascade.
pub fn find_upgrade(ctx: &mut FindContext) -> Option<Task> {
    if ctx.is_empty() {
        return None;
    }

    let id = own_controller(ctx)?;

    Some(Task::new(TaskAction::Upgrade, TaskTarget::Controller(id)))
}
