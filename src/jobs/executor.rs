use crate::config::Settings;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::utility::movement::nearest_exit;
use crate::memorysystem::CreepMemory;
use crate::room::data::RoomMemory;
use log::*;
use std::collections::HashMap;

/// What the outcome policy decided should happen next.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Disposition {
    /// Keep the plan (or there is nothing left to do this tick).
    Done,
    /// The plan was dropped and the creep should resolve a fresh task within
    /// the same tick.
    Replan,
}

/// Submit the single primitive a task implies. An action verb paired with a
/// destination it cannot apply to is a planning bug: reported, never a crash.
pub fn act(world: &mut World, name: &str, task: Task) -> ReturnCode {
    match (task.action, task.target) {
        (TaskAction::Harvest, TaskTarget::Source(id)) => world.creep_harvest(name, id),
        (TaskAction::Pickup, TaskTarget::Resource(id)) => world.creep_pickup(name, id),
        (TaskAction::Withdraw, TaskTarget::Structure(id)) => world.creep_withdraw(name, id.raw(), None),
        (TaskAction::Withdraw, TaskTarget::Tombstone(id)) => world.creep_withdraw(name, id.raw(), None),
        (TaskAction::Withdraw, TaskTarget::Ruin(id)) => world.creep_withdraw(name, id.raw(), None),
        (TaskAction::Transfer, TaskTarget::Structure(id)) => world.creep_transfer(name, id.raw(), None),
        (TaskAction::Transfer, TaskTarget::Creep(id)) => world.creep_transfer(name, id.raw(), None),
        (TaskAction::Build, TaskTarget::ConstructionSite(id)) => world.creep_build(name, id),
        (TaskAction::Repair, TaskTarget::Structure(id)) => world.creep_repair(name, id),
        (TaskAction::Upgrade, TaskTarget::Controller(id)) => world.creep_upgrade(name, id),
        (TaskAction::Reserve, TaskTarget::Controller(id)) => world.creep_reserve(name, id),
        (TaskAction::Attack, TaskTarget::Creep(id)) => world.creep_attack(name, id.raw()),
        (TaskAction::Attack, TaskTarget::Structure(id)) => world.creep_attack(name, id.raw()),
        (TaskAction::Heal, TaskTarget::Creep(id)) => world.creep_heal(name, id),
        (TaskAction::MoveTo, target) => match target.pos(world) {
            Some(pos) => world.creep_move_to(name, pos),
            None => ReturnCode::InvalidTarget,
        },
        (action, target) => {
            error!("{}: action {:?} is incompatible with target {:?}", name, action, target);
            ReturnCode::InvalidArgs
        }
    }
}

/// Apply the recovery policy for one submitted action's status code.
#[allow(clippy::too_many_arguments)]
pub fn handle_outcome(
    world: &mut World,
    settings: &Settings,
    tick: u32,
    name: &str,
    task: Task,
    code: ReturnCode,
    memory: &mut CreepMemory,
    other_creeps: &mut HashMap<String, CreepMemory>,
    rooms: &mut HashMap<RoomName, RoomMemory>,
) -> Disposition {
    memory.last_action_outcome = Some(code);

    match code {
        ReturnCode::Ok => {
            memory.last_ok_action_time = Some(tick);

            if task.action == TaskAction::Transfer {
                note_energy_delivered(world, tick, task.target, other_creeps, rooms);
            }

            Disposition::Done
        }
        ReturnCode::NotInRange => {
            // Fold the approach into the same tick rather than losing it.
            if let Some(pos) = task.target.pos(world) {
                world.creep_move_to(name, pos);
                memory.last_move_time = Some(tick);
            }

            Disposition::Done
        }
        ReturnCode::Full | ReturnCode::NotEnoughResources => {
            // The rest of this tick is still usable; pick something else now.
            memory.reset_task();
            Disposition::Replan
        }
        ReturnCode::NoPath => {
            debug!("{}: no path to {:?}, abandoning", name, task.target);
            memory.reset_task();
            Disposition::Done
        }
        ReturnCode::InvalidTarget | ReturnCode::NotFound => {
            if let Some(id) = task.target.raw_id() {
                memory.block_target(id, settings.blacklist_capacity);
            }

            memory.reset_task();
            Disposition::Done
        }
        ReturnCode::Tired => Disposition::Done,
        ReturnCode::NotOwner => {
            memory.reset_task();

            if let Some(creep) = world.get_creep(name) {
                if let Some(exit) = nearest_exit(world, creep.pos) {
                    memory.set_task(Task::new(TaskAction::MoveTo, TaskTarget::Position(exit)), tick);
                }
            }

            Disposition::Done
        }
        other => {
            debug!("{}: unhandled action outcome {:?} for {:?}", name, other, task);
            Disposition::Done
        }
    }
}

/// Successful energy transfers ripple outward: receiving creeps are told to
/// re-plan, and spawn/extension fills feed the room's refill ordering.
fn note_energy_delivered(
    world: &World,
    tick: u32,
    target: TaskTarget,
    other_creeps: &mut HashMap<String, CreepMemory>,
    rooms: &mut HashMap<RoomName, RoomMemory>,
) {
    match target {
        TaskTarget::Creep(id) => {
            if let Some(receiver) = world.get_creep_by_id(id) {
                if let Some(receiver_memory) = other_creeps.get_mut(&receiver.name) {
                    receiver_memory.last_delivery_time = Some(tick);
                    receiver_memory.awaiting_delivery_from = None;
                }
            }
        }
        TaskTarget::Structure(id) => {
            if let Some(structure) = world.get_structure(id) {
                if matches!(structure.kind, StructureKind::Spawn | StructureKind::Extension) {
                    rooms.entry(structure.pos.room).or_default().note_filled(id);
                }
            }
        }
        _ => {}
    }
}

/// Coarse no-progress detection: if a creep has neither closed on its
/// destination nor acted successfully for longer than the timeout, the plan
/// is forcibly dropped and the target blacklisted. Deliberately approximate;
/// replaying paths to prove stuckness would cost more than it saves.
pub fn check_deadlock(world: &World, settings: &Settings, tick: u32, creep: &CreepData, memory: &mut CreepMemory) {
    let destination = match memory.destination {
        Some(destination) => destination,
        None => return,
    };

    if let Some(pos) = destination.pos(world) {
        if let Some(range) = creep.pos.range_to(pos) {
            if memory.best_approach_range.map(|best| range < best).unwrap_or(true) {
                memory.best_approach_range = Some(range);
                memory.time_approached_destination = Some(tick);
            }
        }
    }

    let reference = [
        memory.time_approached_destination,
        memory.last_ok_action_time,
        memory.destination_set_time,
    ]
    .into_iter()
    .flatten()
    .max();

    let reference = match reference {
        Some(reference) => reference,
        None => return,
    };

    if tick.saturating_sub(reference) > settings.deadlock_timeout {
        debug!("{}: no progress since {}, abandoning {:?}", creep.name, reference, destination);

        if let Some(id) = destination.raw_id() {
            memory.block_target(id, settings.blacklist_capacity);
        }

        memory.reset_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::data::Role;

    fn room() -> RoomName {
        RoomName::new(0, 0)
    }

    fn fixture() -> (World, Settings) {
        let mut world = World::new();
        world.add_room(room());
        (world, Settings::default())
    }

    #[test]
    fn mismatched_action_and_target_is_reported_not_fatal() {
        let (mut world, _) = fixture();
        world.add_creep("x", Position::new(room(), 5, 5), vec![Part::Move], true);
        let source = world.add_source(Position::new(room(), 6, 6), 100, 3000);

        let code = act(&mut world, "x", Task::new(TaskAction::Transfer, TaskTarget::Source(source)));

        assert_eq!(code, ReturnCode::InvalidArgs);
    }

    #[test]
    fn invalid_target_outcome_blacklists_and_clears() {
        let (mut world, settings) = fixture();
        world.add_creep("x", Position::new(room(), 5, 5), vec![Part::Move], true);
        let resource = world.add_dropped_resource(Position::new(room(), 6, 6), 50);
        let task = Task::new(TaskAction::Pickup, TaskTarget::Resource(resource));

        let mut memory = CreepMemory::with_role(Role::Carrier);
        memory.set_task(task, 1);

        let mut others = HashMap::new();
        let mut rooms = HashMap::new();

        let disposition = handle_outcome(
            &mut world,
            &settings,
            1,
            "x",
            task,
            ReturnCode::InvalidTarget,
            &mut memory,
            &mut others,
            &mut rooms,
        );

        assert_eq!(disposition, Disposition::Done);
        assert!(memory.destination.is_none());
        assert!(memory.action.is_none());
        assert!(memory.is_blocked(resource.raw()));
    }

    #[test]
    fn full_outcome_requests_immediate_replan() {
        let (mut world, settings) = fixture();
        world.add_creep("x", Position::new(room(), 5, 5), vec![Part::Carry, Part::Move], true);
        let resource = world.add_dropped_resource(Position::new(room(), 6, 6), 50);
        let task = Task::new(TaskAction::Pickup, TaskTarget::Resource(resource));

        let mut memory = CreepMemory::with_role(Role::Carrier);
        memory.set_task(task, 1);

        let disposition = handle_outcome(
            &mut world,
            &settings,
            1,
            "x",
            task,
            ReturnCode::Full,
            &mut memory,
            &mut HashMap::new(),
            &mut HashMap::new(),
        );

        assert_eq!(disposition, Disposition::Replan);
        assert!(memory.destination.is_none());
    }

    #[test]
    fn spawn_fill_success_is_recorded_in_fill_order() {
        let (mut world, settings) = fixture();
        world.add_creep("x", Position::new(room(), 5, 5), vec![Part::Carry, Part::Move], true);
        let spawn = world.add_structure(Position::new(room(), 5, 6), StructureKind::Spawn, true);
        let task = Task::new(TaskAction::Transfer, TaskTarget::Structure(spawn));

        let mut memory = CreepMemory::with_role(Role::Carrier);
        memory.set_task(task, 3);

        let mut rooms = HashMap::new();

        handle_outcome(
            &mut world,
            &settings,
            3,
            "x",
            task,
            ReturnCode::Ok,
            &mut memory,
            &mut HashMap::new(),
            &mut rooms,
        );

        assert_eq!(rooms.get(&room()).unwrap().fill_order, vec![spawn]);
        assert_eq!(memory.last_ok_action_time, Some(3));
    }

    #[test]
    fn stalled_creep_is_abandoned_after_timeout() {
        let (world, settings) = fixture();
        let mut world = world;
        world.add_creep("x", Position::new(room(), 5, 5), vec![Part::Move], true);
        let resource = world.add_dropped_resource(Position::new(room(), 40, 40), 500);

        let mut memory = CreepMemory::with_role(Role::Carrier);
        memory.set_task(Task::new(TaskAction::Pickup, TaskTarget::Resource(resource)), 0);

        let creep = world.get_creep("x").unwrap().clone();

        // First scan establishes the baseline approach.
        check_deadlock(&world, &settings, 0, &creep, &mut memory);
        assert!(memory.destination.is_some());

        // No movement, no success, past the timeout: plan dropped, target
        // blacklisted.
        let late = settings.deadlock_timeout + 1;
        check_deadlock(&world, &settings, late, &creep, &mut memory);

        assert!(memory.destination.is_none());
        assert!(memory.is_blocked(resource.raw()));
    }

    #[test]
    fn approaching_creep_is_not_abandoned() {
        let (world, settings) = fixture();
        let mut world = world;
        world.add_creep("x", Position::new(room(), 5, 5), vec![Part::Move], true);
        let resource = world.add_dropped_resource(Position::new(room(), 40, 40), 500);

        let mut memory = CreepMemory::with_role(Role::Carrier);
        memory.set_task(Task::new(TaskAction::Pickup, TaskTarget::Resource(resource)), 0);

        check_deadlock(&world, &settings, 0, &world.get_creep("x").unwrap().clone(), &mut memory);

        // The creep edges closer right before the deadline; progress resets
        // the clock.
        let almost = settings.deadlock_timeout;
        world.creep_move_to("x", Position::new(room(), 40, 40));
        check_deadlock(&world, &settings, almost, &world.get_creep("x").unwrap().clone(), &mut memory);
        assert!(memory.destination.is_some());

        check_deadlock(
            &world,
            &settings,
            almost + settings.deadlock_timeout,
            &world.get_creep("x").unwrap().clone(),
            &mut memory,
        );
        assert!(memory.destination.is_some());
    }
}
