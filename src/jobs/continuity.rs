use crate::game::*;
use crate::jobs::actions::*;
use crate::memorysystem::CreepMemory;

/// Decide whether the plan recorded in memory is still worth resuming.
///
/// Pure read: returns the destination to keep, or `None` when the plan is
/// stale. Actually clearing the fields is the caller's job, through
/// [`CreepMemory::reset_task`], so calling this twice in one tick is
/// idempotent.
pub fn resolve_destination(world: &World, creep: &CreepData, memory: &CreepMemory) -> Option<TaskTarget> {
    // The moment a creep fills or empties, its priorities change; whatever it
    // was doing is void.
    let empty = creep.store.is_empty();
    let full = creep.store.is_full();

    if empty != memory.was_empty || full != memory.was_full {
        return None;
    }

    let destination = memory.destination?;

    if !destination.exists(world) {
        return None;
    }

    let destination_pos = destination.pos(world)?;

    // Arrival completes a plain movement plan. Tasks that require continuing
    // presence (build, repair, harvest) keep their destination.
    if memory.action == Some(TaskAction::MoveTo) && creep.pos == destination_pos {
        return None;
    }

    // A repair target that healed up no longer needs us.
    if memory.action == Some(TaskAction::Repair) {
        if let TaskTarget::Structure(id) = destination {
            let still_damaged = world.get_structure(id).map(|s| s.needs_repair()).unwrap_or(false);

            if !still_damaged {
                return None;
            }
        }
    }

    // Crossing into the destination's room invalidates the plan: it was
    // chosen on inter-room guesswork, and intra-room distances are now
    // available.
    if let Some(last_room) = memory.last_room {
        if last_room != creep.pos.room && creep.pos.room == destination_pos.room {
            return None;
        }
    }

    Some(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::data::Role;

    fn room() -> RoomName {
        RoomName::new(0, 0)
    }

    fn worker_at(world: &mut World, pos: Position) -> String {
        world.add_creep("w-0", pos, vec![Part::Work, Part::Carry, Part::Move], true);
        "w-0".to_string()
    }

    fn memory_with_task(task: Task) -> CreepMemory {
        let mut memory = CreepMemory::with_role(Role::Worker);
        memory.set_task(task, 0);
        memory.was_empty = true;
        memory
    }

    #[test]
    fn stale_entity_clears_plan() {
        let mut world = World::new();
        world.add_room(room());
        let name = worker_at(&mut world, Position::new(room(), 10, 10));

        let resource = world.add_dropped_resource(Position::new(room(), 12, 12), 100);
        let memory = memory_with_task(Task::new(TaskAction::Pickup, TaskTarget::Resource(resource)));

        let creep = world.get_creep(&name).unwrap().clone();
        assert!(resolve_destination(&world, &creep, &memory).is_some());

        world.remove_object(resource.raw());
        assert!(resolve_destination(&world, &creep, &memory).is_none());
    }

    #[test]
    fn arrival_clears_move_but_not_repair() {
        let mut world = World::new();
        world.add_room(room());
        let pos = Position::new(room(), 10, 10);
        let name = worker_at(&mut world, pos);
        let creep = world.get_creep(&name).unwrap().clone();

        let move_memory = memory_with_task(Task::new(TaskAction::MoveTo, TaskTarget::Position(pos)));
        assert!(resolve_destination(&world, &creep, &move_memory).is_none());

        // Repair plans survive arrival while the target is still damaged.
        let road = world.add_structure(Position::new(room(), 10, 11), StructureKind::Road, false);
        world.set_structure_hits(road.raw(), 100);

        let repair_memory = memory_with_task(Task::new(TaskAction::Repair, TaskTarget::Structure(road)));
        assert!(resolve_destination(&world, &creep, &repair_memory).is_some());
    }

    #[test]
    fn healed_repair_target_clears_plan() {
        let mut world = World::new();
        world.add_room(room());
        let name = worker_at(&mut world, Position::new(room(), 10, 10));
        let road = world.add_structure(Position::new(room(), 12, 12), StructureKind::Road, false);

        let memory = memory_with_task(Task::new(TaskAction::Repair, TaskTarget::Structure(road)));
        let creep = world.get_creep(&name).unwrap().clone();

        // Road is at full hits, so the repair plan is stale.
        assert!(resolve_destination(&world, &creep, &memory).is_none());
    }

    #[test]
    fn fill_state_flip_clears_any_plan() {
        let mut world = World::new();
        world.add_room(room());
        let name = worker_at(&mut world, Position::new(room(), 10, 10));
        let resource = world.add_dropped_resource(Position::new(room(), 12, 12), 100);

        let mut memory = memory_with_task(Task::new(TaskAction::Pickup, TaskTarget::Resource(resource)));
        memory.was_empty = false; // memory thinks the creep had energy

        let creep = world.get_creep(&name).unwrap().clone();
        assert!(resolve_destination(&world, &creep, &memory).is_none());
    }

    #[test]
    fn resolution_is_idempotent_within_a_tick() {
        let mut world = World::new();
        world.add_room(room());
        let name = worker_at(&mut world, Position::new(room(), 10, 10));
        let resource = world.add_dropped_resource(Position::new(room(), 12, 12), 100);

        let memory = memory_with_task(Task::new(TaskAction::Pickup, TaskTarget::Resource(resource)));
        let creep = world.get_creep(&name).unwrap().clone();

        let first = resolve_destination(&world, &creep, &memory);
        let second = resolve_destination(&world, &creep, &memory);

        assert_eq!(first, second);
    }
}
