use crate::config::Settings;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::jobs::continuity::resolve_destination;
use crate::jobs::data::find_task;
use crate::jobs::executor::*;
use crate::memorysystem::GameMemory;
use crate::transfer::EnergyLedger;
use log::*;
use rand::rngs::StdRng;

/// Decide and act for one creep this tick: validate the remembered plan,
/// fall through the role's cascade when there is none, submit the action and
/// apply the outcome policy. At most one extra resolution happens in the same
/// tick, when an action bounces with full/empty.
pub fn run_creep(
    world: &mut World,
    memory: &mut GameMemory,
    ledger: &mut EnergyLedger,
    settings: &Settings,
    rng: &mut StdRng,
    name: &str,
) {
    let creep = match world.get_creep(name) {
        Some(creep) => creep.clone(),
        None => return,
    };

    let tick = world.time();
    let mut creep_memory = memory.creeps.remove(name).unwrap_or_default();

    // A promised delivery only holds while the deliverer is still alive and
    // still headed here.
    if let Some(deliverer) = creep_memory.awaiting_delivery_from.clone() {
        let en_route = memory
            .creeps
            .get(&deliverer)
            .map(|m| m.destination == Some(TaskTarget::Creep(creep.id)))
            .unwrap_or(false);

        if !en_route {
            creep_memory.awaiting_delivery_from = None;
        }
    }

    check_deadlock(world, settings, tick, &creep, &mut creep_memory);

    if creep_memory.has_task() && resolve_destination(world, &creep, &creep_memory).is_none() {
        creep_memory.reset_task();
    }

    for _attempt in 0..2 {
        if !creep_memory.has_task() {
            let found = {
                let mut ctx = FindContext {
                    world,
                    settings,
                    rooms: &memory.rooms,
                    creep_memories: &memory.creeps,
                    creep: &creep,
                    memory: &mut creep_memory,
                    ledger: &mut *ledger,
                    rng: &mut *rng,
                    tick,
                };

                find_task(&mut ctx)
            };

            match found {
                Some(task) => {
                    creep_memory.set_task(task, tick);
                    memory.global.counters.tasks_resolved += 1;

                    // Committing to feed another creep marks the receiver, so
                    // no second carrier picks it and the receiver stays put.
                    if task.action == TaskAction::Transfer {
                        if let TaskTarget::Creep(id) = task.target {
                            if let Some(receiver) = world.get_creep_by_id(id) {
                                if let Some(receiver_memory) = memory.creeps.get_mut(&receiver.name) {
                                    receiver_memory.awaiting_delivery_from = Some(name.to_string());
                                }
                            }
                        }
                    }
                }
                None => {
                    // Planning exhausted: the creep idles this tick.
                    debug!("{}: no task found", name);
                    break;
                }
            }
        }

        let task = match creep_memory.task() {
            Some(task) => task,
            None => {
                // Half-formed plan in memory; treat as no plan at all.
                creep_memory.reset_task();
                break;
            }
        };

        let code = act(world, name, task);

        if code != ReturnCode::Ok {
            memory.global.counters.actions_failed += 1;
        }

        let disposition = handle_outcome(
            world,
            settings,
            tick,
            name,
            task,
            code,
            &mut creep_memory,
            &mut memory.creeps,
            &mut memory.rooms,
        );

        if disposition != Disposition::Replan {
            break;
        }
    }

    // Record the state the next tick's continuity check compares against.
    if let Some(creep) = world.get_creep(name) {
        creep_memory.was_empty = creep.store.is_empty();
        creep_memory.was_full = creep.store.is_full();
        creep_memory.last_room = Some(creep.pos.room);
    }

    memory.creeps.insert(name.to_string(), creep_memory);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::data::Role;
    use crate::memorysystem::CreepMemory;
    use rand::SeedableRng;

    fn room() -> RoomName {
        RoomName::new(0, 0)
    }

    fn setup() -> (World, GameMemory, Settings, StdRng) {
        let mut world = World::new();
        world.add_room(room());

        (world, GameMemory::default(), Settings::default(), StdRng::seed_from_u64(1))
    }

    fn run(world: &mut World, memory: &mut GameMemory, settings: &Settings, rng: &mut StdRng, name: &str) {
        let mut ledger = EnergyLedger::build(world);
        run_creep(world, memory, &mut ledger, settings, rng, name);
    }

    #[test]
    fn task_invariant_holds_after_a_cycle() {
        let (mut world, mut memory, settings, mut rng) = setup();
        world.add_creep("c-1", Position::new(room(), 10, 10), vec![Part::Carry, Part::Move], true);
        world.add_dropped_resource(Position::new(room(), 20, 20), 500);
        memory.creeps.insert("c-1".to_string(), CreepMemory::with_role(Role::Carrier));

        run(&mut world, &mut memory, &settings, &mut rng, "c-1");

        let record = &memory.creeps["c-1"];
        assert_eq!(record.destination.is_none(), record.action.is_none());
    }

    #[test]
    fn full_carrier_next_to_damaged_owned_structure_repairs_first() {
        // Scenario: a full generalist beside a damaged owned structure must
        // choose repair over build or upgrade.
        let (mut world, mut memory, settings, mut rng) = setup();

        world.add_creep(
            "w-1",
            Position::new(room(), 10, 10),
            vec![Part::Work, Part::Carry, Part::Move],
            true,
        );
        let creep_store_full = world.get_creep("w-1").unwrap().store.capacity();
        world.set_creep_energy("w-1", creep_store_full);

        let tower = world.add_structure(Position::new(room(), 12, 10), StructureKind::Tower, true);
        world.set_structure_hits(tower.raw(), 100);

        world.add_construction_site(Position::new(room(), 11, 10), StructureKind::Road);
        world.add_controller(Position::new(room(), 13, 13), true);

        let mut record = CreepMemory::with_role(Role::Worker);
        record.was_full = true;
        memory.creeps.insert("w-1".to_string(), record);

        run(&mut world, &mut memory, &settings, &mut rng, "w-1");

        let record = &memory.creeps["w-1"];
        assert_eq!(record.action, Some(TaskAction::Repair));
        assert_eq!(record.destination, Some(TaskTarget::Structure(tower)));
    }

    #[test]
    fn two_creeps_do_not_race_one_marginal_container() {
        // Scenario: the second creep resolved in the same tick must not
        // target the container the first one just claimed dry.
        let (mut world, mut memory, settings, mut rng) = setup();

        let container = world.add_structure(Position::new(room(), 25, 25), StructureKind::Container, false);

        for name in ["c-1", "c-2"] {
            world.add_creep(
                name,
                Position::new(room(), 10, 10),
                vec![Part::Carry, Part::Carry, Part::Carry, Part::Carry, Part::Move],
                true,
            );
            let mut record = CreepMemory::with_role(Role::Carrier);
            record.was_empty = true;
            memory.creeps.insert(name.to_string(), record);
        }

        // Exactly one minimum-transfer unit for a 200-capacity creep.
        let min = settings.min_transfer_amount(200);
        world.set_store_energy(container.raw(), min);

        let mut ledger = EnergyLedger::build(&world);
        run_creep(&mut world, &mut memory, &mut ledger, &settings, &mut rng, "c-1");
        run_creep(&mut world, &mut memory, &mut ledger, &settings, &mut rng, "c-2");

        let first = &memory.creeps["c-1"];
        let second = &memory.creeps["c-2"];

        assert_eq!(first.destination, Some(TaskTarget::Structure(container)));
        assert_ne!(second.destination, Some(TaskTarget::Structure(container)));
    }

    #[test]
    fn blacklisted_target_is_not_reselected() {
        // Scenario: after an invalid-target outcome for X, the next
        // resolution inside the blacklist window must avoid X even though it
        // is the closest candidate.
        let (mut world, mut memory, settings, mut rng) = setup();

        world.add_creep("c-1", Position::new(room(), 10, 10), vec![Part::Carry, Part::Move], true);

        let near = world.add_structure(Position::new(room(), 12, 10), StructureKind::Container, false);
        let far = world.add_structure(Position::new(room(), 30, 10), StructureKind::Container, false);
        world.set_store_energy(near.raw(), 500);
        world.set_store_energy(far.raw(), 500);

        let mut record = CreepMemory::with_role(Role::Carrier);
        record.was_empty = true;
        record.block_target(near.raw(), settings.blacklist_capacity);
        memory.creeps.insert("c-1".to_string(), record);

        run(&mut world, &mut memory, &settings, &mut rng, "c-1");

        let record = &memory.creeps["c-1"];
        assert_eq!(record.destination, Some(TaskTarget::Structure(far)));
    }

    #[test]
    fn carrier_feeds_a_waiting_upgrader_and_marks_it() {
        let (mut world, mut memory, settings, mut rng) = setup();

        // Upgrader is empty and parked by the controller; nothing structural
        // needs energy, so the carrier's delivery cascade falls through to
        // feeding it.
        let upgrader = world.add_creep(
            "u-1",
            Position::new(room(), 30, 30),
            vec![Part::Work, Part::Carry, Part::Move],
            true,
        );
        memory.creeps.insert("u-1".to_string(), CreepMemory::with_role(Role::Upgrader));

        world.add_creep("c-1", Position::new(room(), 10, 10), vec![Part::Carry, Part::Move], true);
        world.set_creep_energy("c-1", 50);
        let mut record = CreepMemory::with_role(Role::Carrier);
        record.was_full = true;
        memory.creeps.insert("c-1".to_string(), record);

        run(&mut world, &mut memory, &settings, &mut rng, "c-1");

        let carrier = &memory.creeps["c-1"];
        assert_eq!(carrier.action, Some(TaskAction::Transfer));
        assert_eq!(carrier.destination, Some(TaskTarget::Creep(upgrader)));
        assert_eq!(
            memory.creeps["u-1"].awaiting_delivery_from.as_deref(),
            Some("c-1")
        );
    }

    #[test]
    fn broken_delivery_promise_is_forgotten() {
        let (mut world, mut memory, settings, mut rng) = setup();

        world.add_creep("u-1", Position::new(room(), 30, 30), vec![Part::Work, Part::Carry, Part::Move], true);
        let mut record = CreepMemory::with_role(Role::Upgrader);
        // The promised carrier died; its memory record is gone.
        record.awaiting_delivery_from = Some("c-9".to_string());
        memory.creeps.insert("u-1".to_string(), record);

        run(&mut world, &mut memory, &settings, &mut rng, "u-1");

        assert!(memory.creeps["u-1"].awaiting_delivery_from.is_none());
    }

    #[test]
    fn arrived_position_plan_clears_on_next_cycle() {
        // Scenario: stored destination position equals the creep's position;
        // the next cycle clears destination and action together.
        let (mut world, mut memory, settings, mut rng) = setup();

        let pos = Position::new(room(), 10, 10);
        world.add_creep("s-1", pos, vec![Part::Move], true);

        let mut record = CreepMemory::with_role(Role::Explorer);
        record.set_task(Task::new(TaskAction::MoveTo, TaskTarget::Position(pos)), 0);
        // A creep with no carry parts reads as both empty and full.
        record.was_empty = true;
        record.was_full = true;
        record.last_room = Some(room());
        memory.creeps.insert("s-1".to_string(), record);

        run(&mut world, &mut memory, &settings, &mut rng, "s-1");

        let record = &memory.creeps["s-1"];
        assert_ne!(record.destination, Some(TaskTarget::Position(pos)));
        assert_eq!(record.last_destination, Some(TaskTarget::Position(pos)));
    }
}
