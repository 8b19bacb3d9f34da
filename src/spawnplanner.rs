use crate::config::Settings;
use crate::creep::*;
use crate::game::*;
use crate::jobs::data::Role;
use crate::memorysystem::{CreepMemory, GameMemory};
use crate::spawnsystem::*;
use itertools::Itertools;
use log::*;
use rand::rngs::StdRng;

static INFANTRY_TEMPLATE: &[Part] = &[
    Part::Tough,
    Part::Tough,
    Part::Attack,
    Part::Attack,
    Part::Move,
    Part::Move,
    Part::Attack,
    Part::Move,
    Part::Attack,
    Part::Move,
];

/// Evaluate each owned room's unmet needs and enqueue at most one spawn
/// request per room. The cascade is strictly first-unmet-wins; everything
/// below the first hit waits for a later tick.
pub fn plan_spawns(world: &World, memory: &GameMemory, settings: &Settings, rng: &mut StdRng, queue: &mut SpawnQueue) {
    for room in world.my_rooms() {
        if world.my_spawns_in(room).is_empty() {
            continue;
        }

        if let Some(request) = plan_room(world, memory, settings, rng, room, queue) {
            queue.request(request);
        }
    }
}

fn live_of_role(memory: &GameMemory, role: Role) -> usize {
    memory.creeps.values().filter(|m| m.role == role).count()
}

/// Harvesters still counted against their source: alive and not about to
/// expire.
fn effective_harvesters(world: &World, memory: &GameMemory, settings: &Settings, source: ObjectId<SourceData>) -> usize {
    memory
        .creeps
        .iter()
        .filter(|(_, m)| m.role == Role::Harvester && m.source_id == Some(source))
        .filter(|(name, _)| {
            world
                .get_creep(name)
                .map(|c| c.ticks_to_live >= settings.harvester_replace_margin)
                .unwrap_or(false)
        })
        .count()
}

fn plan_room(
    world: &World,
    memory: &GameMemory,
    settings: &Settings,
    rng: &mut StdRng,
    room: RoomName,
    queue: &SpawnQueue,
) -> Option<SpawnRequest> {
    let tick = world.time();

    // Bootstrap on whatever is in the bank; once the economy runs, size
    // bodies against full capacity and let refills catch up.
    let economy_alive = live_of_role(memory, Role::Harvester) + live_of_role(memory, Role::Carrier) > 0;
    let maximum_energy = if economy_alive {
        world.room_energy_capacity(room)
    } else {
        world.room_energy_available(room)
    };

    // Every source gets a dedicated harvester before anything else.
    let sources = world
        .sources_in(room)
        .sorted_by_key(|s| s.pos.packed_xy())
        .collect_vec();

    for source in sources {
        if effective_harvesters(world, memory, settings, source.id) > 0 || queue.pending_harvester_for(source.id) {
            continue;
        }

        // A source the cache knows has no open adjacent tile cannot be
        // worked; skip it rather than spawn a creep with nowhere to stand.
        let unreachable = memory
            .rooms
            .get(&room)
            .and_then(|m| m.harvest_spots.get(&source.id))
            .map(|spots| spots.is_empty())
            .unwrap_or(false);

        if unreachable {
            continue;
        }

        let body = create_body(&SpawnBodyDefinition {
            maximum_energy,
            minimum_repeat: Some(1),
            maximum_repeat: Some(5),
            pre_body: &[Part::Carry, Part::Move],
            repeat_body: &[Part::Work],
            post_body: &[],
        })
        .ok()?;

        let mut creep_memory = CreepMemory::with_role(Role::Harvester);
        creep_memory.source_id = Some(source.id);

        return Some(SpawnRequest {
            room,
            body,
            priority: SPAWN_PRIORITY_CRITICAL,
            memory: creep_memory,
            target_pos: Some(source.pos),
        });
    }

    // A storage fed by a link needs its transferer.
    let linked_storage = world
        .structures_in(room)
        .filter(|s| s.kind == StructureKind::Storage && s.my)
        .find(|storage| {
            world
                .structures_in(room)
                .any(|s| s.kind == StructureKind::Link && s.my && s.pos.in_range_to(storage.pos, 2))
        })
        .map(|s| s.pos);

    if let Some(storage_pos) = linked_storage {
        if live_of_role(memory, Role::Transferer) == 0 && queue.pending_of_role(Role::Transferer) == 0 {
            let body = create_body(&SpawnBodyDefinition {
                maximum_energy,
                minimum_repeat: Some(2),
                maximum_repeat: Some(8),
                pre_body: &[Part::Move],
                repeat_body: &[Part::Carry],
                post_body: &[],
            })
            .ok()?;

            return Some(SpawnRequest {
                room,
                body,
                priority: SPAWN_PRIORITY_HIGH,
                memory: CreepMemory::with_role(Role::Transferer),
                target_pos: Some(storage_pos),
            });
        }
    }

    // Carriers are added on a rising hauling-demand trend, never on a single
    // noisy reading, and never below the floor.
    if queue.pending_of_role(Role::Carrier) == 0 {
        if let Some((past, latest)) = memory
            .rooms
            .get(&room)
            .and_then(|m| m.demand_trend(tick, settings.demand_trend_window))
        {
            if latest > past && latest > settings.hauling_demand_floor {
                let body = create_body(&SpawnBodyDefinition {
                    maximum_energy,
                    minimum_repeat: Some(1),
                    maximum_repeat: Some(10),
                    pre_body: &[],
                    repeat_body: &[Part::Carry, Part::Move],
                    post_body: &[],
                })
                .ok()?;

                return Some(SpawnRequest {
                    room,
                    body,
                    priority: SPAWN_PRIORITY_HIGH,
                    memory: CreepMemory::with_role(Role::Carrier),
                    target_pos: None,
                });
            }
        }
    }

    // Infantry on a rising threat the towers cannot absorb.
    if queue.pending_of_role(Role::Infantry) == 0 {
        if let Some((past, latest)) = memory
            .rooms
            .get(&room)
            .and_then(|m| m.threat_trend(tick, settings.demand_trend_window))
        {
            if latest > past && latest > 0 {
                match trim_body_randomly(INFANTRY_TEMPLATE, maximum_energy, rng) {
                    Ok(body) => {
                        return Some(SpawnRequest {
                            room,
                            body,
                            priority: SPAWN_PRIORITY_HIGH,
                            memory: CreepMemory::with_role(Role::Infantry),
                            target_pos: None,
                        });
                    }
                    Err(()) => {
                        debug!("{}: cannot afford a viable fighter", room);
                    }
                }
            }
        }
    }

    // One explorer for the whole colony, unless an observer does it for free.
    let has_observer = world
        .rooms()
        .any(|r| world.structures_in(r).any(|s| s.kind == StructureKind::Observer && s.my));

    if !has_observer && live_of_role(memory, Role::Explorer) == 0 && queue.pending_of_role(Role::Explorer) == 0 {
        return Some(SpawnRequest {
            room,
            body: vec![Part::Move],
            priority: SPAWN_PRIORITY_LOW,
            memory: CreepMemory::with_role(Role::Explorer),
            target_pos: None,
        });
    }

    // Reservers for controllers flagged worth holding.
    let reservable = world
        .rooms()
        .filter_map(|r| world.controller_in(r))
        .filter(|c| c.reservable && !c.my && c.owner.is_none() && c.reservation.is_none())
        .count();

    if reservable > live_of_role(memory, Role::Reserver) + queue.pending_of_role(Role::Reserver) {
        let body = create_body(&SpawnBodyDefinition {
            maximum_energy,
            minimum_repeat: Some(1),
            maximum_repeat: Some(2),
            pre_body: &[],
            repeat_body: &[Part::Claim, Part::Move],
            post_body: &[],
        })
        .ok()?;

        return Some(SpawnRequest {
            room,
            body,
            priority: SPAWN_PRIORITY_MEDIUM,
            memory: CreepMemory::with_role(Role::Reserver),
            target_pos: None,
        });
    }

    // Baseline working population once the dedicated needs are met.
    let worker_target = 2;
    if live_of_role(memory, Role::Worker) + queue.pending_of_role(Role::Worker) < worker_target {
        let body = create_body(&SpawnBodyDefinition {
            maximum_energy,
            minimum_repeat: Some(1),
            maximum_repeat: Some(8),
            pre_body: &[],
            repeat_body: &[Part::Work, Part::Carry, Part::Move],
            post_body: &[],
        })
        .ok()?;

        return Some(SpawnRequest {
            room,
            body,
            priority: SPAWN_PRIORITY_LOW,
            memory: CreepMemory::with_role(Role::Worker),
            target_pos: None,
        });
    }

    if live_of_role(memory, Role::Upgrader) + queue.pending_of_role(Role::Upgrader) < 1 {
        let body = create_body(&SpawnBodyDefinition {
            maximum_energy,
            minimum_repeat: Some(1),
            maximum_repeat: Some(6),
            pre_body: &[],
            repeat_body: &[Part::Work, Part::Carry, Part::Move],
            post_body: &[],
        })
        .ok()?;

        // Prefer a cached standing spot by the controller as the first-task
        // position; the controller tile itself is never walkable.
        let target_pos = memory
            .rooms
            .get(&room)
            .and_then(|m| m.upgrade_spots.first().copied())
            .or_else(|| world.controller_in(room).map(|c| c.pos));

        return Some(SpawnRequest {
            room,
            body,
            priority: SPAWN_PRIORITY_LOW,
            memory: CreepMemory::with_role(Role::Upgrader),
            target_pos,
        });
    }

    None
}
