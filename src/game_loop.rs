use crate::config::Settings;
use crate::game::*;
use crate::jobs;
use crate::memorysystem::GameMemory;
use crate::room;
use crate::spawnplanner;
use crate::spawnsystem::{self, SpawnQueue};
use crate::structures;
use crate::transfer::EnergyLedger;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// One full colony tick.
///
/// The host owns the world snapshot and the persisted memory blob: decode the
/// blob, call this once, re-encode. Everything in here is synchronous and
/// sequential; the only shared mutable structure is the energy ledger, which
/// is built once and threaded through creep planning in processing order.
pub fn tick(world: &mut World, memory: &mut GameMemory, settings: &Settings) {
    let tick = world.time();

    memory.global.counters.reset();
    memory.cleanup_dead_creeps(world);

    if memory.global.username.is_none() {
        memory.global.username = Some(world.username().to_string());
    }

    let my_rooms = world.my_rooms();

    for room in &my_rooms {
        room::system::run_room(world, memory, settings, *room);
    }

    let mut ledger = EnergyLedger::build(world);

    // Seeded per tick: reproducible within the tick, varied across ticks.
    let mut rng = StdRng::seed_from_u64(tick as u64);

    for name in world.my_creep_names() {
        jobs::system::run_creep(world, memory, &mut ledger, settings, &mut rng, &name);
    }

    record_traffic(world, memory, &my_rooms);

    for room in &my_rooms {
        structures::tower::run_towers(world, memory, settings, *room);
        structures::link::run_links(world, settings, *room);
    }

    let mut queue = SpawnQueue::default();
    spawnplanner::plan_spawns(world, memory, settings, &mut rng, &mut queue);
    spawnsystem::run_spawn_queue(world, memory, settings, &mut queue);
}

/// Accumulate per-tile movement counters; road placement feeds on them.
fn record_traffic(world: &World, memory: &mut GameMemory, rooms: &[RoomName]) {
    for room in rooms {
        let positions: Vec<_> = world.creeps_in(*room).filter(|c| c.my).map(|c| c.pos).collect();

        let room_memory = memory.room_mut(*room);
        for pos in positions {
            room_memory.note_traffic(pos);
        }
    }
}
