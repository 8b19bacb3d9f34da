use crate::config::Settings;
use crate::game::*;
use crate::jobs::data::Role;
use crate::memorysystem::{CreepMemory, GameMemory};
use itertools::Itertools;
use log::*;

pub const SPAWN_PRIORITY_CRITICAL: f32 = 100.0;
pub const SPAWN_PRIORITY_HIGH: f32 = 75.0;
pub const SPAWN_PRIORITY_MEDIUM: f32 = 50.0;
pub const SPAWN_PRIORITY_LOW: f32 = 25.0;

pub struct SpawnRequest {
    pub room: RoomName,
    pub body: Vec<Part>,
    pub priority: f32,
    /// The new creep's starting memory: role plus any pre-bound first task
    /// state (e.g. a harvester's source).
    pub memory: CreepMemory,
    /// Where the creep's first task will be, when known; used to pick the
    /// closest eligible spawn.
    pub target_pos: Option<Position>,
}

#[derive(Default)]
pub struct SpawnQueue {
    requests: Vec<SpawnRequest>,
}

impl SpawnQueue {
    pub fn request(&mut self, request: SpawnRequest) {
        self.requests.push(request);
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Queued-but-not-yet-spawned creeps of a role, so planners do not
    /// re-request a need already being met.
    pub fn pending_of_role(&self, role: Role) -> usize {
        self.requests.iter().filter(|r| r.memory.role == role).count()
    }

    pub fn pending_harvester_for(&self, source: ObjectId<SourceData>) -> bool {
        self.requests
            .iter()
            .any(|r| r.memory.role == Role::Harvester && r.memory.source_id == Some(source))
    }
}

fn generate_name(world: &World, tick: u32) -> String {
    let mut additional = 0;

    loop {
        let name = format!("{}-{}", tick, additional);

        if world.get_creep(&name).is_none() {
            return name;
        }

        additional += 1;
    }
}

/// Execute the queued spawn commands, highest priority first, at most one per
/// spawn point per tick. A rejected command is logged and dropped; the need
/// is re-derived from scratch next tick.
pub fn run_spawn_queue(world: &mut World, memory: &mut GameMemory, settings: &Settings, queue: &mut SpawnQueue) {
    let tick = world.time();
    let requests = std::mem::take(&mut queue.requests);

    let room_requests = requests.into_iter().map(|r| (r.room, r)).into_group_map();

    for (room, mut requests) in room_requests {
        let mut spawns: Vec<_> = world
            .my_spawns_in(room)
            .iter()
            .map(|s| (s.id, s.pos))
            .collect();

        requests.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));

        for request in requests {
            if spawns.is_empty() {
                break;
            }

            let cost = body_cost(&request.body);

            if cost > world.room_energy_available(room) {
                debug!("{}: not enough energy for a {:?} ({})", room, request.memory.role, cost);
                continue;
            }

            // Nearest eligible spawn to the first task when one is known and
            // in reach; any spawn otherwise.
            let index = match request.target_pos {
                Some(target) => spawns
                    .iter()
                    .positions(|(_, pos)| {
                        pos.range_to(target)
                            .map(|range| range <= settings.max_spawn_range)
                            .unwrap_or(true)
                    })
                    .min_by_key(|i| spawns[*i].1.range_to(target).unwrap_or(u32::MAX)),
                None => Some(0),
            };

            let index = match index {
                Some(index) => index,
                None => continue,
            };

            let (spawn, _) = spawns[index];
            let name = generate_name(world, tick);

            match world.spawn_creep(spawn, &request.body, &name) {
                ReturnCode::Ok => {
                    info!("{}: spawned {} as {:?}", room, name, request.memory.role);
                    memory.creeps.insert(name, request.memory);
                    memory.global.counters.spawns_issued += 1;
                    spawns.remove(index);
                }
                code => {
                    warn!("{}: spawn of {:?} rejected: {:?}", room, request.memory.role, code);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> RoomName {
        RoomName::new(0, 0)
    }

    fn request(role: Role, priority: f32, body: Vec<Part>) -> SpawnRequest {
        SpawnRequest {
            room: room(),
            body,
            priority,
            memory: CreepMemory::with_role(role),
            target_pos: None,
        }
    }

    #[test]
    fn higher_priority_requests_spawn_first() {
        let mut world = World::new();
        world.add_room(room());
        let spawn = world.add_structure(Position::new(room(), 25, 25), StructureKind::Spawn, true);
        world.set_store_energy(spawn.raw(), 300);

        let mut queue = SpawnQueue::default();
        queue.request(request(Role::Worker, SPAWN_PRIORITY_LOW, vec![Part::Work, Part::Carry, Part::Move]));
        queue.request(request(Role::Carrier, SPAWN_PRIORITY_CRITICAL, vec![Part::Carry, Part::Move]));

        let mut memory = GameMemory::default();
        run_spawn_queue(&mut world, &mut memory, &Settings::default(), &mut queue);

        // One spawn point: only the critical request goes through.
        assert_eq!(memory.global.counters.spawns_issued, 1);
        assert_eq!(memory.creeps.values().next().unwrap().role, Role::Carrier);
    }

    #[test]
    fn rejected_requests_do_not_retry_within_the_tick() {
        let mut world = World::new();
        world.add_room(room());
        let spawn = world.add_structure(Position::new(room(), 25, 25), StructureKind::Spawn, true);
        world.set_store_energy(spawn.raw(), 100);

        let mut queue = SpawnQueue::default();
        queue.request(request(Role::Worker, SPAWN_PRIORITY_HIGH, vec![Part::Work, Part::Carry, Part::Move]));

        let mut memory = GameMemory::default();
        run_spawn_queue(&mut world, &mut memory, &Settings::default(), &mut queue);

        assert_eq!(memory.global.counters.spawns_issued, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn generated_names_avoid_collisions() {
        let mut world = World::new();
        world.add_room(room());
        world.add_creep("7-0", Position::new(room(), 10, 10), vec![Part::Move], true);
        world.set_time(7);

        assert_eq!(generate_name(&world, 7), "7-1");
    }
}
