use crate::findnearest::*;
use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::context::FindContext;
use crate::transfer::*;
use rand::seq::IndexedRandom;

/// Which classes of energy holder a role may draw from.
#[derive(Copy, Clone, Debug)]
pub struct PickupSettings {
    pub allow_dropped: bool,
    pub allow_tombstone: bool,
    pub allow_ruin: bool,
    pub allow_container: bool,
    pub allow_storage: bool,
    pub allow_link: bool,
    pub allow_harvest: bool,
}

impl PickupSettings {
    /// Carriers: gather loose energy but never drain the buffers they fill.
    pub fn scavenge() -> PickupSettings {
        PickupSettings {
            allow_dropped: true,
            allow_tombstone: true,
            allow_ruin: true,
            allow_container: true,
            allow_storage: false,
            allow_link: false,
            allow_harvest: false,
        }
    }

    /// Workers and upgraders: any energy at all, mining as a last resort.
    pub fn consume() -> PickupSettings {
        PickupSettings {
            allow_dropped: true,
            allow_tombstone: true,
            allow_ruin: true,
            allow_container: true,
            allow_storage: true,
            allow_link: true,
            allow_harvest: true,
        }
    }

    fn allows(&self, entry: &LedgerEntry) -> bool {
        match entry.kind {
            LedgerKind::Dropped => self.allow_dropped,
            LedgerKind::Tombstone => self.allow_tombstone,
            LedgerKind::Ruin => self.allow_ruin,
            LedgerKind::Container => self.allow_container,
            LedgerKind::Storage => self.allow_storage && entry.my,
            LedgerKind::Link => self.allow_link && entry.my,
            LedgerKind::Source => self.allow_harvest,
            LedgerKind::Spawn | LedgerKind::Extension | LedgerKind::Tower => false,
        }
    }
}

fn pickup_action(kind: LedgerKind) -> TaskAction {
    match kind {
        LedgerKind::Dropped => TaskAction::Pickup,
        LedgerKind::Source => TaskAction::Harvest,
        _ => TaskAction::Withdraw,
    }
}

/// Find energy worth fetching, preferring the closest reachable holder in the
/// creep's own room. When only other rooms have any, pick uniformly at random
/// instead of pretending inter-room distance is known.
pub fn select_energy_pickup(ctx: &mut FindContext, settings: &PickupSettings) -> Option<Task> {
    if !ctx.is_empty() {
        return None;
    }

    let creep_pos = ctx.creep.pos;
    let free = ctx.creep.store.free_capacity();
    let min_amount = ctx.min_transfer();

    let viable = |entry: &&LedgerEntry| -> bool {
        settings.allows(entry)
            && entry.energy >= min_amount
            && entry
                .target
                .raw_id()
                .map(|id| !ctx.memory.is_blocked(id))
                .unwrap_or(true)
    };

    let mut chosen = ctx
        .ledger
        .entries_in(creep_pos.room)
        .filter(|entry| viable(entry))
        .find_nearest_path_by(ctx.world, creep_pos, |entry| entry.pos)
        .map(|entry| (entry.target, entry.kind, entry.energy));

    if chosen.is_none() {
        let remote: Vec<_> = ctx
            .ledger
            .entries()
            .filter(|entry| entry.pos.room != creep_pos.room)
            .filter(|entry| !ctx.room_is_hostile(entry.pos.room))
            .filter(|entry| viable(entry))
            .map(|entry| (entry.target, entry.kind, entry.energy))
            .collect();

        chosen = remote.choose(ctx.rng).copied();
    }

    let (target, kind, energy) = chosen?;

    if let Some(id) = target.raw_id() {
        ctx.ledger.reserve_energy(id, free.min(energy));
    }

    Some(Task::new(pickup_action(kind), target))
}

/// Delivery tiers, most starved consumer class first.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DeliveryPriority {
    Tower,
    Buffer,
    Refill,
}

pub static ORDERED_DELIVERY_PRIORITIES: &[DeliveryPriority] =
    &[DeliveryPriority::Tower, DeliveryPriority::Buffer, DeliveryPriority::Refill];

/// A link counts as downstream when it sits next to the colony storage; those
/// are drained by transferers, not fed by carriers.
fn is_downstream_link(world: &World, entry: &LedgerEntry) -> bool {
    world
        .structures_in(entry.pos.room)
        .filter(|s| s.kind == StructureKind::Storage && s.my)
        .any(|s| entry.pos.in_range_to(s.pos, 2))
}

fn matches_priority(world: &World, entry: &LedgerEntry, priority: DeliveryPriority) -> bool {
    if !entry.my || entry.free_capacity == 0 {
        return false;
    }

    match priority {
        DeliveryPriority::Tower => entry.kind == LedgerKind::Tower,
        DeliveryPriority::Buffer => match entry.kind {
            LedgerKind::Storage => true,
            LedgerKind::Link => !is_downstream_link(world, entry),
            _ => false,
        },
        DeliveryPriority::Refill => matches!(entry.kind, LedgerKind::Spawn | LedgerKind::Extension),
    }
}

/// Spawns and extensions in the room's recorded fill order, first filled
/// first refilled. Entries that vanished, filled up, or got blacklisted are
/// skipped.
fn refill_from_fill_order(ctx: &FindContext) -> Option<(TaskTarget, u32)> {
    let order = &ctx.rooms.get(&ctx.creep.pos.room)?.fill_order;

    order.iter().find_map(|id| {
        let entry = ctx.ledger.get(id.raw())?;

        if matches!(entry.kind, LedgerKind::Spawn | LedgerKind::Extension)
            && entry.my
            && entry.free_capacity > 0
            && !ctx.memory.is_blocked(id.raw())
        {
            Some((entry.target, entry.free_capacity))
        } else {
            None
        }
    })
}

/// Find the highest-priority deficient consumer in the creep's room.
pub fn select_energy_delivery(ctx: &mut FindContext) -> Option<Task> {
    if ctx.is_empty() {
        return None;
    }

    let creep_pos = ctx.creep.pos;
    let carried = ctx.creep.store.energy();

    for priority in ORDERED_DELIVERY_PRIORITIES.iter() {
        let found = match priority {
            DeliveryPriority::Refill => refill_from_fill_order(ctx),
            _ => None,
        }
        .or_else(|| {
            ctx.ledger
                .entries_in(creep_pos.room)
                .filter(|entry| matches_priority(ctx.world, entry, *priority))
                .filter(|entry| {
                    entry
                        .target
                        .raw_id()
                        .map(|id| !ctx.memory.is_blocked(id))
                        .unwrap_or(true)
                })
                .find_nearest_path_by(ctx.world, creep_pos, |entry| entry.pos)
                .map(|entry| (entry.target, entry.free_capacity))
        });

        if let Some((target, free)) = found {
            if let Some(id) = target.raw_id() {
                ctx.ledger.reserve_capacity(id, carried.min(free));
            }

            return Some(Task::new(TaskAction::Transfer, target));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::jobs::data::Role;
    use crate::memorysystem::CreepMemory;
    use crate::room::data::RoomMemory;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn room() -> RoomName {
        RoomName::new(0, 0)
    }

    #[test]
    fn refill_follows_the_fill_order_before_distance() {
        let mut world = World::new();
        world.add_room(room());
        world.add_creep("c", Position::new(room(), 10, 10), vec![Part::Carry, Part::Move], true);
        world.set_creep_energy("c", 50);

        let near = world.add_structure(Position::new(room(), 12, 10), StructureKind::Extension, true);
        let far = world.add_structure(Position::new(room(), 30, 10), StructureKind::Extension, true);

        let mut room_memory = RoomMemory::default();
        room_memory.note_filled(far);
        room_memory.note_filled(near);

        let mut rooms = HashMap::new();
        rooms.insert(room(), room_memory);

        let creep = world.get_creep("c").unwrap().clone();
        let creep_memories = HashMap::new();
        let settings = Settings::default();
        let mut memory = CreepMemory::with_role(Role::Carrier);
        let mut ledger = EnergyLedger::build(&world);
        let mut rng = StdRng::seed_from_u64(3);

        let mut ctx = FindContext {
            world: &world,
            settings: &settings,
            rooms: &rooms,
            creep_memories: &creep_memories,
            creep: &creep,
            memory: &mut memory,
            ledger: &mut ledger,
            rng: &mut rng,
            tick: 0,
        };

        // The farther extension was filled first, so it is refilled first.
        let task = select_energy_delivery(&mut ctx).unwrap();
        assert_eq!(task.target, TaskTarget::Structure(far));
        assert_ne!(task.target, TaskTarget::Structure(near));
    }

    #[test]
    fn delivery_without_a_fill_order_takes_the_nearest_consumer() {
        let mut world = World::new();
        world.add_room(room());
        world.add_creep("c", Position::new(room(), 10, 10), vec![Part::Carry, Part::Move], true);
        world.set_creep_energy("c", 50);

        let near = world.add_structure(Position::new(room(), 12, 10), StructureKind::Extension, true);
        world.add_structure(Position::new(room(), 30, 10), StructureKind::Extension, true);

        let creep = world.get_creep("c").unwrap().clone();
        let rooms = HashMap::new();
        let creep_memories = HashMap::new();
        let settings = Settings::default();
        let mut memory = CreepMemory::with_role(Role::Carrier);
        let mut ledger = EnergyLedger::build(&world);
        let mut rng = StdRng::seed_from_u64(3);

        let mut ctx = FindContext {
            world: &world,
            settings: &settings,
            rooms: &rooms,
            creep_memories: &creep_memories,
            creep: &creep,
            memory: &mut memory,
            ledger: &mut ledger,
            rng: &mut rng,
            tick: 0,
        };

        let task = select_energy_delivery(&mut ctx).unwrap();
        assert_eq!(task.target, TaskTarget::Structure(near));
    }
}
