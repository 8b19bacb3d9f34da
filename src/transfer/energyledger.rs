use crate::game::*;
use crate::jobs::actions::TaskTarget;
use std::collections::HashMap;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LedgerKind {
    Dropped,
    Tombstone,
    Ruin,
    Container,
    Storage,
    Link,
    Source,
    Spawn,
    Extension,
    Tower,
}

/// One energy-bearing object as the planner sees it: live figures adjusted by
/// every commitment made earlier in the same tick.
#[derive(Clone, Debug)]
pub struct LedgerEntry {
    pub target: TaskTarget,
    pub kind: LedgerKind,
    pub pos: Position,
    pub my: bool,
    pub energy: u32,
    pub free_capacity: u32,
    energy_limit: u32,
    capacity_limit: u32,
}

impl LedgerEntry {
    fn new(target: TaskTarget, kind: LedgerKind, pos: Position, my: bool, energy: u32, free_capacity: u32) -> LedgerEntry {
        LedgerEntry {
            target,
            kind,
            pos,
            my,
            energy,
            free_capacity,
            energy_limit: energy,
            capacity_limit: free_capacity,
        }
    }
}

/// Tick-scoped projection of all energy sources and sinks.
///
/// Built once per tick from the world snapshot and then only mutated in
/// memory as tasks are assigned, so two creeps planned in the same tick can
/// never be routed to the same marginal energy. Single-owner, single-threaded
/// by design; correctness depends on strict in-order mutation.
#[derive(Default)]
pub struct EnergyLedger {
    entries: HashMap<RawId, LedgerEntry>,
}

impl EnergyLedger {
    /// Snapshot every room the world can currently see.
    pub fn build(world: &World) -> EnergyLedger {
        let mut entries = HashMap::new();

        for room in world.rooms() {
            for resource in world.dropped_in(room) {
                entries.insert(
                    resource.id.raw(),
                    LedgerEntry::new(
                        TaskTarget::Resource(resource.id),
                        LedgerKind::Dropped,
                        resource.pos,
                        false,
                        resource.amount,
                        0,
                    ),
                );
            }

            for tombstone in world.tombstones_in(room) {
                if tombstone.store.is_empty() {
                    continue;
                }

                entries.insert(
                    tombstone.id.raw(),
                    LedgerEntry::new(
                        TaskTarget::Tombstone(tombstone.id),
                        LedgerKind::Tombstone,
                        tombstone.pos,
                        false,
                        tombstone.store.energy(),
                        0,
                    ),
                );
            }

            for ruin in world.ruins_in(room) {
                if ruin.store.is_empty() {
                    continue;
                }

                entries.insert(
                    ruin.id.raw(),
                    LedgerEntry::new(
                        TaskTarget::Ruin(ruin.id),
                        LedgerKind::Ruin,
                        ruin.pos,
                        false,
                        ruin.store.energy(),
                        0,
                    ),
                );
            }

            for source in world.sources_in(room) {
                entries.insert(
                    source.id.raw(),
                    LedgerEntry::new(
                        TaskTarget::Source(source.id),
                        LedgerKind::Source,
                        source.pos,
                        false,
                        source.energy,
                        0,
                    ),
                );
            }

            for structure in world.structures_in(room) {
                let kind = match structure.kind {
                    StructureKind::Container => LedgerKind::Container,
                    StructureKind::Storage => LedgerKind::Storage,
                    StructureKind::Link => LedgerKind::Link,
                    StructureKind::Spawn => LedgerKind::Spawn,
                    StructureKind::Extension => LedgerKind::Extension,
                    StructureKind::Tower => LedgerKind::Tower,
                    _ => continue,
                };

                let store = match structure.store {
                    Some(store) => store,
                    None => continue,
                };

                entries.insert(
                    structure.id.raw(),
                    LedgerEntry::new(
                        TaskTarget::Structure(structure.id),
                        kind,
                        structure.pos,
                        structure.my,
                        store.energy(),
                        store.free_capacity(),
                    ),
                );
            }
        }

        EnergyLedger { entries }
    }

    pub fn get(&self, id: RawId) -> Option<&LedgerEntry> {
        self.entries.get(&id)
    }

    pub fn entries_in(&self, room: RoomName) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values().filter(move |entry| entry.pos.room == room)
    }

    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values()
    }

    /// Commit to withdrawing up to `amount`; returns what was actually still
    /// available. Never drives the entry negative.
    pub fn reserve_energy(&mut self, id: RawId, amount: u32) -> u32 {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                let granted = amount.min(entry.energy);
                entry.energy -= granted;
                granted
            }
            None => 0,
        }
    }

    /// Commit to delivering up to `amount`; returns the capacity actually
    /// still free.
    pub fn reserve_capacity(&mut self, id: RawId, amount: u32) -> u32 {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                let granted = amount.min(entry.free_capacity);
                entry.free_capacity -= granted;
                granted
            }
            None => 0,
        }
    }

    /// Walk back an abandoned withdrawal commitment. Clamped to the tick's
    /// starting figure.
    pub fn release_energy(&mut self, id: RawId, amount: u32) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.energy = (entry.energy + amount).min(entry.energy_limit);
        }
    }

    /// Walk back an abandoned delivery commitment.
    pub fn release_capacity(&mut self, id: RawId, amount: u32) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.free_capacity = (entry.free_capacity + amount).min(entry.capacity_limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> RoomName {
        RoomName::new(0, 0)
    }

    fn world_with_container(energy: u32) -> (World, RawId) {
        let mut world = World::new();
        world.add_room(room());

        let id = world.add_structure(Position::new(room(), 10, 10), StructureKind::Container, false);
        world.set_store_energy(id.raw(), energy);

        (world, id.raw())
    }

    #[test]
    fn reservations_clamp_at_zero() {
        let (world, id) = world_with_container(80);
        let mut ledger = EnergyLedger::build(&world);

        assert_eq!(ledger.reserve_energy(id, 50), 50);
        assert_eq!(ledger.reserve_energy(id, 50), 30);
        assert_eq!(ledger.reserve_energy(id, 50), 0);
        assert_eq!(ledger.get(id).unwrap().energy, 0);
    }

    #[test]
    fn release_never_exceeds_snapshot() {
        let (world, id) = world_with_container(80);
        let mut ledger = EnergyLedger::build(&world);

        ledger.reserve_energy(id, 30);
        ledger.release_energy(id, 1000);

        assert_eq!(ledger.get(id).unwrap().energy, 80);
    }

    #[test]
    fn capacity_reservations_clamp_independently() {
        let (world, id) = world_with_container(80);
        let mut ledger = EnergyLedger::build(&world);

        let free = ledger.get(id).unwrap().free_capacity;

        assert_eq!(ledger.reserve_capacity(id, free + 100), free);
        assert_eq!(ledger.get(id).unwrap().free_capacity, 0);

        ledger.release_capacity(id, free + 100);
        assert_eq!(ledger.get(id).unwrap().free_capacity, free);
    }

    #[test]
    fn snapshot_skips_empty_tombstones() {
        let mut world = World::new();
        world.add_room(room());
        world.add_tombstone(Position::new(room(), 4, 4), Store::empty(100));
        let full = world.add_tombstone(Position::new(room(), 5, 5), Store::new(60, 100));

        let ledger = EnergyLedger::build(&world);

        assert!(ledger.get(full.raw()).is_some());
        assert_eq!(ledger.entries_in(room()).count(), 1);
    }
}
