use crate::config::Settings;
use crate::game::*;
use crate::memorysystem::CreepMemory;
use crate::room::data::RoomMemory;
use crate::transfer::EnergyLedger;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// Everything a task finder may consult. The ledger is the only mutable piece
/// of shared state; finders that commit a creep to energy also adjust it so
/// the next creep planned this tick sees the corrected figures.
pub struct FindContext<'a> {
    pub world: &'a World,
    pub settings: &'a Settings,
    pub rooms: &'a HashMap<RoomName, RoomMemory>,
    /// Memory of every creep except the one being planned.
    pub creep_memories: &'a HashMap<String, CreepMemory>,
    pub creep: &'a CreepData,
    pub memory: &'a mut CreepMemory,
    pub ledger: &'a mut EnergyLedger,
    pub rng: &'a mut StdRng,
    pub tick: u32,
}

impl<'a> FindContext<'a> {
    pub fn room_memory(&self) -> Option<&RoomMemory> {
        self.rooms.get(&self.creep.pos.room)
    }

    pub fn is_empty(&self) -> bool {
        self.creep.store.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.creep.store.is_full()
    }

    /// Smallest pickup worth this creep's travel time.
    pub fn min_transfer(&self) -> u32 {
        self.settings.min_transfer_amount(self.creep.store.capacity()).max(1)
    }

    pub fn room_is_hostile(&self, room: RoomName) -> bool {
        self.rooms.get(&room).map(|m| m.hostiles_present).unwrap_or(false)
    }
}
