use crate::constants::*;
use crate::game::ids::*;
use crate::game::position::*;
use serde::{Deserialize, Serialize};

/// Status of a submitted action primitive. Mirrors the environment's fixed
/// enumeration; codes not handled specially by the outcome policy are treated
/// uniformly as "other failure".
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum ReturnCode {
    Ok,
    NotOwner,
    NoPath,
    NameExists,
    Busy,
    NotFound,
    NotEnoughResources,
    InvalidTarget,
    Full,
    NotInRange,
    InvalidArgs,
    Tired,
    NoBodypart,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Part {
    Move,
    Work,
    Carry,
    Attack,
    RangedAttack,
    Heal,
    Claim,
    Tough,
}

impl Part {
    pub fn cost(self) -> u32 {
        match self {
            Part::Move => 50,
            Part::Work => 100,
            Part::Carry => 50,
            Part::Attack => 80,
            Part::RangedAttack => 150,
            Part::Heal => 250,
            Part::Claim => 600,
            Part::Tough => 10,
        }
    }
}

pub fn body_cost(body: &[Part]) -> u32 {
    body.iter().map(|p| p.cost()).sum()
}

/// Single-resource store. The colony economy is energy-only.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Store {
    used: u32,
    capacity: u32,
}

impl Store {
    pub fn new(used: u32, capacity: u32) -> Store {
        Store {
            used: used.min(capacity),
            capacity,
        }
    }

    pub fn empty(capacity: u32) -> Store {
        Store { used: 0, capacity }
    }

    pub fn energy(&self) -> u32 {
        self.used
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn free_capacity(&self) -> u32 {
        self.capacity - self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    pub fn is_full(&self) -> bool {
        self.used == self.capacity
    }

    /// Add up to `amount`, returning how much actually fit.
    pub fn add(&mut self, amount: u32) -> u32 {
        let added = amount.min(self.free_capacity());
        self.used += added;
        added
    }

    /// Remove up to `amount`, returning how much was actually there.
    pub fn remove(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.used);
        self.used -= removed;
        removed
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum StructureKind {
    Spawn,
    Extension,
    Tower,
    Link,
    Storage,
    Container,
    Road,
    Wall,
    Rampart,
    Observer,
}

impl StructureKind {
    /// Creeps may stand on these.
    pub fn is_walkable(self) -> bool {
        matches!(self, StructureKind::Road | StructureKind::Container | StructureKind::Rampart)
    }

    pub fn default_store(self) -> Option<Store> {
        let capacity = match self {
            StructureKind::Spawn => SPAWN_ENERGY_CAPACITY,
            StructureKind::Extension => EXTENSION_ENERGY_CAPACITY,
            StructureKind::Tower => TOWER_ENERGY_CAPACITY,
            StructureKind::Link => LINK_ENERGY_CAPACITY,
            StructureKind::Storage => STORAGE_CAPACITY,
            StructureKind::Container => CONTAINER_CAPACITY,
            _ => return None,
        };

        Some(Store::empty(capacity))
    }

    pub fn default_hits(self) -> u32 {
        match self {
            StructureKind::Wall | StructureKind::Rampart => 100_000,
            StructureKind::Road => 5000,
            StructureKind::Container => 250_000,
            _ => 5000,
        }
    }

    pub fn build_cost(self) -> u32 {
        match self {
            StructureKind::Spawn => 15_000,
            StructureKind::Extension => 3000,
            StructureKind::Tower => 5000,
            StructureKind::Link => 5000,
            StructureKind::Storage => 30_000,
            StructureKind::Container => 5000,
            StructureKind::Road => 300,
            StructureKind::Wall => 1,
            StructureKind::Rampart => 1,
            StructureKind::Observer => 8000,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StructureData {
    pub id: ObjectId<StructureData>,
    pub pos: Position,
    pub kind: StructureKind,
    pub hits: u32,
    pub hits_max: u32,
    pub store: Option<Store>,
    pub my: bool,
}

impl StructureData {
    pub fn needs_repair(&self) -> bool {
        self.hits < self.hits_max
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reservation {
    pub username: String,
    pub ticks_to_end: u32,
}

#[derive(Clone, Debug)]
pub struct ControllerData {
    pub id: ObjectId<ControllerData>,
    pub pos: Position,
    pub my: bool,
    pub owner: Option<String>,
    pub level: u8,
    pub progress: u32,
    pub ticks_to_downgrade: u32,
    pub reservation: Option<Reservation>,
    /// Marked by the host (or by scouting) as worth reserving.
    pub reservable: bool,
}

#[derive(Clone, Debug)]
pub struct SourceData {
    pub id: ObjectId<SourceData>,
    pub pos: Position,
    pub energy: u32,
    pub energy_capacity: u32,
}

#[derive(Clone, Debug)]
pub struct DroppedResource {
    pub id: ObjectId<DroppedResource>,
    pub pos: Position,
    pub amount: u32,
}

#[derive(Clone, Debug)]
pub struct TombstoneData {
    pub id: ObjectId<TombstoneData>,
    pub pos: Position,
    pub store: Store,
}

#[derive(Clone, Debug)]
pub struct RuinData {
    pub id: ObjectId<RuinData>,
    pub pos: Position,
    pub store: Store,
}

#[derive(Clone, Debug)]
pub struct ConstructionSiteData {
    pub id: ObjectId<ConstructionSiteData>,
    pub pos: Position,
    pub kind: StructureKind,
    pub progress: u32,
    pub progress_total: u32,
    pub my: bool,
}

#[derive(Clone, Debug)]
pub struct CreepData {
    pub id: ObjectId<CreepData>,
    pub name: String,
    pub pos: Position,
    pub body: Vec<Part>,
    pub hits: u32,
    pub hits_max: u32,
    pub store: Store,
    pub fatigue: u32,
    pub ticks_to_live: u32,
    pub my: bool,
}

impl CreepData {
    pub fn count_parts(&self, part: Part) -> u32 {
        self.body.iter().filter(|p| **p == part).count() as u32
    }
}

/// Everything addressable by id in a world snapshot.
#[derive(Clone, Debug)]
pub enum GameObject {
    Source(SourceData),
    Structure(StructureData),
    Controller(ControllerData),
    Creep(CreepData),
    Resource(DroppedResource),
    Tombstone(TombstoneData),
    Ruin(RuinData),
    ConstructionSite(ConstructionSiteData),
}

impl GameObject {
    pub fn pos(&self) -> Position {
        match self {
            GameObject::Source(o) => o.pos,
            GameObject::Structure(o) => o.pos,
            GameObject::Controller(o) => o.pos,
            GameObject::Creep(o) => o.pos,
            GameObject::Resource(o) => o.pos,
            GameObject::Tombstone(o) => o.pos,
            GameObject::Ruin(o) => o.pos,
            GameObject::ConstructionSite(o) => o.pos,
        }
    }

    pub fn room(&self) -> RoomName {
        self.pos().room
    }
}
