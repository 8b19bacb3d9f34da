use crate::game::*;
use serde::{Deserialize, Serialize};

/// The verb half of a task.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum TaskAction {
    MoveTo,
    Harvest,
    Pickup,
    Withdraw,
    Transfer,
    Build,
    Repair,
    Upgrade,
    Reserve,
    Attack,
    Heal,
}

/// The destination half of a task. Persisted in creep memory and re-resolved
/// against the world snapshot every tick, so every variant is either a fixed
/// position or a typed id.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum TaskTarget {
    Position(Position),
    Source(ObjectId<SourceData>),
    Structure(ObjectId<StructureData>),
    Controller(ObjectId<ControllerData>),
    Creep(ObjectId<CreepData>),
    Resource(ObjectId<DroppedResource>),
    Tombstone(ObjectId<TombstoneData>),
    Ruin(ObjectId<RuinData>),
    ConstructionSite(ObjectId<ConstructionSiteData>),
}

impl TaskTarget {
    /// The untyped id, for blacklisting and ledger keys. Fixed positions have
    /// no identity.
    pub fn raw_id(&self) -> Option<RawId> {
        match self {
            TaskTarget::Position(_) => None,
            TaskTarget::Source(id) => Some(id.raw()),
            TaskTarget::Structure(id) => Some(id.raw()),
            TaskTarget::Controller(id) => Some(id.raw()),
            TaskTarget::Creep(id) => Some(id.raw()),
            TaskTarget::Resource(id) => Some(id.raw()),
            TaskTarget::Tombstone(id) => Some(id.raw()),
            TaskTarget::Ruin(id) => Some(id.raw()),
            TaskTarget::ConstructionSite(id) => Some(id.raw()),
        }
    }

    /// Current position of the destination, if it still exists.
    pub fn pos(&self, world: &World) -> Option<Position> {
        match self {
            TaskTarget::Position(pos) => Some(*pos),
            other => other.raw_id().and_then(|id| world.resolve(id)).map(|obj| obj.pos()),
        }
    }

    /// Whether the destination still resolves to an object of the recorded
    /// kind (positions always do).
    pub fn exists(&self, world: &World) -> bool {
        match self {
            TaskTarget::Position(_) => true,
            TaskTarget::Source(id) => world.get_source(*id).is_some(),
            TaskTarget::Structure(id) => world.get_structure(*id).is_some(),
            TaskTarget::Controller(id) => world.get_controller(*id).is_some(),
            TaskTarget::Creep(id) => world.get_creep_by_id(*id).is_some(),
            TaskTarget::Resource(id) => world.get_resource(*id).is_some(),
            TaskTarget::Tombstone(id) => world.get_tombstone(*id).is_some(),
            TaskTarget::Ruin(id) => world.get_ruin(*id).is_some(),
            TaskTarget::ConstructionSite(id) => world.get_construction_site(*id).is_some(),
        }
    }
}

/// One `{action, destination}` pair, the atomic unit of planning. Tasks are
/// transient; only the two fields survive in creep memory.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Task {
    pub action: TaskAction,
    pub target: TaskTarget,
}

impl Task {
    pub fn new(action: TaskAction, target: TaskTarget) -> Task {
        Task { action, target }
    }
}
