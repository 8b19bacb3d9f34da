use crate::game::*;
use crate::jobs::actions::*;
use crate::jobs::data::Role;
use crate::room::data::RoomMemory;
use base64::prelude::*;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

/// Per-creep persisted state, the only thing that survives across ticks.
///
/// Every field is defaulted on read; a missing or garbled record degrades to
/// "no plan", never to a stuck creep.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreepMemory {
    pub role: Role,
    pub destination: Option<TaskTarget>,
    pub action: Option<TaskAction>,
    /// Previous plan, kept for diagnostics after a reset.
    pub last_destination: Option<TaskTarget>,
    pub last_action: Option<TaskAction>,
    pub last_action_outcome: Option<ReturnCode>,
    pub destination_set_time: Option<u32>,
    pub time_approached_destination: Option<u32>,
    pub last_ok_action_time: Option<u32>,
    pub last_move_time: Option<u32>,
    /// Closest range to the destination achieved so far, for progress
    /// detection.
    pub best_approach_range: Option<u32>,
    /// Recently failed target ids; bounded, oldest evicted first.
    pub last_blocked_ids: Vec<RawId>,
    pub was_empty: bool,
    pub was_full: bool,
    pub last_room: Option<RoomName>,
    /// Dedicated harvesters bind to one source for their whole life.
    pub source_id: Option<ObjectId<SourceData>>,
    /// Set while another creep has committed to delivering energy to this one.
    pub awaiting_delivery_from: Option<String>,
    /// Last tick this creep received energy from a transfer.
    pub last_delivery_time: Option<u32>,
}

impl CreepMemory {
    pub fn with_role(role: Role) -> CreepMemory {
        CreepMemory {
            role,
            ..CreepMemory::default()
        }
    }

    pub fn has_task(&self) -> bool {
        self.destination.is_some()
    }

    pub fn task(&self) -> Option<Task> {
        match (self.action, self.destination) {
            (Some(action), Some(target)) => Some(Task::new(action, target)),
            _ => None,
        }
    }

    /// Install a new plan. Destination and action are always written
    /// together; a half-set plan is not well-formed.
    pub fn set_task(&mut self, task: Task, tick: u32) {
        self.destination = Some(task.target);
        self.action = Some(task.action);
        self.destination_set_time = Some(tick);
        self.time_approached_destination = None;
        self.best_approach_range = None;
    }

    /// Drop the current plan, keeping the previous one around for
    /// diagnostics. This is the only way destination or action are cleared.
    pub fn reset_task(&mut self) {
        self.last_destination = self.destination.take();
        self.last_action = self.action.take();
        self.destination_set_time = None;
        self.time_approached_destination = None;
        self.best_approach_range = None;
    }

    pub fn block_target(&mut self, id: RawId, capacity: usize) {
        if capacity == 0 {
            return;
        }

        self.last_blocked_ids.retain(|blocked| *blocked != id);
        self.last_blocked_ids.push(id);

        while self.last_blocked_ids.len() > capacity {
            self.last_blocked_ids.remove(0);
        }
    }

    pub fn is_blocked(&self, id: RawId) -> bool {
        self.last_blocked_ids.contains(&id)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TickCounters {
    pub tasks_resolved: u32,
    pub actions_failed: u32,
    pub spawns_issued: u32,
}

impl TickCounters {
    pub fn reset(&mut self) {
        *self = TickCounters::default();
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalMemory {
    pub username: Option<String>,
    pub counters: TickCounters,
}

/// The whole persistent document: one global namespace, one per room, one per
/// creep. Loaded once at tick start, flushed once at tick end; nothing else
/// crosses the tick boundary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMemory {
    pub global: GlobalMemory,
    pub rooms: HashMap<RoomName, RoomMemory>,
    pub creeps: HashMap<String, CreepMemory>,
}

#[derive(Debug)]
pub enum MemoryError {
    Encode(bincode::Error),
    Compress(std::io::Error),
    Base64(base64::DecodeError),
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::Encode(e) => write!(f, "encode error: {}", e),
            MemoryError::Compress(e) => write!(f, "compression error: {}", e),
            MemoryError::Base64(e) => write!(f, "base64 error: {}", e),
        }
    }
}

impl std::error::Error for MemoryError {}

impl From<bincode::Error> for MemoryError {
    fn from(e: bincode::Error) -> Self {
        MemoryError::Encode(e)
    }
}

impl From<std::io::Error> for MemoryError {
    fn from(e: std::io::Error) -> Self {
        MemoryError::Compress(e)
    }
}

impl From<base64::DecodeError> for MemoryError {
    fn from(e: base64::DecodeError) -> Self {
        MemoryError::Base64(e)
    }
}

impl GameMemory {
    pub fn room_mut(&mut self, room: RoomName) -> &mut RoomMemory {
        self.rooms.entry(room).or_default()
    }

    pub fn creep_mut(&mut self, name: &str) -> &mut CreepMemory {
        self.creeps.entry(name.to_string()).or_default()
    }

    /// Compact persisted form: bincode, gzip, base64.
    pub fn encode(&self) -> Result<String, MemoryError> {
        let raw = bincode::serialize(self)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        let compressed = encoder.finish()?;

        Ok(BASE64_STANDARD.encode(compressed))
    }

    pub fn try_decode(data: &str) -> Result<GameMemory, MemoryError> {
        let compressed = BASE64_STANDARD.decode(data.trim())?;

        let mut raw = Vec::new();
        GzDecoder::new(&compressed[..]).read_to_end(&mut raw)?;

        Ok(bincode::deserialize(&raw)?)
    }

    /// Decode a persisted document, falling back to an empty one when the
    /// blob is missing or unreadable. Losing memory only costs replanning.
    pub fn decode(data: &str) -> GameMemory {
        if data.is_empty() {
            return GameMemory::default();
        }

        match GameMemory::try_decode(data) {
            Ok(memory) => memory,
            Err(err) => {
                warn!("discarding unreadable memory: {}", err);
                GameMemory::default()
            }
        }
    }

    /// Human-readable form for inspection.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(data: &str) -> Result<GameMemory, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Drop records for creeps that no longer exist.
    pub fn cleanup_dead_creeps(&mut self, world: &World) {
        self.creeps.retain(|name, _| {
            let alive = world.get_creep(name).is_some();

            if !alive {
                debug!("cleaning up memory of dead creep {}", name);
            }

            alive
        });
    }
}
