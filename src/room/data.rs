use crate::game::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct DemandSample {
    pub tick: u32,
    pub amount: u32,
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct ThreatSample {
    pub tick: u32,
    pub level: i32,
}

/// Cached, room-scoped derived facts. Everything here is recomputed on
/// structural change (new construction, hostiles appearing or leaving), not
/// every tick; a lost or stale cache only costs a recomputation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomMemory {
    /// Standing spots for upgraders: near, but never on, the controller.
    pub upgrade_spots: Vec<Position>,
    /// Obstacle-free tiles adjacent to each source.
    pub harvest_spots: HashMap<ObjectId<SourceData>, Vec<Position>>,
    pub repair_targets: Vec<ObjectId<StructureData>>,
    pub hostiles_present: bool,
    pub structure_count: u32,
    pub construction_count: u32,
    /// Spawns and extensions in the order they were last filled; refills
    /// follow it first-filled-first-used.
    pub fill_order: Vec<ObjectId<StructureData>>,
    /// Movement counters per packed tile coordinate, feeding road placement.
    pub traffic: HashMap<u16, u32>,
    pub demand_samples: Vec<DemandSample>,
    pub threat_samples: Vec<ThreatSample>,
    /// Tick the geometry caches were computed, absent when invalidated.
    pub cache_tick: Option<u32>,
}

impl RoomMemory {
    pub fn invalidate(&mut self) {
        self.cache_tick = None;
    }

    pub fn note_filled(&mut self, id: ObjectId<StructureData>) {
        self.fill_order.retain(|existing| *existing != id);
        self.fill_order.push(id);
    }

    pub fn note_traffic(&mut self, pos: Position) {
        *self.traffic.entry(pos.packed_xy()).or_insert(0) += 1;
    }

    pub fn push_demand_sample(&mut self, tick: u32, amount: u32, window: u32) {
        self.demand_samples.push(DemandSample { tick, amount });
        self.demand_samples.retain(|s| tick.saturating_sub(s.tick) <= window * 2);
    }

    pub fn push_threat_sample(&mut self, tick: u32, level: i32, window: u32) {
        self.threat_samples.push(ThreatSample { tick, level });
        self.threat_samples.retain(|s| tick.saturating_sub(s.tick) <= window * 2);
    }

    /// Two-sample demand trend: the stored value from at least `window` ticks
    /// ago and the latest one. A single instantaneous reading is too noisy to
    /// base spawn decisions on.
    pub fn demand_trend(&self, tick: u32, window: u32) -> Option<(u32, u32)> {
        let latest = self.demand_samples.last()?;
        let past = self
            .demand_samples
            .iter()
            .rev()
            .find(|s| tick.saturating_sub(s.tick) >= window)?;

        Some((past.amount, latest.amount))
    }

    pub fn threat_trend(&self, tick: u32, window: u32) -> Option<(i32, i32)> {
        let latest = self.threat_samples.last()?;
        let past = self
            .threat_samples
            .iter()
            .rev()
            .find(|s| tick.saturating_sub(s.tick) >= window)?;

        Some((past.level, latest.level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_order_moves_refilled_structures_to_the_back() {
        let mut memory = RoomMemory::default();
        let a = ObjectId::new(RawId::from_index(1));
        let b = ObjectId::new(RawId::from_index(2));

        memory.note_filled(a);
        memory.note_filled(b);
        memory.note_filled(a);

        assert_eq!(memory.fill_order, vec![b, a]);
    }

    #[test]
    fn demand_trend_compares_across_the_window() {
        let mut memory = RoomMemory::default();

        for tick in (0..=200).step_by(10) {
            memory.push_demand_sample(tick, tick * 2, 100);
        }

        let (past, latest) = memory.demand_trend(200, 100).unwrap();

        assert_eq!(latest, 400);
        assert!(past <= 200, "past sample must be at least a window old, got {}", past);
        assert!(past < latest);
    }

    #[test]
    fn trend_is_absent_without_an_old_enough_sample() {
        let mut memory = RoomMemory::default();
        memory.push_demand_sample(195, 100, 100);
        memory.push_demand_sample(200, 120, 100);

        assert!(memory.demand_trend(200, 100).is_none());
    }
}
