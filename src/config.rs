use serde::{Deserialize, Serialize};

/// Tunable policy constants. The defaults are the empirically tuned values;
/// hosts that want different behavior deserialize their own copy rather than
/// patching call sites.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ticks without progress toward a destination (and without a successful
    /// action) before the plan is forcibly abandoned and the target
    /// blacklisted.
    pub deadlock_timeout: u32,
    /// Fraction of a creep's carry capacity below which an energy pickup is
    /// not worth the trip.
    pub min_transfer_fraction: f32,
    /// How many recently failed target ids a creep remembers.
    pub blacklist_capacity: usize,
    /// Search range for opportunistic in-place repair tasks.
    pub repair_range: u32,
    /// Search range for opportunistic in-place build tasks.
    pub build_range: u32,
    /// Controller downgrade margin, in ticks. Below this the controller is
    /// treated as an urgent delivery/upgrade target.
    pub downgrade_margin: u32,
    /// Hits fraction below which a structure is considered a repair target.
    pub repair_threshold: f32,
    /// Energy a tower keeps in reserve for defense; repair only runs above it.
    pub tower_repair_floor: u32,
    /// Links with at least this much energy push downstream.
    pub link_send_threshold: u32,
    /// Hauling demand (dropped + containerized energy) below this floor never
    /// justifies another carrier.
    pub hauling_demand_floor: u32,
    /// Distance, in ticks, between the two demand samples compared when
    /// deciding whether demand is rising.
    pub demand_trend_window: u32,
    /// Maximum range from spawn to a known first-task position for that spawn
    /// to be eligible.
    pub max_spawn_range: u32,
    /// Remaining lifetime at which a dedicated harvester is considered due
    /// for replacement.
    pub harvester_replace_margin: u32,
    /// Ticks between expensive room-maintenance passes (construction
    /// placement, traffic scoring).
    pub maintenance_interval: u32,
    /// Movement samples required on a tile before it is proposed as a road.
    pub road_traffic_threshold: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            deadlock_timeout: 25,
            min_transfer_fraction: 0.25,
            blacklist_capacity: 2,
            repair_range: 3,
            build_range: 3,
            downgrade_margin: 4000,
            repair_threshold: 0.75,
            tower_repair_floor: 500,
            link_send_threshold: 400,
            hauling_demand_floor: 200,
            demand_trend_window: 100,
            max_spawn_range: 25,
            harvester_replace_margin: 100,
            maintenance_interval: 20,
            road_traffic_threshold: 50,
        }
    }
}

impl Settings {
    /// Minimum worthwhile pickup for a creep with the given carry capacity.
    pub fn min_transfer_amount(&self, capacity: u32) -> u32 {
        ((capacity as f32) * self.min_transfer_fraction).floor() as u32
    }
}
