pub const ROOM_WIDTH: u8 = 50;
pub const ROOM_HEIGHT: u8 = 50;

pub const MAX_CREEP_SIZE: usize = 50;

pub const HARVEST_POWER: u32 = 2;
pub const BUILD_POWER: u32 = 5;
pub const REPAIR_POWER: u32 = 100;
pub const UPGRADE_POWER: u32 = 1;
pub const ATTACK_POWER: u32 = 30;
pub const HEAL_POWER: u32 = 12;

pub const CARRY_CAPACITY: u32 = 50;

pub const SPAWN_ENERGY_CAPACITY: u32 = 300;
pub const EXTENSION_ENERGY_CAPACITY: u32 = 50;
pub const TOWER_ENERGY_CAPACITY: u32 = 1000;
pub const LINK_ENERGY_CAPACITY: u32 = 800;
pub const CONTAINER_CAPACITY: u32 = 2000;
pub const STORAGE_CAPACITY: u32 = 1_000_000;

pub const TOWER_ATTACK_POWER: u32 = 600;
pub const TOWER_HEAL_POWER: u32 = 400;
pub const TOWER_REPAIR_POWER: u32 = 800;
pub const TOWER_RANGE: u32 = 50;

pub const CONTROLLER_RESERVE_TICKS: u32 = 1;
pub const CONTROLLER_RESERVE_MAX: u32 = 5000;

/// Fatigue removed per move part per tick.
pub const MOVE_FATIGUE_POWER: u32 = 2;

pub const CREEP_LIFE_TIME: u32 = 1500;

/// Construction sites a single room will tolerate before placement helpers
/// stop proposing more.
pub const MAX_CONSTRUCTION_SITES_PER_ROOM: usize = 10;
