use crate::constants::*;
use crate::game::ids::*;
use crate::game::objects::*;
use crate::game::position::*;
use crate::game::terrain::*;
use log::warn;
use pathfinding::prelude::astar;
use std::collections::{BTreeMap, HashMap};

const CONTROLLER_DOWNGRADE_RESET: u32 = 20_000;
const TOWER_ACTION_COST: u32 = 10;

pub struct RoomState {
    pub name: RoomName,
    pub terrain: RoomTerrain,
    pub controller: Option<ObjectId<ControllerData>>,
}

/// One tick's world snapshot plus the action primitives that mutate it.
///
/// The decision engine only reads queries and submits actions; hosts (and
/// tests) populate the snapshot through the `add_*` builders. Carrying the
/// room and terrain types in-crate keeps planning runnable on native targets
/// without the game API.
pub struct World {
    tick: u32,
    username: String,
    next_id: u128,
    rooms: BTreeMap<RoomName, RoomState>,
    objects: HashMap<RawId, GameObject>,
    creeps_by_name: HashMap<String, RawId>,
}

impl Default for World {
    fn default() -> Self {
        World::new()
    }
}

impl World {
    pub fn new() -> World {
        World {
            tick: 0,
            username: "steward".to_string(),
            next_id: 1,
            rooms: BTreeMap::new(),
            objects: HashMap::new(),
            creeps_by_name: HashMap::new(),
        }
    }

    pub fn time(&self) -> u32 {
        self.tick
    }

    pub fn set_time(&mut self, tick: u32) {
        self.tick = tick;
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn allocate_id(&mut self) -> RawId {
        let id = RawId::from_index(self.next_id);
        self.next_id += 1;
        id
    }

    //
    // Snapshot construction
    //

    pub fn add_room(&mut self, name: RoomName) {
        self.add_room_with_terrain(name, RoomTerrain::open());
    }

    pub fn add_room_with_terrain(&mut self, name: RoomName, terrain: RoomTerrain) {
        self.rooms.insert(
            name,
            RoomState {
                name,
                terrain,
                controller: None,
            },
        );
    }

    pub fn add_source(&mut self, pos: Position, energy: u32, energy_capacity: u32) -> ObjectId<SourceData> {
        let id = ObjectId::new(self.allocate_id());

        self.objects.insert(
            id.raw(),
            GameObject::Source(SourceData {
                id,
                pos,
                energy,
                energy_capacity,
            }),
        );

        id
    }

    pub fn add_structure(&mut self, pos: Position, kind: StructureKind, my: bool) -> ObjectId<StructureData> {
        let id = ObjectId::new(self.allocate_id());
        let hits_max = kind.default_hits();

        self.objects.insert(
            id.raw(),
            GameObject::Structure(StructureData {
                id,
                pos,
                kind,
                hits: hits_max,
                hits_max,
                store: kind.default_store(),
                my,
            }),
        );

        id
    }

    pub fn add_controller(&mut self, pos: Position, my: bool) -> ObjectId<ControllerData> {
        let id = ObjectId::new(self.allocate_id());
        let owner = if my { Some(self.username.clone()) } else { None };

        self.objects.insert(
            id.raw(),
            GameObject::Controller(ControllerData {
                id,
                pos,
                my,
                owner,
                level: if my { 1 } else { 0 },
                progress: 0,
                ticks_to_downgrade: CONTROLLER_DOWNGRADE_RESET,
                reservation: None,
                reservable: false,
            }),
        );

        if let Some(room) = self.rooms.get_mut(&pos.room) {
            room.controller = Some(id);
        }

        id
    }

    pub fn add_creep(&mut self, name: &str, pos: Position, body: Vec<Part>, my: bool) -> ObjectId<CreepData> {
        let id = ObjectId::new(self.allocate_id());
        let hits_max = (body.len() as u32) * 100;

        self.objects.insert(
            id.raw(),
            GameObject::Creep(CreepData {
                id,
                name: name.to_string(),
                pos,
                store: Store::empty(body.iter().filter(|p| **p == Part::Carry).count() as u32 * CARRY_CAPACITY),
                body,
                hits: hits_max,
                hits_max,
                fatigue: 0,
                ticks_to_live: CREEP_LIFE_TIME,
                my,
            }),
        );
        self.creeps_by_name.insert(name.to_string(), id.raw());

        id
    }

    pub fn add_dropped_resource(&mut self, pos: Position, amount: u32) -> ObjectId<DroppedResource> {
        let id = ObjectId::new(self.allocate_id());

        self.objects
            .insert(id.raw(), GameObject::Resource(DroppedResource { id, pos, amount }));

        id
    }

    pub fn add_tombstone(&mut self, pos: Position, store: Store) -> ObjectId<TombstoneData> {
        let id = ObjectId::new(self.allocate_id());

        self.objects
            .insert(id.raw(), GameObject::Tombstone(TombstoneData { id, pos, store }));

        id
    }

    pub fn add_ruin(&mut self, pos: Position, store: Store) -> ObjectId<RuinData> {
        let id = ObjectId::new(self.allocate_id());

        self.objects.insert(id.raw(), GameObject::Ruin(RuinData { id, pos, store }));

        id
    }

    pub fn add_construction_site(&mut self, pos: Position, kind: StructureKind) -> ObjectId<ConstructionSiteData> {
        let id = ObjectId::new(self.allocate_id());

        self.objects.insert(
            id.raw(),
            GameObject::ConstructionSite(ConstructionSiteData {
                id,
                pos,
                kind,
                progress: 0,
                progress_total: kind.build_cost(),
                my: true,
            }),
        );

        id
    }

    pub fn remove_object(&mut self, id: RawId) {
        if let Some(GameObject::Creep(creep)) = self.objects.get(&id) {
            let name = creep.name.clone();
            self.creeps_by_name.remove(&name);
        }

        self.objects.remove(&id);
    }

    //
    // Queries
    //

    pub fn resolve(&self, id: RawId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn get_source(&self, id: ObjectId<SourceData>) -> Option<&SourceData> {
        match self.objects.get(&id.raw()) {
            Some(GameObject::Source(source)) => Some(source),
            _ => None,
        }
    }

    pub fn get_structure(&self, id: ObjectId<StructureData>) -> Option<&StructureData> {
        match self.objects.get(&id.raw()) {
            Some(GameObject::Structure(structure)) => Some(structure),
            _ => None,
        }
    }

    pub fn get_controller(&self, id: ObjectId<ControllerData>) -> Option<&ControllerData> {
        match self.objects.get(&id.raw()) {
            Some(GameObject::Controller(controller)) => Some(controller),
            _ => None,
        }
    }

    pub fn get_resource(&self, id: ObjectId<DroppedResource>) -> Option<&DroppedResource> {
        match self.objects.get(&id.raw()) {
            Some(GameObject::Resource(resource)) => Some(resource),
            _ => None,
        }
    }

    pub fn get_tombstone(&self, id: ObjectId<TombstoneData>) -> Option<&TombstoneData> {
        match self.objects.get(&id.raw()) {
            Some(GameObject::Tombstone(tombstone)) => Some(tombstone),
            _ => None,
        }
    }

    pub fn get_ruin(&self, id: ObjectId<RuinData>) -> Option<&RuinData> {
        match self.objects.get(&id.raw()) {
            Some(GameObject::Ruin(ruin)) => Some(ruin),
            _ => None,
        }
    }

    pub fn get_construction_site(&self, id: ObjectId<ConstructionSiteData>) -> Option<&ConstructionSiteData> {
        match self.objects.get(&id.raw()) {
            Some(GameObject::ConstructionSite(site)) => Some(site),
            _ => None,
        }
    }

    pub fn get_creep(&self, name: &str) -> Option<&CreepData> {
        let id = self.creeps_by_name.get(name)?;

        match self.objects.get(id) {
            Some(GameObject::Creep(creep)) => Some(creep),
            _ => None,
        }
    }

    pub fn get_creep_by_id(&self, id: ObjectId<CreepData>) -> Option<&CreepData> {
        match self.objects.get(&id.raw()) {
            Some(GameObject::Creep(creep)) => Some(creep),
            _ => None,
        }
    }

    fn creep_mut(&mut self, name: &str) -> Option<&mut CreepData> {
        let id = *self.creeps_by_name.get(name)?;

        match self.objects.get_mut(&id) {
            Some(GameObject::Creep(creep)) => Some(creep),
            _ => None,
        }
    }

    pub fn rooms(&self) -> impl Iterator<Item = RoomName> + '_ {
        self.rooms.keys().copied()
    }

    pub fn room_known(&self, name: RoomName) -> bool {
        self.rooms.contains_key(&name)
    }

    pub fn terrain(&self, room: RoomName) -> Option<&RoomTerrain> {
        self.rooms.get(&room).map(|r| &r.terrain)
    }

    pub fn controller_in(&self, room: RoomName) -> Option<&ControllerData> {
        let id = self.rooms.get(&room)?.controller?;
        self.get_controller(id)
    }

    /// Rooms whose controller is owned by this colony, in stable order.
    pub fn my_rooms(&self) -> Vec<RoomName> {
        self.rooms
            .keys()
            .copied()
            .filter(|room| self.controller_in(*room).map(|c| c.my).unwrap_or(false))
            .collect()
    }

    pub fn structures_in(&self, room: RoomName) -> impl Iterator<Item = &StructureData> {
        self.objects.values().filter_map(move |obj| match obj {
            GameObject::Structure(structure) if structure.pos.room == room => Some(structure),
            _ => None,
        })
    }

    pub fn sources_in(&self, room: RoomName) -> impl Iterator<Item = &SourceData> {
        self.objects.values().filter_map(move |obj| match obj {
            GameObject::Source(source) if source.pos.room == room => Some(source),
            _ => None,
        })
    }

    pub fn dropped_in(&self, room: RoomName) -> impl Iterator<Item = &DroppedResource> {
        self.objects.values().filter_map(move |obj| match obj {
            GameObject::Resource(resource) if resource.pos.room == room => Some(resource),
            _ => None,
        })
    }

    pub fn tombstones_in(&self, room: RoomName) -> impl Iterator<Item = &TombstoneData> {
        self.objects.values().filter_map(move |obj| match obj {
            GameObject::Tombstone(tombstone) if tombstone.pos.room == room => Some(tombstone),
            _ => None,
        })
    }

    pub fn ruins_in(&self, room: RoomName) -> impl Iterator<Item = &RuinData> {
        self.objects.values().filter_map(move |obj| match obj {
            GameObject::Ruin(ruin) if ruin.pos.room == room => Some(ruin),
            _ => None,
        })
    }

    pub fn construction_sites_in(&self, room: RoomName) -> impl Iterator<Item = &ConstructionSiteData> {
        self.objects.values().filter_map(move |obj| match obj {
            GameObject::ConstructionSite(site) if site.pos.room == room => Some(site),
            _ => None,
        })
    }

    pub fn creeps_in(&self, room: RoomName) -> impl Iterator<Item = &CreepData> {
        self.objects.values().filter_map(move |obj| match obj {
            GameObject::Creep(creep) if creep.pos.room == room => Some(creep),
            _ => None,
        })
    }

    pub fn hostile_creeps_in(&self, room: RoomName) -> impl Iterator<Item = &CreepData> {
        self.creeps_in(room).filter(|c| !c.my)
    }

    /// Names of all creeps this colony controls, sorted for stable per-tick
    /// processing order.
    pub fn my_creep_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .objects
            .values()
            .filter_map(|obj| match obj {
                GameObject::Creep(creep) if creep.my => Some(creep.name.clone()),
                _ => None,
            })
            .collect();

        names.sort();
        names
    }

    pub fn my_spawns_in(&self, room: RoomName) -> Vec<&StructureData> {
        self.structures_in(room)
            .filter(|s| s.kind == StructureKind::Spawn && s.my)
            .collect()
    }

    /// Energy currently available for spawning in a room (spawns plus
    /// extensions).
    pub fn room_energy_available(&self, room: RoomName) -> u32 {
        self.structures_in(room)
            .filter(|s| s.my && matches!(s.kind, StructureKind::Spawn | StructureKind::Extension))
            .filter_map(|s| s.store.as_ref())
            .map(|s| s.energy())
            .sum()
    }

    pub fn room_energy_capacity(&self, room: RoomName) -> u32 {
        self.structures_in(room)
            .filter(|s| s.my && matches!(s.kind, StructureKind::Spawn | StructureKind::Extension))
            .filter_map(|s| s.store.as_ref())
            .map(|s| s.capacity())
            .sum()
    }

    fn blocking_structure_at(&self, pos: Position) -> bool {
        self.structures_in(pos.room).any(|s| s.pos == pos && !s.kind.is_walkable())
    }

    fn creep_at(&self, pos: Position) -> bool {
        self.creeps_in(pos.room).any(|c| c.pos == pos)
    }

    /// Whether terrain and structures allow standing on a tile. Creeps are
    /// ignored, matching the path queries.
    pub fn is_walkable(&self, pos: Position) -> bool {
        let terrain = match self.terrain(pos.room) {
            Some(terrain) => terrain,
            None => return false,
        };

        !terrain.is_wall(pos.x(), pos.y()) && !self.blocking_structure_at(pos)
    }

    //
    // Pathing. Same-room only; inter-room distances are deliberately not
    // computed (callers fall back to uniform-random choice instead).
    //

    fn path_successors(&self, pos: Position) -> Vec<(Position, u32)> {
        let terrain = match self.terrain(pos.room) {
            Some(terrain) => terrain,
            None => return Vec::new(),
        };

        let mut result = Vec::with_capacity(8);

        for dx in -1i32..=1 {
            for dy in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let x = pos.x() as i32 + dx;
                let y = pos.y() as i32 + dy;

                if x < 0 || y < 0 || x >= ROOM_WIDTH as i32 || y >= ROOM_HEIGHT as i32 {
                    continue;
                }

                let step = Position::new(pos.room, x as u8, y as u8);

                if terrain.is_wall(step.x(), step.y()) || self.blocking_structure_at(step) {
                    continue;
                }

                let cost = if terrain.is_swamp(step.x(), step.y()) { 5 } else { 1 };

                result.push((step, cost));
            }
        }

        result
    }

    /// Length in steps of a path from `from` to within `range` of `to`, or
    /// `None` when unreachable or in a different room.
    pub fn path_len(&self, from: Position, to: Position, range: u32) -> Option<u32> {
        if from.room != to.room {
            return None;
        }

        let goal_range = if range == 0 && !self.is_walkable(to) { 1 } else { range };

        if from.in_range_to(to, goal_range) {
            return Some(0);
        }

        let (path, _) = astar(
            &from,
            |p| self.path_successors(*p),
            |p| p.range_to(to).unwrap_or(u32::MAX),
            |p| p.in_range_to(to, goal_range),
        )?;

        Some(path.len() as u32 - 1)
    }

    /// The next tile along a path toward `to`.
    pub fn next_step(&self, from: Position, to: Position, range: u32) -> Option<Position> {
        if from.room != to.room {
            return None;
        }

        let goal_range = if range == 0 && !self.is_walkable(to) { 1 } else { range };

        if from.in_range_to(to, goal_range) {
            return None;
        }

        let (path, _) = astar(
            &from,
            |p| self.path_successors(*p),
            |p| p.range_to(to).unwrap_or(u32::MAX),
            |p| p.in_range_to(to, goal_range),
        )?;

        path.get(1).copied()
    }

    //
    // Creep action primitives. Each is a single submission that either
    // commits or returns a failure code; none suspend.
    //

    pub fn creep_move_to(&mut self, name: &str, target: Position) -> ReturnCode {
        let (pos, fatigue, move_parts, other_parts) = match self.get_creep(name) {
            Some(creep) => (
                creep.pos,
                creep.fatigue,
                creep.count_parts(Part::Move),
                creep.body.len() as u32 - creep.count_parts(Part::Move),
            ),
            None => return ReturnCode::NotFound,
        };

        if fatigue > 0 {
            return ReturnCode::Tired;
        }

        if move_parts == 0 {
            return ReturnCode::NoBodypart;
        }

        let step = if pos.room == target.room {
            match self.next_step(pos, target, 0) {
                Some(step) => Some(step),
                None => {
                    if pos == target || pos.is_near_to(target) && !self.is_walkable(target) {
                        // Already there (or adjacent to an unwalkable goal).
                        return ReturnCode::Ok;
                    }

                    return ReturnCode::NoPath;
                }
            }
        } else {
            self.step_toward_room(pos, target.room)
        };

        let step = match step {
            Some(step) => step,
            None => return ReturnCode::NoPath,
        };

        // Another creep on the tile blocks the move; the submission itself
        // still succeeds, the creep just does not advance this tick.
        if step.room == pos.room && self.creep_at(step) {
            return ReturnCode::Ok;
        }

        let swamp = self
            .terrain(step.room)
            .map(|t| t.is_swamp(step.x(), step.y()))
            .unwrap_or(false);
        let factor = if swamp { 10 } else { 2 };
        let gained = (other_parts * factor).saturating_sub(move_parts * MOVE_FATIGUE_POWER);

        if let Some(creep) = self.creep_mut(name) {
            creep.pos = step;
            creep.fatigue = gained;
        }

        ReturnCode::Ok
    }

    /// One movement step toward an exit leading to `target_room`. Crossing an
    /// exit tile lands the creep just inside the next room.
    fn step_toward_room(&self, pos: Position, target_room: RoomName) -> Option<Position> {
        if !pos.room.is_neighbor(target_room) {
            // Multi-room travel is chained one neighbor at a time; pick the
            // neighbor that reduces the room-grid distance.
            let next = pos
                .room
                .neighbors()
                .into_iter()
                .min_by_key(|n| {
                    (n.x() as i32 - target_room.x() as i32).abs() + (n.y() as i32 - target_room.y() as i32).abs()
                })?;

            return self.step_toward_room(pos, next);
        }

        let dx = target_room.x() - pos.room.x();
        let dy = target_room.y() - pos.room.y();

        // At the matching edge already: cross over.
        if dx > 0 && pos.x() == ROOM_WIDTH - 1 {
            return Some(Position::new(target_room, 0, pos.y()));
        }
        if dx < 0 && pos.x() == 0 {
            return Some(Position::new(target_room, ROOM_WIDTH - 1, pos.y()));
        }
        if dy > 0 && pos.y() == ROOM_HEIGHT - 1 {
            return Some(Position::new(target_room, pos.x(), 0));
        }
        if dy < 0 && pos.y() == 0 {
            return Some(Position::new(target_room, pos.x(), ROOM_HEIGHT - 1));
        }

        let edge_target = if dx > 0 {
            Position::new(pos.room, ROOM_WIDTH - 1, pos.y())
        } else if dx < 0 {
            Position::new(pos.room, 0, pos.y())
        } else if dy > 0 {
            Position::new(pos.room, pos.x(), ROOM_HEIGHT - 1)
        } else {
            Position::new(pos.room, pos.x(), 0)
        };

        self.next_step(pos, edge_target, 0)
    }

    pub fn creep_harvest(&mut self, name: &str, source_id: ObjectId<SourceData>) -> ReturnCode {
        let (pos, work_parts) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.count_parts(Part::Work)),
            None => return ReturnCode::NotFound,
        };

        if work_parts == 0 {
            return ReturnCode::NoBodypart;
        }

        let (source_pos, source_energy) = match self.get_source(source_id) {
            Some(source) => (source.pos, source.energy),
            None => return ReturnCode::InvalidTarget,
        };

        if !pos.is_near_to(source_pos) {
            return ReturnCode::NotInRange;
        }

        if source_energy == 0 {
            return ReturnCode::NotEnoughResources;
        }

        let mined = (work_parts * HARVEST_POWER).min(source_energy);

        if let Some(GameObject::Source(source)) = self.objects.get_mut(&source_id.raw()) {
            source.energy -= mined;
        }

        let mut spill = 0;
        if let Some(creep) = self.creep_mut(name) {
            let added = creep.store.add(mined);
            spill = mined - added;
        }

        // Harvested energy that does not fit the store drops on the ground.
        if spill > 0 {
            self.add_dropped_resource(pos, spill);
        }

        ReturnCode::Ok
    }

    pub fn creep_pickup(&mut self, name: &str, resource_id: ObjectId<DroppedResource>) -> ReturnCode {
        let (pos, free) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.store.free_capacity()),
            None => return ReturnCode::NotFound,
        };

        let (resource_pos, amount) = match self.get_resource(resource_id) {
            Some(resource) => (resource.pos, resource.amount),
            None => return ReturnCode::InvalidTarget,
        };

        if !pos.is_near_to(resource_pos) {
            return ReturnCode::NotInRange;
        }

        if free == 0 {
            return ReturnCode::Full;
        }

        let taken = amount.min(free);

        if let Some(creep) = self.creep_mut(name) {
            creep.store.add(taken);
        }

        if taken == amount {
            self.remove_object(resource_id.raw());
        } else if let Some(GameObject::Resource(resource)) = self.objects.get_mut(&resource_id.raw()) {
            resource.amount -= taken;
        }

        ReturnCode::Ok
    }

    fn store_of(&self, id: RawId) -> Option<(Position, Store)> {
        match self.objects.get(&id)? {
            GameObject::Structure(s) => s.store.map(|store| (s.pos, store)),
            GameObject::Tombstone(t) => Some((t.pos, t.store)),
            GameObject::Ruin(r) => Some((r.pos, r.store)),
            GameObject::Creep(c) => Some((c.pos, c.store)),
            _ => None,
        }
    }

    fn store_mut(&mut self, id: RawId) -> Option<&mut Store> {
        match self.objects.get_mut(&id)? {
            GameObject::Structure(s) => s.store.as_mut(),
            GameObject::Tombstone(t) => Some(&mut t.store),
            GameObject::Ruin(r) => Some(&mut r.store),
            GameObject::Creep(c) => Some(&mut c.store),
            _ => None,
        }
    }

    /// Set a creep's carried energy, used when ingesting an upstream
    /// snapshot.
    pub fn set_creep_energy(&mut self, name: &str, energy: u32) {
        if let Some(creep) = self.creep_mut(name) {
            creep.store = Store::new(energy, creep.store.capacity());
        }
    }

    /// Set a structure's current hits, used when ingesting an upstream
    /// snapshot.
    pub fn set_structure_hits(&mut self, id: RawId, hits: u32) {
        if let Some(GameObject::Structure(structure)) = self.objects.get_mut(&id) {
            structure.hits = hits.min(structure.hits_max);
        }
    }

    /// Set the stored energy of any store-bearing object, used when
    /// ingesting an upstream snapshot.
    pub fn set_store_energy(&mut self, id: RawId, energy: u32) {
        if let Some(store) = self.store_mut(id) {
            *store = Store::new(energy, store.capacity());
        }
    }

    pub fn creep_withdraw(&mut self, name: &str, target: RawId, amount: Option<u32>) -> ReturnCode {
        let (pos, free) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.store.free_capacity()),
            None => return ReturnCode::NotFound,
        };

        let (target_pos, target_store) = match self.store_of(target) {
            Some(found) => found,
            None => return ReturnCode::InvalidTarget,
        };

        if !pos.is_near_to(target_pos) {
            return ReturnCode::NotInRange;
        }

        if target_store.is_empty() {
            return ReturnCode::NotEnoughResources;
        }

        if free == 0 {
            return ReturnCode::Full;
        }

        let moved = amount.unwrap_or(u32::MAX).min(target_store.energy()).min(free);

        if let Some(store) = self.store_mut(target) {
            store.remove(moved);
        }
        if let Some(creep) = self.creep_mut(name) {
            creep.store.add(moved);
        }

        ReturnCode::Ok
    }

    pub fn creep_transfer(&mut self, name: &str, target: RawId, amount: Option<u32>) -> ReturnCode {
        let (pos, carried) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.store.energy()),
            None => return ReturnCode::NotFound,
        };

        let (target_pos, target_store) = match self.store_of(target) {
            Some(found) => found,
            None => return ReturnCode::InvalidTarget,
        };

        if !pos.is_near_to(target_pos) {
            return ReturnCode::NotInRange;
        }

        if carried == 0 {
            return ReturnCode::NotEnoughResources;
        }

        if target_store.is_full() {
            return ReturnCode::Full;
        }

        let moved = amount
            .unwrap_or(u32::MAX)
            .min(carried)
            .min(target_store.free_capacity());

        if let Some(creep) = self.creep_mut(name) {
            creep.store.remove(moved);
        }
        if let Some(store) = self.store_mut(target) {
            store.add(moved);
        }

        ReturnCode::Ok
    }

    pub fn creep_drop(&mut self, name: &str, amount: Option<u32>) -> ReturnCode {
        let (pos, carried) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.store.energy()),
            None => return ReturnCode::NotFound,
        };

        if carried == 0 {
            return ReturnCode::NotEnoughResources;
        }

        let dropped = amount.unwrap_or(carried).min(carried);

        if let Some(creep) = self.creep_mut(name) {
            creep.store.remove(dropped);
        }
        self.add_dropped_resource(pos, dropped);

        ReturnCode::Ok
    }

    pub fn creep_build(&mut self, name: &str, site_id: ObjectId<ConstructionSiteData>) -> ReturnCode {
        let (pos, carried, work_parts) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.store.energy(), creep.count_parts(Part::Work)),
            None => return ReturnCode::NotFound,
        };

        if work_parts == 0 {
            return ReturnCode::NoBodypart;
        }

        let (site_pos, remaining) = match self.get_construction_site(site_id) {
            Some(site) => (site.pos, site.progress_total - site.progress),
            None => return ReturnCode::InvalidTarget,
        };

        if !pos.in_range_to(site_pos, 3) {
            return ReturnCode::NotInRange;
        }

        if carried == 0 {
            return ReturnCode::NotEnoughResources;
        }

        let spent = (work_parts * BUILD_POWER).min(carried).min(remaining);

        if let Some(creep) = self.creep_mut(name) {
            creep.store.remove(spent);
        }

        let mut completed = None;
        if let Some(GameObject::ConstructionSite(site)) = self.objects.get_mut(&site_id.raw()) {
            site.progress += spent;

            if site.progress >= site.progress_total {
                completed = Some((site.pos, site.kind, site.my));
            }
        }

        if let Some((pos, kind, my)) = completed {
            self.remove_object(site_id.raw());
            self.add_structure(pos, kind, my);
        }

        ReturnCode::Ok
    }

    pub fn creep_repair(&mut self, name: &str, structure_id: ObjectId<StructureData>) -> ReturnCode {
        let (pos, carried, work_parts) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.store.energy(), creep.count_parts(Part::Work)),
            None => return ReturnCode::NotFound,
        };

        if work_parts == 0 {
            return ReturnCode::NoBodypart;
        }

        let (target_pos, damage) = match self.get_structure(structure_id) {
            Some(structure) => (structure.pos, structure.hits_max - structure.hits),
            None => return ReturnCode::InvalidTarget,
        };

        if !pos.in_range_to(target_pos, 3) {
            return ReturnCode::NotInRange;
        }

        if carried == 0 {
            return ReturnCode::NotEnoughResources;
        }

        if damage == 0 {
            return ReturnCode::InvalidTarget;
        }

        let repaired = (work_parts * REPAIR_POWER).min(damage);
        let spent = work_parts.min(carried);

        if let Some(creep) = self.creep_mut(name) {
            creep.store.remove(spent);
        }
        if let Some(GameObject::Structure(structure)) = self.objects.get_mut(&structure_id.raw()) {
            structure.hits = (structure.hits + repaired).min(structure.hits_max);
        }

        ReturnCode::Ok
    }

    pub fn creep_upgrade(&mut self, name: &str, controller_id: ObjectId<ControllerData>) -> ReturnCode {
        let (pos, carried, work_parts) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.store.energy(), creep.count_parts(Part::Work)),
            None => return ReturnCode::NotFound,
        };

        if work_parts == 0 {
            return ReturnCode::NoBodypart;
        }

        let (target_pos, my) = match self.get_controller(controller_id) {
            Some(controller) => (controller.pos, controller.my),
            None => return ReturnCode::InvalidTarget,
        };

        if !my {
            return ReturnCode::NotOwner;
        }

        if !pos.in_range_to(target_pos, 3) {
            return ReturnCode::NotInRange;
        }

        if carried == 0 {
            return ReturnCode::NotEnoughResources;
        }

        let spent = (work_parts * UPGRADE_POWER).min(carried);

        if let Some(creep) = self.creep_mut(name) {
            creep.store.remove(spent);
        }
        if let Some(GameObject::Controller(controller)) = self.objects.get_mut(&controller_id.raw()) {
            controller.progress += spent;
            controller.ticks_to_downgrade = CONTROLLER_DOWNGRADE_RESET;
        }

        ReturnCode::Ok
    }

    pub fn creep_reserve(&mut self, name: &str, controller_id: ObjectId<ControllerData>) -> ReturnCode {
        let (pos, claim_parts) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.count_parts(Part::Claim)),
            None => return ReturnCode::NotFound,
        };

        if claim_parts == 0 {
            return ReturnCode::NoBodypart;
        }

        let (target_pos, owned) = match self.get_controller(controller_id) {
            Some(controller) => (controller.pos, controller.owner.is_some()),
            None => return ReturnCode::InvalidTarget,
        };

        if owned {
            return ReturnCode::InvalidTarget;
        }

        if !pos.is_near_to(target_pos) {
            return ReturnCode::NotInRange;
        }

        let username = self.username.clone();

        if let Some(GameObject::Controller(controller)) = self.objects.get_mut(&controller_id.raw()) {
            match &mut controller.reservation {
                Some(reservation) if reservation.username != username => return ReturnCode::InvalidTarget,
                Some(reservation) => {
                    reservation.ticks_to_end =
                        (reservation.ticks_to_end + claim_parts * CONTROLLER_RESERVE_TICKS).min(CONTROLLER_RESERVE_MAX);
                }
                None => {
                    controller.reservation = Some(Reservation {
                        username,
                        ticks_to_end: claim_parts * CONTROLLER_RESERVE_TICKS,
                    });
                }
            }
        }

        ReturnCode::Ok
    }

    fn damage_object(&mut self, target: RawId, damage: u32) {
        let destroyed = match self.objects.get_mut(&target) {
            Some(GameObject::Creep(creep)) => {
                creep.hits = creep.hits.saturating_sub(damage);
                creep.hits == 0
            }
            Some(GameObject::Structure(structure)) => {
                structure.hits = structure.hits.saturating_sub(damage);
                structure.hits == 0
            }
            _ => return,
        };

        if destroyed {
            if let Some(GameObject::Creep(creep)) = self.objects.get(&target) {
                let pos = creep.pos;
                let store = creep.store;

                self.remove_object(target);

                if !store.is_empty() {
                    self.add_tombstone(pos, store);
                }
            } else {
                self.remove_object(target);
            }
        }
    }

    pub fn creep_attack(&mut self, name: &str, target: RawId) -> ReturnCode {
        let (pos, attack_parts) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.count_parts(Part::Attack)),
            None => return ReturnCode::NotFound,
        };

        if attack_parts == 0 {
            return ReturnCode::NoBodypart;
        }

        let target_pos = match self.objects.get(&target) {
            Some(GameObject::Creep(creep)) => creep.pos,
            Some(GameObject::Structure(structure)) => structure.pos,
            _ => return ReturnCode::InvalidTarget,
        };

        if !pos.is_near_to(target_pos) {
            return ReturnCode::NotInRange;
        }

        self.damage_object(target, attack_parts * ATTACK_POWER);

        ReturnCode::Ok
    }

    pub fn creep_heal(&mut self, name: &str, target: ObjectId<CreepData>) -> ReturnCode {
        let (pos, heal_parts) = match self.get_creep(name) {
            Some(creep) => (creep.pos, creep.count_parts(Part::Heal)),
            None => return ReturnCode::NotFound,
        };

        if heal_parts == 0 {
            return ReturnCode::NoBodypart;
        }

        let target_pos = match self.get_creep_by_id(target) {
            Some(creep) => creep.pos,
            None => return ReturnCode::InvalidTarget,
        };

        if !pos.is_near_to(target_pos) {
            return ReturnCode::NotInRange;
        }

        if let Some(GameObject::Creep(creep)) = self.objects.get_mut(&target.raw()) {
            creep.hits = (creep.hits + heal_parts * HEAL_POWER).min(creep.hits_max);
        }

        ReturnCode::Ok
    }

    //
    // Structure action primitives
    //

    pub fn spawn_creep(&mut self, spawn_id: ObjectId<StructureData>, body: &[Part], name: &str) -> ReturnCode {
        if body.is_empty() || body.len() > MAX_CREEP_SIZE {
            return ReturnCode::InvalidArgs;
        }

        if self.creeps_by_name.contains_key(name) {
            return ReturnCode::NameExists;
        }

        let (spawn_pos, my) = match self.get_structure(spawn_id) {
            Some(structure) if structure.kind == StructureKind::Spawn => (structure.pos, structure.my),
            _ => return ReturnCode::InvalidTarget,
        };

        if !my {
            return ReturnCode::NotOwner;
        }

        let cost = body_cost(body);

        if cost > self.room_energy_available(spawn_pos.room) {
            return ReturnCode::NotEnoughResources;
        }

        let birth_pos = match self.free_tile_around(spawn_pos) {
            Some(pos) => pos,
            None => return ReturnCode::Busy,
        };

        self.drain_spawn_energy(spawn_pos.room, cost);
        self.add_creep(name, birth_pos, body.to_vec(), true);

        ReturnCode::Ok
    }

    fn free_tile_around(&self, pos: Position) -> Option<Position> {
        for dx in -1i32..=1 {
            for dy in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let x = pos.x() as i32 + dx;
                let y = pos.y() as i32 + dy;

                if x < 0 || y < 0 || x >= ROOM_WIDTH as i32 || y >= ROOM_HEIGHT as i32 {
                    continue;
                }

                let candidate = Position::new(pos.room, x as u8, y as u8);

                if self.is_walkable(candidate) && !self.creep_at(candidate) {
                    return Some(candidate);
                }
            }
        }

        None
    }

    fn drain_spawn_energy(&mut self, room: RoomName, mut cost: u32) {
        let ids: Vec<_> = self
            .structures_in(room)
            .filter(|s| s.my && matches!(s.kind, StructureKind::Spawn | StructureKind::Extension))
            .map(|s| s.id)
            .collect();

        for id in ids {
            if cost == 0 {
                break;
            }

            if let Some(GameObject::Structure(structure)) = self.objects.get_mut(&id.raw()) {
                if let Some(store) = structure.store.as_mut() {
                    cost -= store.remove(cost);
                }
            }
        }
    }

    pub fn link_transfer(&mut self, from: ObjectId<StructureData>, to: ObjectId<StructureData>) -> ReturnCode {
        let from_energy = match self.get_structure(from) {
            Some(s) if s.kind == StructureKind::Link && s.my => s.store.map(|st| st.energy()).unwrap_or(0),
            _ => return ReturnCode::InvalidTarget,
        };
        let to_free = match self.get_structure(to) {
            Some(s) if s.kind == StructureKind::Link && s.my => s.store.map(|st| st.free_capacity()).unwrap_or(0),
            _ => return ReturnCode::InvalidTarget,
        };

        if from_energy == 0 {
            return ReturnCode::NotEnoughResources;
        }

        if to_free == 0 {
            return ReturnCode::Full;
        }

        let moved = from_energy.min(to_free);

        if let Some(store) = self.store_mut(from.raw()) {
            store.remove(moved);
        }
        if let Some(store) = self.store_mut(to.raw()) {
            store.add(moved);
        }

        ReturnCode::Ok
    }

    fn tower_act(&mut self, tower_id: ObjectId<StructureData>, target_pos: Position) -> Result<(), ReturnCode> {
        let (pos, energy) = match self.get_structure(tower_id) {
            Some(s) if s.kind == StructureKind::Tower && s.my => (s.pos, s.store.map(|st| st.energy()).unwrap_or(0)),
            _ => return Err(ReturnCode::InvalidTarget),
        };

        if energy < TOWER_ACTION_COST {
            return Err(ReturnCode::NotEnoughResources);
        }

        if !pos.in_range_to(target_pos, TOWER_RANGE) {
            return Err(ReturnCode::NotInRange);
        }

        if let Some(store) = self.store_mut(tower_id.raw()) {
            store.remove(TOWER_ACTION_COST);
        }

        Ok(())
    }

    pub fn tower_attack(&mut self, tower_id: ObjectId<StructureData>, target: ObjectId<CreepData>) -> ReturnCode {
        let target_pos = match self.get_creep_by_id(target) {
            Some(creep) => creep.pos,
            None => return ReturnCode::InvalidTarget,
        };

        if let Err(code) = self.tower_act(tower_id, target_pos) {
            return code;
        }

        self.damage_object(target.raw(), TOWER_ATTACK_POWER);

        ReturnCode::Ok
    }

    pub fn tower_heal(&mut self, tower_id: ObjectId<StructureData>, target: ObjectId<CreepData>) -> ReturnCode {
        let target_pos = match self.get_creep_by_id(target) {
            Some(creep) => creep.pos,
            None => return ReturnCode::InvalidTarget,
        };

        if let Err(code) = self.tower_act(tower_id, target_pos) {
            return code;
        }

        if let Some(GameObject::Creep(creep)) = self.objects.get_mut(&target.raw()) {
            creep.hits = (creep.hits + TOWER_HEAL_POWER).min(creep.hits_max);
        }

        ReturnCode::Ok
    }

    pub fn tower_repair(&mut self, tower_id: ObjectId<StructureData>, target: ObjectId<StructureData>) -> ReturnCode {
        let target_pos = match self.get_structure(target) {
            Some(structure) => structure.pos,
            None => return ReturnCode::InvalidTarget,
        };

        if let Err(code) = self.tower_act(tower_id, target_pos) {
            return code;
        }

        if let Some(GameObject::Structure(structure)) = self.objects.get_mut(&target.raw()) {
            structure.hits = (structure.hits + TOWER_REPAIR_POWER).min(structure.hits_max);
        }

        ReturnCode::Ok
    }

    pub fn create_construction_site(&mut self, pos: Position, kind: StructureKind) -> ReturnCode {
        let terrain = match self.terrain(pos.room) {
            Some(terrain) => terrain,
            None => return ReturnCode::InvalidArgs,
        };

        if terrain.is_wall(pos.x(), pos.y()) {
            return ReturnCode::InvalidTarget;
        }

        let occupied = self.structures_in(pos.room).any(|s| s.pos == pos)
            || self.construction_sites_in(pos.room).any(|s| s.pos == pos);

        if occupied {
            return ReturnCode::InvalidTarget;
        }

        self.add_construction_site(pos, kind);

        ReturnCode::Ok
    }

    //
    // Simulation step, used by hosts that drive this world model directly
    // (and by the integration tests). The deployed environment advances its
    // own clock; this mirrors just enough of it.
    //

    pub fn step(&mut self) {
        self.tick += 1;

        let mut dead = Vec::new();

        for (raw, obj) in self.objects.iter_mut() {
            match obj {
                GameObject::Creep(creep) => {
                    creep.fatigue = creep.fatigue.saturating_sub(creep.count_parts(Part::Move) * MOVE_FATIGUE_POWER);
                    creep.ticks_to_live = creep.ticks_to_live.saturating_sub(1);

                    if creep.ticks_to_live == 0 {
                        dead.push(*raw);
                    }
                }
                GameObject::Resource(resource) => {
                    resource.amount = resource.amount.saturating_sub(1);

                    if resource.amount == 0 {
                        dead.push(*raw);
                    }
                }
                GameObject::Controller(controller) => {
                    controller.ticks_to_downgrade = controller.ticks_to_downgrade.saturating_sub(1);

                    if let Some(reservation) = controller.reservation.as_mut() {
                        reservation.ticks_to_end = reservation.ticks_to_end.saturating_sub(1);

                        if reservation.ticks_to_end == 0 {
                            controller.reservation = None;
                        }
                    }
                }
                _ => {}
            }
        }

        for raw in dead {
            if let Some(GameObject::Creep(creep)) = self.objects.get(&raw) {
                let pos = creep.pos;
                let store = creep.store;

                self.remove_object(raw);

                if !store.is_empty() {
                    self.add_tombstone(pos, store);
                }
            } else {
                self.remove_object(raw);
            }
        }

        if self.objects.is_empty() {
            warn!("world stepped with no objects");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> RoomName {
        RoomName::new(0, 0)
    }

    fn world_with_room() -> World {
        let mut world = World::new();
        world.add_room(room());
        world
    }

    #[test]
    fn path_len_routes_around_walls() {
        let mut world = World::new();
        let mut terrain = RoomTerrain::open();

        // Vertical wall with a gap at y=20.
        for y in 0..ROOM_HEIGHT {
            if y != 20 {
                terrain.set_xy(25, y, TerrainFlags::WALL);
            }
        }
        world.add_room_with_terrain(room(), terrain);

        let from = Position::new(room(), 20, 10);
        let to = Position::new(room(), 30, 10);

        let direct = from.range_to(to).unwrap();
        let len = world.path_len(from, to, 0).unwrap();

        assert!(len > direct, "path should detour through the gap");
        assert!(world.path_len(from, Position::new(RoomName::new(1, 0), 1, 1), 0).is_none());
    }

    #[test]
    fn harvest_moves_energy_and_spills_overflow() {
        let mut world = world_with_room();
        let source = world.add_source(Position::new(room(), 10, 10), 300, 3000);
        world.add_creep(
            "h1",
            Position::new(room(), 10, 11),
            vec![Part::Work, Part::Work, Part::Move],
            true,
        );

        // No carry parts: everything mined spills.
        assert_eq!(world.creep_harvest("h1", source), ReturnCode::Ok);
        assert_eq!(world.get_source(source).unwrap().energy, 296);
        assert_eq!(world.dropped_in(room()).map(|r| r.amount).sum::<u32>(), 4);
    }

    #[test]
    fn transfer_and_withdraw_respect_capacity() {
        let mut world = world_with_room();
        let container = world.add_structure(Position::new(room(), 5, 5), StructureKind::Container, false);
        world.add_creep("c1", Position::new(room(), 5, 6), vec![Part::Carry, Part::Move], true);

        assert_eq!(
            world.creep_withdraw("c1", container.raw(), None),
            ReturnCode::NotEnoughResources
        );

        if let Some(store) = world.store_mut(container.raw()) {
            store.add(30);
        }

        assert_eq!(world.creep_withdraw("c1", container.raw(), None), ReturnCode::Ok);
        assert_eq!(world.get_creep("c1").unwrap().store.energy(), 30);

        assert_eq!(world.creep_transfer("c1", container.raw(), Some(10)), ReturnCode::Ok);
        assert_eq!(world.get_creep("c1").unwrap().store.energy(), 20);
    }

    #[test]
    fn spawn_drains_room_energy_and_rejects_duplicates() {
        let mut world = world_with_room();
        let spawn = world.add_structure(Position::new(room(), 25, 25), StructureKind::Spawn, true);

        if let Some(store) = world.store_mut(spawn.raw()) {
            store.add(300);
        }

        let body = [Part::Work, Part::Carry, Part::Move];

        assert_eq!(world.spawn_creep(spawn, &body, "w1"), ReturnCode::Ok);
        assert_eq!(world.room_energy_available(room()), 100);
        assert_eq!(world.spawn_creep(spawn, &body, "w1"), ReturnCode::NameExists);
        assert_eq!(
            world.spawn_creep(spawn, &body, "w2"),
            ReturnCode::NotEnoughResources
        );
    }

    #[test]
    fn move_to_advances_one_step_per_call() {
        let mut world = world_with_room();
        world.add_creep("m1", Position::new(room(), 10, 10), vec![Part::Move], true);

        let target = Position::new(room(), 13, 10);

        assert_eq!(world.creep_move_to("m1", target), ReturnCode::Ok);

        let pos = world.get_creep("m1").unwrap().pos;
        assert_eq!(pos.range_to(target), Some(2));
    }

    #[test]
    fn dying_creep_leaves_tombstone_with_store() {
        let mut world = world_with_room();
        world.add_creep("t1", Position::new(room(), 9, 9), vec![Part::Carry, Part::Move], true);
        world.creep_mut("t1").unwrap().store.add(40);
        world.creep_mut("t1").unwrap().ticks_to_live = 1;

        world.step();

        assert!(world.get_creep("t1").is_none());
        let tombstone = world.tombstones_in(room()).next().unwrap();
        assert_eq!(tombstone.store.energy(), 40);
    }
}
