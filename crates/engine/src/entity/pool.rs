use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use super::kinds::{EntityData, EntityKind, ENTITY_KIND_COUNT};
use crate::world::{TileCoords, WorldCoords, MAXIMUM_MAP_SIZE_TECHNICAL};

/// Hard ceiling on concurrently live entities.
pub const MAX_ENTITIES: usize = 10_000;

const TECHNICAL_TILE_COUNT: usize =
    (MAXIMUM_MAP_SIZE_TECHNICAL as usize) * (MAXIMUM_MAP_SIZE_TECHNICAL as usize);

/// Bucket for entities that are off-map or have no position yet.
const NULL_BUCKET: usize = TECHNICAL_TILE_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u16);

impl EntityId {
    fn index(self) -> usize {
        usize::from(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EntityError {
    #[error("entity id {0} outside the pool")]
    IdOutOfRange(u16),
    #[error("entity id {0} appears twice in the snapshot")]
    DuplicateId(u16),
    #[error("snapshot contains a null entity")]
    NullSnapshot,
}

/// One slot of the entity pool. Link fields are owned by the pool; position
/// changes go through [`EntityPool::set_position`] so the spatial index
/// stays consistent.
#[derive(Debug, Clone, Copy)]
pub struct Entity {
    id: EntityId,
    position: Option<WorldCoords>,
    z: i32,
    pub data: EntityData,
    next_in_list: Option<EntityId>,
    prev_in_list: Option<EntityId>,
    next_in_bucket: Option<EntityId>,
    bucket: usize,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.data.kind()
    }

    pub fn position(&self) -> Option<WorldCoords> {
        self.position
    }

    pub fn z(&self) -> i32 {
        self.z
    }
}

/// Serialized form of a live entity, for the persisted world document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u16,
    pub position: Option<WorldCoords>,
    pub z: i32,
    pub data: EntityData,
}

/// Fixed-capacity object pool for non-tile dynamic objects, with free-list
/// allocation, per-kind membership lists, and a tile-keyed spatial bucket
/// index.
#[derive(Debug, Clone)]
pub struct EntityPool {
    slots: Vec<Entity>,
    list_heads: [Option<EntityId>; ENTITY_KIND_COUNT],
    list_counts: [usize; ENTITY_KIND_COUNT],
    spatial_index: Vec<Option<EntityId>>,
}

fn bucket_for(position: Option<WorldCoords>) -> usize {
    match position {
        Some(world) => world
            .to_tile()
            .to_tile_index()
            .unwrap_or(NULL_BUCKET),
        None => NULL_BUCKET,
    }
}

impl EntityPool {
    pub fn new() -> Self {
        let slots = (0..MAX_ENTITIES)
            .map(|id| Entity {
                id: EntityId(id as u16),
                position: None,
                z: 0,
                data: EntityData::Null,
                next_in_list: None,
                prev_in_list: None,
                next_in_bucket: None,
                bucket: NULL_BUCKET,
            })
            .collect();
        let mut pool = Self {
            slots,
            list_heads: [None; ENTITY_KIND_COUNT],
            list_counts: [0; ENTITY_KIND_COUNT],
            spatial_index: vec![None; TECHNICAL_TILE_COUNT + 1],
        };
        pool.rethread_lists();
        pool.rebuild_spatial_index();
        pool
    }

    /// Return every slot to the free list. The entity-side counterpart of a
    /// fresh map init.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.position = None;
            slot.z = 0;
            slot.data = EntityData::Null;
            slot.bucket = NULL_BUCKET;
        }
        self.rethread_lists();
        self.rebuild_spatial_index();
    }

    /// Allocate a new entity of a kind. `None` when the pool is exhausted;
    /// callers must treat that as "cannot place".
    pub fn create(&mut self, kind: EntityKind) -> Option<EntityId> {
        if kind == EntityKind::Null {
            debug_assert!(false, "cannot create a null entity");
            return None;
        }
        let id = self.list_heads[EntityKind::Null.list_index()]?;

        self.unlink_from_list(id);
        let slot = &mut self.slots[id.index()];
        slot.data = EntityData::default_for(kind);
        slot.position = None;
        slot.z = 0;
        self.link_into_list(id, kind);
        self.insert_into_bucket(id, NULL_BUCKET);
        Some(id)
    }

    /// Checked access: the id must be in range and the slot live.
    pub fn try_get(&self, id: EntityId) -> Option<&Entity> {
        let slot = self.slots.get(id.index())?;
        if slot.kind() == EntityKind::Null {
            return None;
        }
        Some(slot)
    }

    pub fn try_get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.kind() == EntityKind::Null {
            return None;
        }
        Some(slot)
    }

    /// Checked downcast: the slot's kind tag must match.
    pub fn try_get_of_kind(&self, id: EntityId, kind: EntityKind) -> Option<&Entity> {
        self.try_get(id).filter(|entity| entity.kind() == kind)
    }

    /// Remove an entity and return its slot to the free list. Guarded
    /// against double removal.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.slots.get(id.index()) else {
            debug!(id = id.0, "removal of out-of-range entity id");
            return false;
        };
        if slot.kind() == EntityKind::Null {
            warn!(id = id.0, "attempted double removal of entity");
            debug_assert!(false, "double remove of entity");
            return false;
        }

        self.remove_from_bucket(id);
        self.unlink_from_list(id);
        let slot = &mut self.slots[id.index()];
        slot.data = EntityData::Null;
        slot.position = None;
        slot.z = 0;
        slot.bucket = NULL_BUCKET;
        self.link_front_of_list(id, EntityKind::Null);
        true
    }

    /// Move an entity, keeping the spatial bucket index in sync. Positions
    /// outside the technical bound land in the null bucket.
    pub fn set_position(&mut self, id: EntityId, position: Option<WorldCoords>, z: i32) -> bool {
        if self.try_get(id).is_none() {
            return false;
        }
        let slot = &mut self.slots[id.index()];
        slot.position = position;
        slot.z = z;
        self.update_spatial_index(id);
        true
    }

    /// Re-bucket an entity after its stored position changed.
    pub fn update_spatial_index(&mut self, id: EntityId) {
        let Some(slot) = self.slots.get(id.index()) else {
            return;
        };
        let new_bucket = bucket_for(slot.position);
        if new_bucket == slot.bucket {
            return;
        }
        self.remove_from_bucket(id);
        self.insert_into_bucket(id, new_bucket);
    }

    /// Entities located on one tile, in bucket order.
    pub fn entities_on_tile(&self, coords: TileCoords) -> EntityIter<'_> {
        let head = coords
            .to_tile_index()
            .and_then(|bucket| self.spatial_index[bucket]);
        EntityIter {
            pool: self,
            next: head,
            follow_bucket: true,
        }
    }

    /// Entities with no on-map position.
    pub fn unpositioned_entities(&self) -> EntityIter<'_> {
        EntityIter {
            pool: self,
            next: self.spatial_index[NULL_BUCKET],
            follow_bucket: true,
        }
    }

    /// Entities of one kind, in membership-list order.
    pub fn entities_of_kind(&self, kind: EntityKind) -> EntityIter<'_> {
        EntityIter {
            pool: self,
            next: self.list_heads[kind.list_index()],
            follow_bucket: false,
        }
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.list_counts[kind.list_index()]
    }

    pub fn free_count(&self) -> usize {
        self.list_counts[EntityKind::Null.list_index()]
    }

    /// Rebuild every spatial bucket from the slots' stored positions.
    pub fn rebuild_spatial_index(&mut self) {
        for bucket in &mut self.spatial_index {
            *bucket = None;
        }
        // Insert in descending id order so each bucket chain reads in
        // ascending id order.
        for index in (0..self.slots.len()).rev() {
            if self.slots[index].kind() == EntityKind::Null {
                continue;
            }
            let bucket = bucket_for(self.slots[index].position);
            self.slots[index].bucket = bucket;
            self.slots[index].next_in_bucket = self.spatial_index[bucket];
            self.spatial_index[bucket] = Some(EntityId(index as u16));
        }
    }

    /// Consistency repair: remove every live entity that has drifted off
    /// the map (or never received a position). Returns how many went.
    pub fn remove_floating(&mut self) -> usize {
        let mut removed = 0;
        while let Some(id) = self.spatial_index[NULL_BUCKET] {
            if !self.remove(id) {
                break;
            }
            removed += 1;
        }
        if removed > 0 {
            debug!(removed, "removed floating entities");
        }
        removed
    }

    /// Checksum over id, kind, and position of every live entity, in id
    /// order. Detects save/load divergence.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for slot in &self.slots {
            if slot.kind() == EntityKind::Null {
                continue;
            }
            hasher.update(slot.id.0.to_le_bytes());
            hasher.update((slot.kind().list_index() as u32).to_le_bytes());
            let (x, y) = match slot.position {
                Some(world) => (world.x, world.y),
                None => (i32::MIN, i32::MIN),
            };
            hasher.update(x.to_le_bytes());
            hasher.update(y.to_le_bytes());
            hasher.update(slot.z.to_le_bytes());
        }
        let digest = hasher.finalize();
        let mut out = String::with_capacity(digest.len() * 2);
        for byte in digest {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }

    /// Snapshot every live entity for persistence, in id order.
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.slots
            .iter()
            .filter(|slot| slot.kind() != EntityKind::Null)
            .map(|slot| EntitySnapshot {
                id: slot.id.0,
                position: slot.position,
                z: slot.z,
                data: slot.data,
            })
            .collect()
    }

    /// Rebuild a pool from persisted snapshots. Lists and buckets are
    /// rethreaded in ascending id order, so allocation after a load is
    /// deterministic.
    pub fn restore(snapshots: &[EntitySnapshot]) -> Result<Self, EntityError> {
        let mut pool = Self::new();
        for snapshot in snapshots {
            if usize::from(snapshot.id) >= MAX_ENTITIES {
                return Err(EntityError::IdOutOfRange(snapshot.id));
            }
            if snapshot.data.kind() == EntityKind::Null {
                return Err(EntityError::NullSnapshot);
            }
            let slot = &mut pool.slots[usize::from(snapshot.id)];
            if slot.kind() != EntityKind::Null {
                return Err(EntityError::DuplicateId(snapshot.id));
            }
            slot.data = snapshot.data;
            slot.position = snapshot.position;
            slot.z = snapshot.z;
        }
        pool.rethread_lists();
        pool.rebuild_spatial_index();
        Ok(pool)
    }

    /// Rebuild every membership list (including the free list) by scanning
    /// slots in ascending id order.
    fn rethread_lists(&mut self) {
        self.list_heads = [None; ENTITY_KIND_COUNT];
        self.list_counts = [0; ENTITY_KIND_COUNT];
        let mut tails: [Option<EntityId>; ENTITY_KIND_COUNT] = [None; ENTITY_KIND_COUNT];

        for index in 0..self.slots.len() {
            let id = EntityId(index as u16);
            let list = self.slots[index].kind().list_index();
            self.slots[index].next_in_list = None;
            self.slots[index].prev_in_list = tails[list];
            match tails[list] {
                Some(tail) => self.slots[tail.index()].next_in_list = Some(id),
                None => self.list_heads[list] = Some(id),
            }
            tails[list] = Some(id);
            self.list_counts[list] += 1;
        }
    }

    fn unlink_from_list(&mut self, id: EntityId) {
        let slot = self.slots[id.index()];
        let list = slot.kind().list_index();
        match slot.prev_in_list {
            Some(prev) => self.slots[prev.index()].next_in_list = slot.next_in_list,
            None => self.list_heads[list] = slot.next_in_list,
        }
        if let Some(next) = slot.next_in_list {
            self.slots[next.index()].prev_in_list = slot.prev_in_list;
        }
        let slot = &mut self.slots[id.index()];
        slot.next_in_list = None;
        slot.prev_in_list = None;
        self.list_counts[list] -= 1;
    }

    fn link_into_list(&mut self, id: EntityId, kind: EntityKind) {
        self.link_front_of_list(id, kind);
    }

    fn link_front_of_list(&mut self, id: EntityId, kind: EntityKind) {
        let list = kind.list_index();
        let old_head = self.list_heads[list];
        if let Some(head) = old_head {
            self.slots[head.index()].prev_in_list = Some(id);
        }
        let slot = &mut self.slots[id.index()];
        slot.prev_in_list = None;
        slot.next_in_list = old_head;
        self.list_heads[list] = Some(id);
        self.list_counts[list] += 1;
    }

    fn insert_into_bucket(&mut self, id: EntityId, bucket: usize) {
        let old_head = self.spatial_index[bucket];
        let slot = &mut self.slots[id.index()];
        slot.bucket = bucket;
        slot.next_in_bucket = old_head;
        self.spatial_index[bucket] = Some(id);
    }

    fn remove_from_bucket(&mut self, id: EntityId) {
        let bucket = self.slots[id.index()].bucket;
        let next = self.slots[id.index()].next_in_bucket;

        if self.spatial_index[bucket] == Some(id) {
            self.spatial_index[bucket] = next;
        } else {
            let mut cursor = self.spatial_index[bucket];
            let mut found = false;
            while let Some(current) = cursor {
                if self.slots[current.index()].next_in_bucket == Some(id) {
                    self.slots[current.index()].next_in_bucket = next;
                    found = true;
                    break;
                }
                cursor = self.slots[current.index()].next_in_bucket;
            }
            if !found {
                warn!(id = id.0, bucket, "entity missing from its spatial bucket");
                debug_assert!(false, "spatial bucket chain out of sync");
            }
        }
        self.slots[id.index()].next_in_bucket = None;
    }
}

impl Default for EntityPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a membership list or a spatial bucket chain.
pub struct EntityIter<'a> {
    pool: &'a EntityPool,
    next: Option<EntityId>,
    follow_bucket: bool,
}

impl<'a> Iterator for EntityIter<'a> {
    type Item = &'a Entity;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let entity = &self.pool.slots[id.index()];
        self.next = if self.follow_bucket {
            entity.next_in_bucket
        } else {
            entity.next_in_list
        };
        Some(entity)
    }
}
