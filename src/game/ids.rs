use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use uuid::Uuid;

/// Untyped object identity. Stable for the lifetime of the object and unique
/// across the whole world, which makes it safe to persist in memory and
/// resolve defensively next tick.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct RawId(Uuid);

impl RawId {
    pub fn from_index(index: u128) -> RawId {
        RawId(Uuid::from_u128(index))
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_simple())
    }
}

impl fmt::Debug for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawId({})", self)
    }
}

/// Typed wrapper over [`RawId`]. The phantom type records what kind of object
/// the id referred to when it was captured; resolution against a live world
/// snapshot re-checks it.
pub struct ObjectId<T> {
    raw: RawId,
    phantom: PhantomData<fn() -> T>,
}

impl<T> ObjectId<T> {
    pub fn new(raw: RawId) -> ObjectId<T> {
        ObjectId { raw, phantom: PhantomData }
    }

    pub fn raw(&self) -> RawId {
        self.raw
    }
}

impl<T> Copy for ObjectId<T> {}

impl<T> Clone for ObjectId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for ObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for ObjectId<T> {}

impl<T> Hash for ObjectId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.raw)
    }
}

impl<T> fmt::Display for ObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<T> Serialize for ObjectId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.raw.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ObjectId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        RawId::deserialize(deserializer).map(ObjectId::new)
    }
}
