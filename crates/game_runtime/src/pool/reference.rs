//! Poolable reference contract, type tokens and handles

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::any::{short_type_name, AsAny};
use crate::foundation::collections::TypedHandle;

use super::collection::{ErasedCollection, PoolCollection};

slotmap::new_key_type! {
    /// Slot key of a live pooled instance
    pub struct PoolKey;
}

/// A type whose instances can be recycled by the [`ReferencePool`](super::ReferencePool)
///
/// Together with `Default` (the parameterless constructor) this is the
/// poolable contract. `clear` must put the instance back into the state
/// `Default` would produce, as far as observable behavior goes.
pub trait Reference: AsAny {
    /// Reset the instance before it rests in the free list
    fn clear(&mut self);
}

/// Generation stamped on every collection instance, unique per process
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CollectionId(u64);

impl CollectionId {
    pub(crate) fn next() -> Self {
        static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Address of a pooled instance: the issuing collection plus its slot
///
/// A slot only resolves in the collection that issued it, so handles kept
/// across [`clear_all`](super::ReferencePool::clear_all) or carried to
/// another pool never alias a newer instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PoolSlot {
    collection: CollectionId,
    key: PoolKey,
}

impl PoolSlot {
    pub(crate) fn new(collection: CollectionId, key: PoolKey) -> Self {
        Self { collection, key }
    }

    /// Collection that issued the slot
    pub fn collection(&self) -> CollectionId {
        self.collection
    }

    /// Slot key inside that collection
    pub fn key(&self) -> PoolKey {
        self.key
    }
}

/// Handle to a live instance stored in the pool
pub type Pooled<T> = TypedHandle<PoolSlot, T>;

/// Runtime type token for pooled payloads
///
/// Carries the identity of a `Reference + Default` type together with the
/// constructor of its collection, so callers can drive the pool without
/// naming the type statically.
#[derive(Clone, Copy)]
pub struct ReferenceType {
    id: TypeId,
    name: &'static str,
    create_collection: fn() -> Box<dyn ErasedCollection>,
}

impl ReferenceType {
    /// Token for `T`
    pub fn of<T: Reference + Default>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            create_collection: new_collection::<T>,
        }
    }

    /// Type identity
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn create_collection(&self) -> Box<dyn ErasedCollection> {
        (self.create_collection)()
    }
}

impl PartialEq for ReferenceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ReferenceType {}

impl fmt::Debug for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceType({})", short_type_name(self.name))
    }
}

fn new_collection<T: Reference + Default>() -> Box<dyn ErasedCollection> {
    Box::new(PoolCollection::<T>::new())
}

/// Handle to a live pooled instance whose type is only known at runtime
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErasedHandle {
    type_id: TypeId,
    type_name: &'static str,
    slot: PoolSlot,
}

impl ErasedHandle {
    pub(crate) fn new(type_id: TypeId, type_name: &'static str, slot: PoolSlot) -> Self {
        Self { type_id, type_name, slot }
    }

    /// Concrete type identity of the instance
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified name of the concrete type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Issuing collection and slot
    pub fn slot(&self) -> PoolSlot {
        self.slot
    }

    /// Whether the instance is a `T`
    pub fn is<T: Reference>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Recover the typed handle if the instance is a `T`
    pub fn downcast<T: Reference>(self) -> Option<Pooled<T>> {
        self.is::<T>().then(|| Pooled::new(self.slot))
    }
}

impl<T: Reference> From<Pooled<T>> for ErasedHandle {
    fn from(handle: Pooled<T>) -> Self {
        Self::new(TypeId::of::<T>(), std::any::type_name::<T>(), handle.key())
    }
}

impl fmt::Debug for ErasedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedHandle")
            .field("type", &short_type_name(self.type_name))
            .field("slot", &self.slot)
            .finish()
    }
}
