//! Type-keyed registry of reference collections

use std::any::TypeId;
use std::collections::HashMap;

use crate::error::{RuntimeError, RuntimeResult};

use super::collection::{ErasedCollection, PoolCollection};
use super::info::ReferencePoolInfo;
use super::reference::{ErasedHandle, Pooled, Reference, ReferenceType};

/// Reference pool
///
/// Maps each payload type to its [`PoolCollection`], creating collections
/// lazily on first use. Collections are only ever dropped all together by
/// [`clear_all`](Self::clear_all).
///
/// # Usage
///
/// ```
/// use game_runtime::pool::{Reference, ReferencePool};
///
/// #[derive(Default)]
/// struct Packet { bytes: Vec<u8> }
///
/// impl Reference for Packet {
///     fn clear(&mut self) { self.bytes.clear(); }
/// }
///
/// let mut pool = ReferencePool::new();
/// let handle = pool.acquire::<Packet>();
/// pool.get_mut(handle).unwrap().bytes.push(1);
/// pool.release(handle).unwrap();
/// assert!(pool.get(handle).is_none());
/// ```
pub struct ReferencePool {
    collections: HashMap<TypeId, Box<dyn ErasedCollection>>,
    strict_check: bool,
}

impl Default for ReferencePool {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferencePool {
    /// Create an empty pool with strict checking off
    pub fn new() -> Self {
        Self::with_strict_check(false)
    }

    /// Create an empty pool with the given strict check setting
    pub fn with_strict_check(strict_check: bool) -> Self {
        Self {
            collections: HashMap::new(),
            strict_check,
        }
    }

    /// Whether releases are validated
    pub fn strict_check(&self) -> bool {
        self.strict_check
    }

    /// Enable or disable release validation
    pub fn set_strict_check(&mut self, enabled: bool) {
        self.strict_check = enabled;
    }

    /// Number of payload types with a collection
    pub fn count(&self) -> usize {
        self.collections.len()
    }

    /// Counter snapshots of every collection, sorted by type name
    pub fn infos(&self) -> Vec<ReferencePoolInfo> {
        let mut infos: Vec<_> = self.collections.values().map(|c| c.info_erased()).collect();
        infos.sort_by(|a, b| a.type_name.cmp(b.type_name));
        infos
    }

    /// Counter snapshot for `T`, if it has a collection
    pub fn info<T: Reference + Default>(&self) -> Option<ReferencePoolInfo> {
        self.collection::<T>().map(PoolCollection::info)
    }

    /// Acquire a `T` kept in the pool and return its handle
    pub fn acquire<T: Reference + Default>(&mut self) -> Pooled<T> {
        let handle = self.collection_mut::<T>().acquire();
        log::trace!("Acquired {}", std::any::type_name::<T>());
        handle
    }

    /// Acquire an instance of a runtime-selected type
    pub fn acquire_by_type(&mut self, reference_type: &ReferenceType) -> ErasedHandle {
        let slot = self.erased_collection_mut(reference_type).acquire_slot();
        log::trace!("Acquired {}", reference_type.name());
        ErasedHandle::new(reference_type.id(), reference_type.name(), slot)
    }

    /// Acquire a `T` by value; give it back with [`release_owned`](Self::release_owned)
    pub fn acquire_owned<T: Reference + Default>(&mut self) -> T {
        self.collection_mut::<T>().acquire_owned()
    }

    /// Borrow a live instance
    pub fn get<T: Reference + Default>(&self, handle: Pooled<T>) -> Option<&T> {
        self.collection::<T>()?.get(handle)
    }

    /// Mutably borrow a live instance
    pub fn get_mut<T: Reference + Default>(&mut self, handle: Pooled<T>) -> Option<&mut T> {
        self.collections
            .get_mut(&TypeId::of::<T>())?
            .as_dyn_any_mut()
            .downcast_mut::<PoolCollection<T>>()?
            .get_mut(handle)
    }

    /// Whether a type-erased handle still refers to a live instance
    pub fn contains(&self, handle: ErasedHandle) -> bool {
        self.collections
            .get(&handle.type_id())
            .is_some_and(|c| c.contains_erased(handle.slot()))
    }

    /// Clear a live instance and return it to its free list
    ///
    /// The handle is invalid afterwards. Releasing a handle that is not
    /// live, that another pool or an earlier collection issued, or whose
    /// type has no collection here, fails with
    /// [`RuntimeError::TypeContractViolation`] when strict checking is on
    /// and is ignored otherwise.
    pub fn release<T: Reference + Default>(&mut self, handle: Pooled<T>) -> RuntimeResult<()> {
        self.release_erased(handle.into())
    }

    /// Type-erased [`release`](Self::release)
    pub fn release_erased(&mut self, handle: ErasedHandle) -> RuntimeResult<()> {
        let strict_check = self.strict_check;
        match self.collections.get_mut(&handle.type_id()) {
            Some(collection) => {
                collection.release_erased(handle.slot(), strict_check)?;
                log::trace!("Released {}", handle.type_name());
                Ok(())
            }
            None if strict_check => Err(RuntimeError::TypeContractViolation(format!(
                "Reference type '{}' has no collection in this pool",
                handle.type_name()
            ))),
            None => {
                log::warn!(
                    "Ignoring release of '{}' which has no collection in this pool",
                    handle.type_name()
                );
                Ok(())
            }
        }
    }

    /// Clear an instance acquired by value and return it to its free list
    pub fn release_owned<T: Reference + Default>(&mut self, value: T) {
        self.collection_mut::<T>().release_owned(value);
        log::trace!("Released {}", std::any::type_name::<T>());
    }

    /// Pre-warm `T`'s free list
    pub fn add<T: Reference + Default>(&mut self, count: usize) {
        self.collection_mut::<T>().add(count);
    }

    /// Pre-warm the free list of a runtime-selected type
    pub fn add_by_type(&mut self, reference_type: &ReferenceType, count: usize) {
        self.erased_collection_mut(reference_type).add_erased(count);
    }

    /// Drop up to `count` instances from `T`'s free list
    pub fn remove<T: Reference + Default>(&mut self, count: usize) {
        self.collection_mut::<T>().remove(count);
    }

    /// Drop up to `count` instances from a runtime-selected type's free list
    pub fn remove_by_type(&mut self, reference_type: &ReferenceType, count: usize) {
        self.erased_collection_mut(reference_type).remove_erased(count);
    }

    /// Drop every instance in `T`'s free list
    pub fn remove_all<T: Reference + Default>(&mut self) {
        self.collection_mut::<T>().remove_all();
    }

    /// Drop every instance in a runtime-selected type's free list
    pub fn remove_all_by_type(&mut self, reference_type: &ReferenceType) {
        self.erased_collection_mut(reference_type).remove_all_erased();
    }

    /// Drain every collection and forget every type
    ///
    /// Outstanding handles stop resolving, including after the type is
    /// pooled again.
    pub fn clear_all(&mut self) {
        for collection in self.collections.values_mut() {
            collection.remove_all_erased();
        }
        let count = self.collections.len();
        self.collections.clear();
        log::debug!("Reference pool cleared ({} collections)", count);
    }

    /// Typed collection for `T`, if one exists
    pub fn collection<T: Reference + Default>(&self) -> Option<&PoolCollection<T>> {
        self.collections
            .get(&TypeId::of::<T>())?
            .as_dyn_any()
            .downcast_ref::<PoolCollection<T>>()
    }

    fn collection_mut<T: Reference + Default>(&mut self) -> &mut PoolCollection<T> {
        let reference_type = ReferenceType::of::<T>();
        let collection = self.erased_collection_mut(&reference_type).as_dyn_any_mut();
        match collection.downcast_mut::<PoolCollection<T>>() {
            Some(collection) => collection,
            None => unreachable!("collection keyed by TypeId of {}", reference_type.name()),
        }
    }

    fn erased_collection_mut(&mut self, reference_type: &ReferenceType) -> &mut Box<dyn ErasedCollection> {
        self.collections
            .entry(reference_type.id())
            .or_insert_with(|| {
                log::trace!("Creating reference collection for {}", reference_type.name());
                reference_type.create_collection()
            })
    }
}
