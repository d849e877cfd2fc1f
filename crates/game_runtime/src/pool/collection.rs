//! Per-type reference collection

use std::any::Any;

use slotmap::SlotMap;

use crate::error::{RuntimeError, RuntimeResult};

use super::info::ReferencePoolInfo;
use super::reference::{CollectionId, PoolKey, PoolSlot, Pooled, Reference};

/// Free list and usage counters for exactly one payload type
///
/// Instances handed out through [`Pooled`] handles stay stored in `live`
/// until released; instances handed out by value are tracked by the
/// counters only. Handles carry the collection's [`CollectionId`] and never
/// resolve in any other collection.
pub struct PoolCollection<T> {
    id: CollectionId,
    live: SlotMap<PoolKey, T>,
    unused: Vec<T>,
    acquire_count: usize,
    release_count: usize,
    add_count: usize,
    remove_count: usize,
}

impl<T: Reference + Default> PoolCollection<T> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            id: CollectionId::next(),
            live: SlotMap::with_key(),
            unused: Vec::new(),
            acquire_count: 0,
            release_count: 0,
            add_count: 0,
            remove_count: 0,
        }
    }

    /// Acquire an instance kept in the collection and return its handle
    pub fn acquire(&mut self) -> Pooled<T> {
        let value = self.take();
        Pooled::new(PoolSlot::new(self.id, self.live.insert(value)))
    }

    /// Acquire an instance by value
    pub fn acquire_owned(&mut self) -> T {
        self.take()
    }

    fn take(&mut self) -> T {
        self.acquire_count += 1;
        self.unused.pop().unwrap_or_default()
    }

    /// Generation of this collection
    pub fn id(&self) -> CollectionId {
        self.id
    }

    /// Slot key of `slot` if this collection issued it
    fn own_key(&self, slot: PoolSlot) -> Option<PoolKey> {
        (slot.collection() == self.id).then_some(slot.key())
    }

    /// Borrow a live instance
    pub fn get(&self, handle: Pooled<T>) -> Option<&T> {
        self.live.get(self.own_key(handle.key())?)
    }

    /// Mutably borrow a live instance
    pub fn get_mut(&mut self, handle: Pooled<T>) -> Option<&mut T> {
        let key = self.own_key(handle.key())?;
        self.live.get_mut(key)
    }

    /// Whether the handle still refers to a live instance
    pub fn contains(&self, handle: Pooled<T>) -> bool {
        self.contains_slot(handle.key())
    }

    fn contains_slot(&self, slot: PoolSlot) -> bool {
        self.own_key(slot).is_some_and(|key| self.live.contains_key(key))
    }

    /// Return a handle's instance to the free list
    ///
    /// A handle that is no longer live was already released, or was issued
    /// by another collection. Under strict checking that is an error;
    /// otherwise it is ignored.
    pub fn release(&mut self, handle: Pooled<T>, strict_check: bool) -> RuntimeResult<()> {
        self.release_slot(handle.key(), strict_check)
    }

    fn release_slot(&mut self, slot: PoolSlot, strict_check: bool) -> RuntimeResult<()> {
        let removed = self.own_key(slot).and_then(|key| self.live.remove(key));
        match removed {
            Some(value) => {
                self.put_back(value);
                Ok(())
            }
            None if strict_check => Err(RuntimeError::TypeContractViolation(format!(
                "The reference '{}' has been released or belongs to another pool",
                std::any::type_name::<T>()
            ))),
            None => {
                log::warn!(
                    "Ignoring release of '{}' that is not in use",
                    std::any::type_name::<T>()
                );
                Ok(())
            }
        }
    }

    /// Return an instance acquired by value
    pub fn release_owned(&mut self, value: T) {
        self.put_back(value);
    }

    fn put_back(&mut self, mut value: T) {
        value.clear();
        self.unused.push(value);
        self.release_count += 1;
    }

    /// Pre-warm the free list with `count` fresh instances
    pub fn add(&mut self, count: usize) {
        self.add_count += count;
        self.unused.extend(std::iter::repeat_with(T::default).take(count));
    }

    /// Drop up to `count` instances from the free list
    pub fn remove(&mut self, count: usize) {
        let count = count.min(self.unused.len());
        self.remove_count += count;
        self.unused.truncate(self.unused.len() - count);
    }

    /// Drop every instance in the free list
    pub fn remove_all(&mut self) {
        self.remove_count += self.unused.len();
        self.unused.clear();
    }

    /// Instances resting in the free list
    pub fn unused_count(&self) -> usize {
        self.unused.len()
    }

    /// Instances handed out and not yet released
    pub fn using_count(&self) -> usize {
        self.acquire_count.saturating_sub(self.release_count)
    }

    /// Cumulative acquires
    pub fn acquire_count(&self) -> usize {
        self.acquire_count
    }

    /// Cumulative releases
    pub fn release_count(&self) -> usize {
        self.release_count
    }

    /// Cumulative pre-warmed instances
    pub fn add_count(&self) -> usize {
        self.add_count
    }

    /// Cumulative instances dropped from the free list
    pub fn remove_count(&self) -> usize {
        self.remove_count
    }

    /// Counter snapshot
    pub fn info(&self) -> ReferencePoolInfo {
        ReferencePoolInfo {
            type_name: std::any::type_name::<T>(),
            unused_count: self.unused_count(),
            using_count: self.using_count(),
            acquire_count: self.acquire_count,
            release_count: self.release_count,
            add_count: self.add_count,
            remove_count: self.remove_count,
        }
    }
}

impl<T: Reference + Default> Default for PoolCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`PoolCollection`] held by the pool registry
pub(crate) trait ErasedCollection {
    fn acquire_slot(&mut self) -> PoolSlot;
    fn release_erased(&mut self, slot: PoolSlot, strict_check: bool) -> RuntimeResult<()>;
    fn contains_erased(&self, slot: PoolSlot) -> bool;
    fn add_erased(&mut self, count: usize);
    fn remove_erased(&mut self, count: usize);
    fn remove_all_erased(&mut self);
    fn info_erased(&self) -> ReferencePoolInfo;
    fn as_dyn_any(&self) -> &dyn Any;
    fn as_dyn_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Reference + Default> ErasedCollection for PoolCollection<T> {
    fn acquire_slot(&mut self) -> PoolSlot {
        self.acquire().key()
    }

    fn release_erased(&mut self, slot: PoolSlot, strict_check: bool) -> RuntimeResult<()> {
        self.release_slot(slot, strict_check)
    }

    fn contains_erased(&self, slot: PoolSlot) -> bool {
        self.contains_slot(slot)
    }

    fn add_erased(&mut self, count: usize) {
        self.add(count);
    }

    fn remove_erased(&mut self, count: usize) {
        self.remove(count);
    }

    fn remove_all_erased(&mut self) {
        self.remove_all();
    }

    fn info_erased(&self) -> ReferencePoolInfo {
        self.info()
    }

    fn as_dyn_any(&self) -> &dyn Any {
        self
    }

    fn as_dyn_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
