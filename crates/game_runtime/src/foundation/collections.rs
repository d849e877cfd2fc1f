//! Specialized collection types

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use slotmap::{SlotMap, Key};

/// Typed handle over a key
///
/// Usually a versioned slot-map key, so a handle whose slot was freed never
/// resolves again, even after the slot is reused for a new value. `T` only
/// tags the handle; it is not stored.
pub struct TypedHandle<K, T: ?Sized> {
    key: K,
    _phantom: PhantomData<fn() -> T>,
}

impl<K: Copy + Eq + Hash + fmt::Debug, T: ?Sized> TypedHandle<K, T> {
    /// Create a new typed handle from a key
    pub fn new(key: K) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> K {
        self.key
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug, T: ?Sized> Clone for TypedHandle<K, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug, T: ?Sized> Copy for TypedHandle<K, T> {}

impl<K: Copy + Eq + Hash + fmt::Debug, T: ?Sized> PartialEq for TypedHandle<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug, T: ?Sized> Eq for TypedHandle<K, T> {}

impl<K: Copy + Eq + Hash + fmt::Debug, T: ?Sized> Hash for TypedHandle<K, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug, T: ?Sized> fmt::Debug for TypedHandle<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedHandle")
            .field("key", &self.key)
            .field("type", &crate::foundation::any::short_type_name(std::any::type_name::<T>()))
            .finish()
    }
}
