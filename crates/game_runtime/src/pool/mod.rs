//! Reference pooling
//!
//! Recycles short-lived objects by type. Payloads implement [`Reference`]
//! and `Default`; the [`ReferencePool`] keeps one [`PoolCollection`] per
//! payload type.

mod collection;
mod info;
mod reference;
mod reference_pool;

pub use collection::PoolCollection;
pub use info::ReferencePoolInfo;
pub use reference::{CollectionId, ErasedHandle, PoolKey, PoolSlot, Pooled, Reference, ReferenceType};
pub use reference_pool::ReferencePool;
