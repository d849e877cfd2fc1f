//! Dynamic typing helpers for runtime trait objects

use std::any::{Any, TypeId};

/// Access to the concrete type behind a trait object.
///
/// Implemented for every sized `'static` type, so pooled references, FSM
/// states and modules get it for free through their supertrait bound.
///
/// Call these methods on the trait object itself (`(**boxed).as_any()`),
/// never on the `Box`, otherwise the box type is reported.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any` for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any` for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// `TypeId` of the concrete type
    fn concrete_type_id(&self) -> TypeId;

    /// Fully qualified name of the concrete type
    fn concrete_type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn concrete_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn concrete_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Last path segment of a type name, generics stripped.
///
/// `game_runtime::fsm::tests::StateA` becomes `StateA`.
pub fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
