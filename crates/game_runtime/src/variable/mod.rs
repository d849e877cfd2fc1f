//! Poolable boxed values
//!
//! [`Variable`] is the payload type of the FSM data bag. [`Var<T>`] covers
//! the common cases; the aliases name the ones states use most.

use std::any::Any;
use std::fmt;

use crate::error::{RuntimeError, RuntimeResult};
use crate::pool::Reference;

/// A poolable boxed value
pub trait Variable: Reference {
    /// Name of the wrapped value's type
    fn value_type_name(&self) -> &'static str;

    /// Borrow the wrapped value
    fn get_value(&self) -> &dyn Any;

    /// Replace the wrapped value
    ///
    /// Fails with [`RuntimeError::TypeContractViolation`] if `value` is not
    /// of the wrapped type.
    fn set_value(&mut self, value: Box<dyn Any>) -> RuntimeResult<()>;
}

/// Generic variable holding a `T`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Var<T> {
    value: T,
}

/// Boolean variable
pub type VarBool = Var<bool>;
/// Integer variable
pub type VarInt = Var<i64>;
/// Float variable
pub type VarFloat = Var<f32>;
/// String variable
pub type VarString = Var<String>;

impl<T> Var<T> {
    /// Wrap a value
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Borrow the value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutably borrow the value
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Replace the value
    pub fn set(&mut self, value: T) {
        self.value = value;
    }
}

impl<T: Default + 'static> Reference for Var<T> {
    fn clear(&mut self) {
        self.value = T::default();
    }
}

impl<T: Default + 'static> Variable for Var<T> {
    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn get_value(&self) -> &dyn Any {
        &self.value
    }

    fn set_value(&mut self, value: Box<dyn Any>) -> RuntimeResult<()> {
        match value.downcast::<T>() {
            Ok(value) => {
                self.value = *value;
                Ok(())
            }
            Err(_) => Err(RuntimeError::TypeContractViolation(format!(
                "Variable of '{}' can not hold a value of another type",
                std::any::type_name::<T>()
            ))),
        }
    }
}

impl<T> From<T> for Var<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Display> fmt::Display for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_checks_type() {
        let mut var = VarInt::new(1);
        var.set_value(Box::new(5_i64)).unwrap();
        assert_eq!(*var.value(), 5);

        let wrong = var.set_value(Box::new("five"));
        assert!(matches!(wrong, Err(RuntimeError::TypeContractViolation(_))));
        assert_eq!(var.get_value().downcast_ref::<i64>(), Some(&5));
    }

    #[test]
    fn test_clear_restores_default() {
        let mut var = VarString::from("banned".to_string());
        var.clear();
        assert!(var.value().is_empty());
        assert_eq!(var.value_type_name(), "alloc::string::String");
    }
}
