//! FSM data bag

use std::collections::HashMap;

use crate::error::{RuntimeError, RuntimeResult};
use crate::pool::{ErasedHandle, Pooled, ReferencePool};
use crate::variable::{Var, Variable};

/// String-keyed store of pooled variables scoped to one FSM
///
/// The bag owns every handle it holds: a value is released to the pool as
/// soon as it is replaced, removed, or the bag is cleared.
#[derive(Default)]
pub(crate) struct DataBag {
    entries: Option<HashMap<String, ErasedHandle>>,
}

fn check_name(name: &str) -> RuntimeResult<()> {
    if name.is_empty() {
        return Err(RuntimeError::InvalidArgument("Data name is invalid".to_string()));
    }
    Ok(())
}

impl DataBag {
    pub(crate) fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, HashMap::len)
    }

    pub(crate) fn has(&self, name: &str) -> RuntimeResult<bool> {
        check_name(name)?;
        Ok(self.entries.as_ref().is_some_and(|e| e.contains_key(name)))
    }

    pub(crate) fn handle(&self, name: &str) -> RuntimeResult<Option<ErasedHandle>> {
        check_name(name)?;
        Ok(self.entries.as_ref().and_then(|e| e.get(name).copied()))
    }

    pub(crate) fn get<'p, V: Variable + Default>(
        &self,
        pool: &'p ReferencePool,
        name: &str,
    ) -> RuntimeResult<Option<&'p V>> {
        let Some(handle) = self.handle(name)? else {
            return Ok(None);
        };
        let typed = handle.downcast::<V>().ok_or_else(|| {
            RuntimeError::TypeContractViolation(format!(
                "Data '{}' holds '{}', not '{}'",
                name,
                handle.type_name(),
                std::any::type_name::<V>()
            ))
        })?;
        Ok(pool.get(typed))
    }

    pub(crate) fn set<V: Variable + Default>(
        &mut self,
        pool: &mut ReferencePool,
        name: &str,
        data: Pooled<V>,
    ) -> RuntimeResult<()> {
        check_name(name)?;
        if pool.get(data).is_none() {
            return Err(RuntimeError::InvalidArgument(format!(
                "Data '{}' is not a live pooled variable",
                name
            )));
        }

        let data = ErasedHandle::from(data);
        let previous = self
            .entries
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), data);

        match previous {
            Some(previous) if previous != data => pool.release_erased(previous),
            _ => Ok(()),
        }
    }

    pub(crate) fn set_var<T: Default + 'static>(
        &mut self,
        pool: &mut ReferencePool,
        name: &str,
        value: T,
    ) -> RuntimeResult<Pooled<Var<T>>> {
        check_name(name)?;
        let handle = pool.acquire::<Var<T>>();
        if let Some(var) = pool.get_mut(handle) {
            var.set(value);
        }
        if let Err(e) = self.set(pool, name, handle) {
            pool.release(handle)?;
            return Err(e);
        }
        Ok(handle)
    }

    pub(crate) fn remove(&mut self, pool: &mut ReferencePool, name: &str) -> RuntimeResult<bool> {
        check_name(name)?;
        let removed = self.entries.as_mut().and_then(|e| e.remove(name));
        match removed {
            Some(handle) => {
                pool.release_erased(handle)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Release every value; failures are logged so teardown always completes
    pub(crate) fn release_all(&mut self, pool: &mut ReferencePool) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        for (name, handle) in entries.drain() {
            if let Err(e) = pool.release_erased(handle) {
                log::warn!("Failed to release FSM data '{}': {}", name, e);
            }
        }
    }
}
