//! Capability handed to state hooks

use std::rc::Rc;

use crate::error::RuntimeResult;
use crate::pool::{Pooled, ReferencePool};
use crate::variable::{Var, Variable};

use super::machine::FsmCore;
use super::observer::FsmObserver;
use super::state::{FsmState, StateType};

/// Controlling view of an FSM, valid only for the duration of one state hook
///
/// Only the FSM constructs controllers, so state transitions can only be
/// requested from inside a hook. A requested transition is validated on
/// the spot and performed once the requesting hook returns, in request
/// order.
pub struct FsmController<'a, O: 'static> {
    core: &'a mut FsmCore<O>,
    pool: &'a mut ReferencePool,
}

impl<'a, O: 'static> FsmController<'a, O> {
    pub(crate) fn new(core: &'a mut FsmCore<O>, pool: &'a mut ReferencePool) -> Self {
        Self { core, pool }
    }

    /// The owner, if it is still alive
    pub fn owner(&self) -> Option<Rc<O>> {
        self.core.owner.upgrade()
    }

    /// Shared reference pool
    pub fn pool(&self) -> &ReferencePool {
        &*self.pool
    }

    /// Shared reference pool, mutably
    pub fn pool_mut(&mut self) -> &mut ReferencePool {
        &mut *self.pool
    }

    /// Whether `S` is registered with this FSM
    pub fn has_state<S: FsmState<O>>(&self) -> bool {
        self.core.index_of(StateType::of::<S>()).is_some()
    }

    /// Request a transition to `S`
    pub fn change_state<S: FsmState<O>>(&mut self) -> RuntimeResult<()> {
        self.change_state_to(StateType::of::<S>())
    }

    /// Request a transition to the state named by `state_type`
    ///
    /// # Errors
    /// `InvalidState` when the FSM is not running or the state is not
    /// registered. Nothing is queued in that case.
    pub fn change_state_to(&mut self, state_type: StateType) -> RuntimeResult<()> {
        let target = self.core.resolve_transition(state_type)?;
        self.core.pending.push_back(target);
        Ok(())
    }

    /// Whether data named `name` exists
    pub fn has_data(&self, name: &str) -> RuntimeResult<bool> {
        self.core.data.has(name)
    }

    /// Data named `name`
    pub fn get_data<V: Variable + Default>(&self, name: &str) -> RuntimeResult<Option<&V>> {
        self.core.data.get(&*self.pool, name)
    }

    /// Value of the `Var<T>` named `name`
    pub fn get_var<T: Default + 'static>(&self, name: &str) -> RuntimeResult<Option<&T>> {
        Ok(self.get_data::<Var<T>>(name)?.map(Var::value))
    }

    /// Store `data` under `name`, releasing any previous value
    pub fn set_data<V: Variable + Default>(&mut self, name: &str, data: Pooled<V>) -> RuntimeResult<()> {
        self.core.data.set(&mut *self.pool, name, data)
    }

    /// Acquire a `Var<T>` holding `value` and store it under `name`
    pub fn set_var<T: Default + 'static>(&mut self, name: &str, value: T) -> RuntimeResult<Pooled<Var<T>>> {
        self.core.data.set_var(&mut *self.pool, name, value)
    }

    /// Remove and release the data named `name`
    pub fn remove_data(&mut self, name: &str) -> RuntimeResult<bool> {
        self.core.data.remove(&mut *self.pool, name)
    }
}

impl<O: 'static> FsmObserver for FsmController<'_, O> {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn owner_type_name(&self) -> &'static str {
        self.core.owner_type_name()
    }

    fn state_count(&self) -> usize {
        self.core.state_count()
    }

    fn is_running(&self) -> bool {
        self.core.is_running()
    }

    fn is_destroyed(&self) -> bool {
        self.core.is_destroyed()
    }

    fn current_state_type(&self) -> Option<StateType> {
        self.core.current_state_type()
    }

    fn current_state_time(&self) -> f32 {
        self.core.current_state_time()
    }
}
