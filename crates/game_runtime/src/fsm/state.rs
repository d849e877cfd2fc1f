//! FSM state behavior

use std::any::TypeId;
use std::fmt;

use crate::error::RuntimeResult;
use crate::foundation::any::{short_type_name, AsAny};

use super::controller::FsmController;

/// One state of an [`Fsm`](super::Fsm) owned by an `O`
///
/// Every hook receives the controller of the FSM currently driving the
/// state. Do not keep it; it is only valid for the duration of the call.
/// An error returned from a hook aborts the FSM operation in progress and
/// reaches whoever started it.
#[allow(unused_variables)]
pub trait FsmState<O: 'static>: AsAny {
    /// Called once when the FSM is created, whether or not the state ever runs
    fn on_init(&mut self, fsm: &mut FsmController<'_, O>) -> RuntimeResult<()> {
        Ok(())
    }

    /// Called when the state becomes current
    fn on_enter(&mut self, fsm: &mut FsmController<'_, O>) -> RuntimeResult<()> {
        Ok(())
    }

    /// Called every tick while the state is current
    fn on_update(
        &mut self,
        fsm: &mut FsmController<'_, O>,
        elapse_seconds: f32,
        real_elapse_seconds: f32,
    ) -> RuntimeResult<()> {
        Ok(())
    }

    /// Called when the state stops being current
    ///
    /// `is_shutdown` is true when the FSM is being cleared rather than
    /// transitioning.
    fn on_leave(&mut self, fsm: &mut FsmController<'_, O>, is_shutdown: bool) -> RuntimeResult<()> {
        Ok(())
    }

    /// Called once when the FSM is cleared
    fn on_destroy(&mut self, fsm: &mut FsmController<'_, O>) -> RuntimeResult<()> {
        Ok(())
    }
}

/// Runtime token naming a concrete state type
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateType {
    id: TypeId,
    name: &'static str,
}

impl StateType {
    /// Token for `S`
    pub fn of<S: 'static>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    pub(crate) fn of_state<O: 'static>(state: &dyn FsmState<O>) -> Self {
        Self {
            id: state.concrete_type_id(),
            name: state.concrete_type_name(),
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

    /// Type name without its module path
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.name)
    }
}

impl fmt::Debug for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateType({})", self.short_name())
    }
}

impl fmt::Display for StateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
