//! Module owning every FSM in the runtime

use std::any::{type_name, Any, TypeId};
use std::rc::Weak;

use slotmap::{new_key_type, SlotMap};

use crate::error::{RuntimeError, RuntimeResult};
use crate::foundation::collections::TypedHandle;
use crate::module::Module;
use crate::pool::ReferencePool;

use super::machine::Fsm;
use super::observer::FsmObserver;
use super::state::FsmState;

new_key_type! {
    /// Slot of an FSM inside the [`FsmManager`]
    pub struct FsmKey;
}

/// Handle to an FSM owned by the [`FsmManager`]
pub type FsmHandle<O> = TypedHandle<FsmKey, Fsm<O>>;

/// Owner-erased operations the manager needs on every FSM
trait ManagedFsm: FsmObserver {
    fn owner_type(&self) -> TypeId;
    fn as_observer(&self) -> &dyn FsmObserver;
    fn as_dyn_any(&self) -> &dyn Any;
    fn as_dyn_any_mut(&mut self) -> &mut dyn Any;
    fn tick(&mut self, pool: &mut ReferencePool, elapse_seconds: f32, real_elapse_seconds: f32) -> RuntimeResult<()>;
    fn destroy(self: Box<Self>, pool: &mut ReferencePool) -> RuntimeResult<()>;
}

impl<O: 'static> ManagedFsm for Fsm<O> {
    fn owner_type(&self) -> TypeId {
        TypeId::of::<O>()
    }

    fn as_observer(&self) -> &dyn FsmObserver {
        self
    }

    fn as_dyn_any(&self) -> &dyn Any {
        self
    }

    fn as_dyn_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn tick(&mut self, pool: &mut ReferencePool, elapse_seconds: f32, real_elapse_seconds: f32) -> RuntimeResult<()> {
        self.update(pool, elapse_seconds, real_elapse_seconds)
    }

    fn destroy(self: Box<Self>, pool: &mut ReferencePool) -> RuntimeResult<()> {
        (*self).shutdown(pool)
    }
}

/// Creates, ticks and destroys FSMs
///
/// FSMs are identified by owner type plus name. The manager ticks after
/// higher priority modules such as input, and shuts down before them.
#[derive(Default)]
pub struct FsmManager {
    fsms: SlotMap<FsmKey, Box<dyn ManagedFsm>>,
}

impl FsmManager {
    /// Update priority of the manager module
    pub const PRIORITY: i32 = 1;

    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live FSMs
    pub fn count(&self) -> usize {
        self.fsms.len()
    }

    /// Create an FSM for `owner` and take ownership of it
    ///
    /// # Errors
    /// `DuplicateRegistration` when an FSM with this owner type and name
    /// exists, plus everything [`Fsm::create`] reports.
    pub fn create_fsm<O: 'static>(
        &mut self,
        pool: &mut ReferencePool,
        name: &str,
        owner: Weak<O>,
        states: Vec<Box<dyn FsmState<O>>>,
    ) -> RuntimeResult<FsmHandle<O>> {
        if self.find::<O>(name).is_some() {
            return Err(RuntimeError::DuplicateRegistration(format!(
                "Already exist FSM '{}' for {}",
                name,
                type_name::<O>()
            )));
        }

        let fsm = Fsm::create(pool, name, owner, states)?;
        let key = self.fsms.insert(Box::new(fsm));
        Ok(FsmHandle::new(key))
    }

    /// Whether an FSM with this owner type and name exists
    pub fn has_fsm<O: 'static>(&self, name: &str) -> bool {
        self.find::<O>(name).is_some()
    }

    /// Handle of the FSM with this owner type and name
    pub fn find_fsm<O: 'static>(&self, name: &str) -> Option<FsmHandle<O>> {
        self.find::<O>(name).map(FsmHandle::new)
    }

    /// Borrow a live FSM
    pub fn get_fsm<O: 'static>(&self, handle: FsmHandle<O>) -> Option<&Fsm<O>> {
        self.fsms.get(handle.key())?.as_dyn_any().downcast_ref::<Fsm<O>>()
    }

    /// Mutably borrow a live FSM
    pub fn get_fsm_mut<O: 'static>(&mut self, handle: FsmHandle<O>) -> Option<&mut Fsm<O>> {
        self.fsms.get_mut(handle.key())?.as_dyn_any_mut().downcast_mut::<Fsm<O>>()
    }

    /// Read-only views of every live FSM
    pub fn observers(&self) -> impl Iterator<Item = &dyn FsmObserver> + '_ {
        self.fsms.values().map(|fsm| fsm.as_observer())
    }

    /// Shut an FSM down and return it to the pool
    ///
    /// Returns `Ok(false)` when the handle is stale.
    pub fn destroy_fsm<O: 'static>(&mut self, pool: &mut ReferencePool, handle: FsmHandle<O>) -> RuntimeResult<bool> {
        match self.fsms.remove(handle.key()) {
            Some(fsm) => {
                fsm.destroy(pool)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Shut down the FSM with this owner type and name
    pub fn destroy_fsm_by_name<O: 'static>(&mut self, pool: &mut ReferencePool, name: &str) -> RuntimeResult<bool> {
        match self.find_fsm::<O>(name) {
            Some(handle) => self.destroy_fsm(pool, handle),
            None => Ok(false),
        }
    }

    fn find<O: 'static>(&self, name: &str) -> Option<FsmKey> {
        let owner = TypeId::of::<O>();
        self.fsms
            .iter()
            .find(|(_, fsm)| fsm.owner_type() == owner && fsm.name() == name)
            .map(|(key, _)| key)
    }
}

impl Module for FsmManager {
    fn priority(&self) -> i32 {
        Self::PRIORITY
    }

    fn update(&mut self, pool: &mut ReferencePool, elapse_seconds: f32, real_elapse_seconds: f32) -> RuntimeResult<()> {
        for fsm in self.fsms.values_mut() {
            if fsm.is_destroyed() {
                continue;
            }
            fsm.tick(pool, elapse_seconds, real_elapse_seconds)?;
        }
        Ok(())
    }

    fn shutdown(&mut self, pool: &mut ReferencePool) {
        log::debug!("Destroying {} FSMs", self.fsms.len());
        for (_, fsm) in self.fsms.drain() {
            let name = fsm.name().to_string();
            if let Err(e) = fsm.destroy(pool) {
                log::warn!("FSM '{}' reported an error while shutting down: {}", name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::FsmController;
    use std::rc::Rc;

    struct Lamp;
    struct Fan;

    #[derive(Default)]
    struct Off;
    #[derive(Default)]
    struct On;

    impl FsmState<Lamp> for Off {
        fn on_update(&mut self, fsm: &mut FsmController<'_, Lamp>, _: f32, _: f32) -> RuntimeResult<()> {
            fsm.change_state::<On>()
        }
    }
    impl FsmState<Lamp> for On {}
    impl FsmState<Fan> for Off {}

    fn lamp_states() -> Vec<Box<dyn FsmState<Lamp>>> {
        vec![Box::new(Off), Box::new(On)]
    }

    #[test]
    fn test_fsm_identity_is_owner_type_and_name() {
        let mut pool = ReferencePool::new();
        let mut manager = FsmManager::new();
        let lamp = Rc::new(Lamp);
        let fan = Rc::new(Fan);

        manager.create_fsm(&mut pool, "power", Rc::downgrade(&lamp), lamp_states()).unwrap();
        let duplicate = manager.create_fsm(&mut pool, "power", Rc::downgrade(&lamp), lamp_states());
        assert!(matches!(duplicate, Err(RuntimeError::DuplicateRegistration(_))));

        let fan_states: Vec<Box<dyn FsmState<Fan>>> = vec![Box::new(Off)];
        manager.create_fsm(&mut pool, "power", Rc::downgrade(&fan), fan_states).unwrap();

        assert_eq!(manager.count(), 2);
        assert!(manager.has_fsm::<Lamp>("power"));
        assert!(manager.has_fsm::<Fan>("power"));
        assert!(!manager.has_fsm::<Fan>("speed"));
    }

    #[test]
    fn test_update_ticks_fsms() {
        let mut pool = ReferencePool::new();
        let mut manager = FsmManager::new();
        let lamp = Rc::new(Lamp);
        let handle = manager.create_fsm(&mut pool, "power", Rc::downgrade(&lamp), lamp_states()).unwrap();
        manager.get_fsm_mut(handle).unwrap().start::<Off>(&mut pool).unwrap();

        manager.update(&mut pool, 0.1, 0.1).unwrap();

        let fsm = manager.get_fsm(handle).unwrap();
        assert_eq!(fsm.current_state_type().map(|t| t.short_name()), Some("On"));
        assert_eq!(manager.find_fsm::<Lamp>("power"), Some(handle));
        assert_eq!(manager.observers().filter(|o| o.is_running()).count(), 1);
    }

    #[test]
    fn test_destroy_returns_fsm_to_pool() {
        let mut pool = ReferencePool::new();
        let mut manager = FsmManager::new();
        let lamp = Rc::new(Lamp);
        let handle = manager.create_fsm(&mut pool, "power", Rc::downgrade(&lamp), lamp_states()).unwrap();

        assert!(manager.destroy_fsm(&mut pool, handle).unwrap());
        assert!(!manager.destroy_fsm(&mut pool, handle).unwrap());
        assert!(manager.get_fsm(handle).is_none());
        assert_eq!(pool.info::<Fsm<Lamp>>().unwrap().unused_count, 1);
    }

    #[test]
    fn test_destroy_by_name_matches_owner_type() {
        let mut pool = ReferencePool::new();
        let mut manager = FsmManager::new();
        let lamp = Rc::new(Lamp);
        let fan = Rc::new(Fan);
        manager.create_fsm(&mut pool, "power", Rc::downgrade(&lamp), lamp_states()).unwrap();
        let fan_states: Vec<Box<dyn FsmState<Fan>>> = vec![Box::new(Off)];
        manager.create_fsm(&mut pool, "power", Rc::downgrade(&fan), fan_states).unwrap();

        assert!(manager.destroy_fsm_by_name::<Lamp>(&mut pool, "power").unwrap());
        assert!(!manager.destroy_fsm_by_name::<Lamp>(&mut pool, "power").unwrap());
        assert!(!manager.has_fsm::<Lamp>("power"));
        assert!(manager.has_fsm::<Fan>("power"));
        assert_eq!(pool.info::<Fsm<Lamp>>().unwrap().unused_count, 1);
    }

    #[test]
    fn test_shutdown_destroys_everything() {
        let mut pool = ReferencePool::new();
        let mut manager = FsmManager::new();
        let lamp = Rc::new(Lamp);
        manager.create_fsm(&mut pool, "a", Rc::downgrade(&lamp), lamp_states()).unwrap();
        manager.create_fsm(&mut pool, "b", Rc::downgrade(&lamp), lamp_states()).unwrap();

        manager.shutdown(&mut pool);

        assert_eq!(manager.count(), 0);
        let info = pool.info::<Fsm<Lamp>>().unwrap();
        assert_eq!(info.using_count, 0);
        assert_eq!(info.unused_count, 2);
    }
}
