//! Finite state machine owned by an arbitrary object

use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::error::{RuntimeError, RuntimeResult};
use crate::pool::{ErasedHandle, Pooled, Reference, ReferencePool};
use crate::variable::{Var, Variable};

use super::controller::FsmController;
use super::data::DataBag;
use super::observer::FsmObserver;
use super::state::{FsmState, StateType};

/// Everything about an FSM except its state objects
///
/// Kept apart from the states so a state hook can borrow the rest of the
/// machine through an [`FsmController`] while the state itself is borrowed.
pub(crate) struct FsmCore<O: 'static> {
    name: String,
    pub(crate) owner: Weak<O>,
    state_types: Vec<StateType>,
    current: Option<usize>,
    current_time: f32,
    pub(crate) data: DataBag,
    destroyed: bool,
    pub(crate) pending: VecDeque<usize>,
}

impl<O: 'static> Default for FsmCore<O> {
    fn default() -> Self {
        Self {
            name: String::new(),
            owner: Weak::new(),
            state_types: Vec::new(),
            current: None,
            current_time: 0.0,
            data: DataBag::default(),
            destroyed: true,
            pending: VecDeque::new(),
        }
    }
}

impl<O: 'static> FsmCore<O> {
    pub(crate) fn index_of(&self, state_type: StateType) -> Option<usize> {
        self.state_types.iter().position(|t| *t == state_type)
    }

    /// Validate a transition request without changing anything
    pub(crate) fn resolve_transition(&self, target: StateType) -> RuntimeResult<usize> {
        if self.current.is_none() {
            return Err(RuntimeError::InvalidState(format!(
                "FSM '{}' is not running, can not change state",
                self.name
            )));
        }
        self.index_of(target).ok_or_else(|| {
            RuntimeError::InvalidState(format!(
                "FSM '{}' can not change state to '{}' which is not registered",
                self.name, target
            ))
        })
    }

    fn state_name(&self, index: usize) -> &'static str {
        self.state_types[index].short_name()
    }
}

impl<O: 'static> FsmObserver for FsmCore<O> {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner_type_name(&self) -> &'static str {
        std::any::type_name::<O>()
    }

    fn state_count(&self) -> usize {
        self.state_types.len()
    }

    fn is_running(&self) -> bool {
        self.current.is_some()
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn current_state_type(&self) -> Option<StateType> {
        self.current.map(|index| self.state_types[index])
    }

    fn current_state_time(&self) -> f32 {
        self.current_time
    }
}

/// Finite state machine driving an owner of type `O`
///
/// FSMs live in the [`ReferencePool`]: [`create`](Self::create) acquires one
/// and [`shutdown`](Self::shutdown) clears it and hands it back.
///
/// ```
/// use std::rc::Rc;
/// use game_runtime::fsm::{Fsm, FsmController, FsmObserver, FsmState};
/// use game_runtime::pool::ReferencePool;
/// use game_runtime::RuntimeResult;
///
/// struct Door;
///
/// #[derive(Default)]
/// struct Closed;
/// #[derive(Default)]
/// struct Open;
///
/// impl FsmState<Door> for Closed {
///     fn on_update(&mut self, fsm: &mut FsmController<'_, Door>, _: f32, _: f32) -> RuntimeResult<()> {
///         fsm.change_state::<Open>()
///     }
/// }
/// impl FsmState<Door> for Open {}
///
/// let mut pool = ReferencePool::new();
/// let door = Rc::new(Door);
/// let mut fsm = Fsm::create(&mut pool, "door", Rc::downgrade(&door), vec![
///     Box::new(Closed) as Box<dyn FsmState<Door>>,
///     Box::new(Open),
/// ])?;
///
/// fsm.start::<Closed>(&mut pool)?;
/// fsm.update(&mut pool, 0.016, 0.016)?;
/// assert_eq!(fsm.current_state_type().map(|t| t.short_name()), Some("Open"));
///
/// fsm.shutdown(&mut pool)?;
/// # Ok::<(), game_runtime::RuntimeError>(())
/// ```
pub struct Fsm<O: 'static> {
    core: FsmCore<O>,
    states: Vec<Box<dyn FsmState<O>>>,
}

impl<O: 'static> Default for Fsm<O> {
    fn default() -> Self {
        Self {
            core: FsmCore::default(),
            states: Vec::new(),
        }
    }
}

impl<O: 'static> Reference for Fsm<O> {
    fn clear(&mut self) {
        if !self.core.destroyed {
            log::warn!(
                "FSM '{}' returned to the pool without being cleared",
                self.core.name
            );
        }
        *self = Self::default();
    }
}

impl<O: 'static> Fsm<O> {
    /// Acquire an FSM from `pool` and initialize `states` in order
    ///
    /// # Errors
    /// * `InvalidArgument` when the owner is gone or `states` is empty
    /// * `DuplicateRegistration` when two states share a concrete type; no
    ///   state has been initialized at that point
    /// * any error returned by `on_init`; the FSM is cleared and released
    ///   before it is propagated
    pub fn create(
        pool: &mut ReferencePool,
        name: impl Into<String>,
        owner: Weak<O>,
        states: Vec<Box<dyn FsmState<O>>>,
    ) -> RuntimeResult<Self> {
        let name = name.into();
        if owner.strong_count() == 0 {
            return Err(RuntimeError::InvalidArgument(format!(
                "FSM '{}' owner is invalid",
                name
            )));
        }
        if states.is_empty() {
            return Err(RuntimeError::InvalidArgument(format!(
                "FSM '{}' states is invalid",
                name
            )));
        }

        let mut state_types: Vec<StateType> = Vec::with_capacity(states.len());
        for state in &states {
            let state_type = StateType::of_state(&**state);
            if state_types.contains(&state_type) {
                return Err(RuntimeError::DuplicateRegistration(format!(
                    "FSM '{}' state '{}' is already registered",
                    name, state_type
                )));
            }
            state_types.push(state_type);
        }

        let mut fsm = pool.acquire_owned::<Self>();
        fsm.core.name = name;
        fsm.core.owner = owner;
        fsm.core.state_types = state_types;
        fsm.core.destroyed = false;
        fsm.states = states;

        for index in 0..fsm.states.len() {
            if let Err(e) = fsm.invoke(pool, index, |state, ctl| state.on_init(ctl)) {
                log::error!("FSM '{}' failed to initialize: {}", fsm.core.name, e);
                if let Err(teardown) = fsm.shutdown(pool) {
                    log::warn!("Error while tearing down half-built FSM: {}", teardown);
                }
                return Err(e);
            }
        }
        // Nothing is running yet, so init hooks could not queue transitions.
        fsm.core.pending.clear();

        log::debug!(
            "Created FSM '{}' for {} with {} states",
            fsm.core.name,
            std::any::type_name::<O>(),
            fsm.states.len()
        );
        Ok(fsm)
    }

    /// The owner, if it is still alive
    pub fn owner(&self) -> Option<Rc<O>> {
        self.core.owner.upgrade()
    }

    /// Registered state types in registration order
    pub fn state_types(&self) -> &[StateType] {
        &self.core.state_types
    }

    /// Whether `S` is registered
    pub fn has_state<S: FsmState<O>>(&self) -> bool {
        self.has_state_type(StateType::of::<S>())
    }

    /// Whether the state named by `state_type` is registered
    pub fn has_state_type(&self, state_type: StateType) -> bool {
        self.core.index_of(state_type).is_some()
    }

    /// Registered state of type `S`
    pub fn get_state<S: FsmState<O>>(&self) -> Option<&S> {
        let index = self.core.index_of(StateType::of::<S>())?;
        (*self.states[index]).as_any().downcast_ref::<S>()
    }

    /// Registered state of type `S`, mutably
    pub fn get_state_mut<S: FsmState<O>>(&mut self) -> Option<&mut S> {
        let index = self.core.index_of(StateType::of::<S>())?;
        (*self.states[index]).as_any_mut().downcast_mut::<S>()
    }

    /// Start in state `S`
    pub fn start<S: FsmState<O>>(&mut self, pool: &mut ReferencePool) -> RuntimeResult<()> {
        self.start_by_type(pool, StateType::of::<S>())
    }

    /// Start in the state named by `state_type`
    ///
    /// # Errors
    /// `InvalidState` when already running or the state is not registered.
    pub fn start_by_type(
        &mut self,
        pool: &mut ReferencePool,
        state_type: StateType,
    ) -> RuntimeResult<()> {
        if self.core.current.is_some() {
            return Err(RuntimeError::InvalidState(format!(
                "FSM '{}' is running, can not start again",
                self.core.name
            )));
        }
        let index = self.core.index_of(state_type).ok_or_else(|| {
            RuntimeError::InvalidState(format!(
                "FSM '{}' can not start state '{}' which is not registered",
                self.core.name, state_type
            ))
        })?;

        log::debug!("FSM '{}' starting in {}", self.core.name, self.core.state_name(index));
        self.core.current_time = 0.0;
        self.core.current = Some(index);
        self.run_hook(pool, index, |state, ctl| state.on_enter(ctl))?;
        self.apply_pending(pool)
    }

    /// Advance the current state
    pub fn update(
        &mut self,
        pool: &mut ReferencePool,
        elapse_seconds: f32,
        real_elapse_seconds: f32,
    ) -> RuntimeResult<()> {
        let Some(current) = self.core.current else {
            return Ok(());
        };
        self.core.current_time += elapse_seconds;
        self.run_hook(pool, current, |state, ctl| {
            state.on_update(ctl, elapse_seconds, real_elapse_seconds)
        })?;
        self.apply_pending(pool)
    }

    /// Tear the FSM down
    ///
    /// Leaves the current state, destroys every state in registration
    /// order, releases all data and resets the FSM to its destroyed
    /// defaults. Teardown always completes; the first hook error, if any,
    /// is returned afterwards.
    pub fn clear(&mut self, pool: &mut ReferencePool) -> RuntimeResult<()> {
        let mut first_error = None;
        self.core.pending.clear();

        if let Some(current) = self.core.current {
            if let Err(e) = self.invoke(pool, current, |state, ctl| state.on_leave(ctl, true)) {
                log::warn!("FSM '{}' state leave failed during clear: {}", self.core.name, e);
                first_error.get_or_insert(e);
            }
        }
        for index in 0..self.states.len() {
            if let Err(e) = self.invoke(pool, index, |state, ctl| state.on_destroy(ctl)) {
                log::warn!("FSM '{}' state destroy failed during clear: {}", self.core.name, e);
                first_error.get_or_insert(e);
            }
        }

        self.core.data.release_all(pool);
        self.states.clear();
        self.core = FsmCore::default();

        first_error.map_or(Ok(()), Err)
    }

    /// Clear the FSM and return it to `pool`
    pub fn shutdown(mut self, pool: &mut ReferencePool) -> RuntimeResult<()> {
        log::debug!("Shutting down FSM '{}'", self.core.name);
        let result = self.clear(pool);
        pool.release_owned(self);
        result
    }

    /// Whether data named `name` exists
    pub fn has_data(&self, name: &str) -> RuntimeResult<bool> {
        self.core.data.has(name)
    }

    /// Number of stored data entries
    pub fn data_count(&self) -> usize {
        self.core.data.len()
    }

    /// Type-erased handle of the data named `name`
    pub fn data_handle(&self, name: &str) -> RuntimeResult<Option<ErasedHandle>> {
        self.core.data.handle(name)
    }

    /// Data named `name`
    ///
    /// # Errors
    /// `TypeContractViolation` when the stored value is not a `V`.
    pub fn get_data<'p, V: Variable + Default>(
        &self,
        pool: &'p ReferencePool,
        name: &str,
    ) -> RuntimeResult<Option<&'p V>> {
        self.core.data.get(pool, name)
    }

    /// Value of the `Var<T>` named `name`
    pub fn get_var<'p, T: Default + 'static>(
        &self,
        pool: &'p ReferencePool,
        name: &str,
    ) -> RuntimeResult<Option<&'p T>> {
        Ok(self.get_data::<Var<T>>(pool, name)?.map(Var::value))
    }

    /// Store `data` under `name`; the FSM takes over releasing it
    pub fn set_data<V: Variable + Default>(
        &mut self,
        pool: &mut ReferencePool,
        name: &str,
        data: Pooled<V>,
    ) -> RuntimeResult<()> {
        self.core.data.set(pool, name, data)
    }

    /// Acquire a `Var<T>` holding `value` and store it under `name`
    pub fn set_var<T: Default + 'static>(
        &mut self,
        pool: &mut ReferencePool,
        name: &str,
        value: T,
    ) -> RuntimeResult<Pooled<Var<T>>> {
        self.core.data.set_var(pool, name, value)
    }

    /// Remove and release the data named `name`
    pub fn remove_data(&mut self, pool: &mut ReferencePool, name: &str) -> RuntimeResult<bool> {
        self.core.data.remove(pool, name)
    }

    fn invoke<F>(&mut self, pool: &mut ReferencePool, index: usize, hook: F) -> RuntimeResult<()>
    where
        F: FnOnce(&mut dyn FsmState<O>, &mut FsmController<'_, O>) -> RuntimeResult<()>,
    {
        let mut controller = FsmController::new(&mut self.core, pool);
        hook(&mut *self.states[index], &mut controller)
    }

    /// Run a hook; a failing hook drops any transitions it queued
    fn run_hook<F>(&mut self, pool: &mut ReferencePool, index: usize, hook: F) -> RuntimeResult<()>
    where
        F: FnOnce(&mut dyn FsmState<O>, &mut FsmController<'_, O>) -> RuntimeResult<()>,
    {
        let result = self.invoke(pool, index, hook);
        if result.is_err() {
            self.core.pending.clear();
        }
        result
    }

    fn apply_pending(&mut self, pool: &mut ReferencePool) -> RuntimeResult<()> {
        while let Some(target) = self.core.pending.pop_front() {
            self.transition(pool, target)?;
        }
        Ok(())
    }

    fn transition(&mut self, pool: &mut ReferencePool, target: usize) -> RuntimeResult<()> {
        let Some(current) = self.core.current else {
            return Err(RuntimeError::InvalidState(format!(
                "FSM '{}' is not running, can not change state",
                self.core.name
            )));
        };
        log::debug!(
            "FSM '{}': {} -> {}",
            self.core.name,
            self.core.state_name(current),
            self.core.state_name(target)
        );

        self.run_hook(pool, current, |state, ctl| state.on_leave(ctl, false))?;
        self.core.current_time = 0.0;
        self.core.current = Some(target);
        self.run_hook(pool, target, |state, ctl| state.on_enter(ctl))
    }
}

impl<O: 'static> FsmObserver for Fsm<O> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VarString;
    use approx::assert_relative_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Hero {
        log: RefCell<Vec<String>>,
    }

    impl Hero {
        fn take_log(&self) -> Vec<String> {
            self.log.borrow_mut().drain(..).collect()
        }
    }

    fn record(fsm: &FsmController<'_, Hero>, event: &str) {
        if let Some(owner) = fsm.owner() {
            owner.log.borrow_mut().push(event.to_string());
        }
    }

    /// Idles for one second, then walks
    #[derive(Default)]
    struct Idle {
        updates: u32,
    }

    impl FsmState<Hero> for Idle {
        fn on_init(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            record(fsm, "Idle.init");
            Ok(())
        }

        fn on_enter(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            record(fsm, "Idle.enter");
            Ok(())
        }

        fn on_update(&mut self, fsm: &mut FsmController<'_, Hero>, _: f32, _: f32) -> RuntimeResult<()> {
            self.updates += 1;
            record(fsm, "Idle.update");
            if fsm.current_state_time() >= 1.0 {
                fsm.change_state::<Walk>()?;
            }
            Ok(())
        }

        fn on_leave(&mut self, fsm: &mut FsmController<'_, Hero>, is_shutdown: bool) -> RuntimeResult<()> {
            record(fsm, &format!("Idle.leave({})", is_shutdown));
            Ok(())
        }

        fn on_destroy(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            record(fsm, "Idle.destroy");
            Ok(())
        }
    }

    #[derive(Default)]
    struct Walk;

    impl FsmState<Hero> for Walk {
        fn on_init(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            record(fsm, "Walk.init");
            Ok(())
        }

        fn on_enter(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            record(fsm, "Walk.enter");
            Ok(())
        }

        fn on_leave(&mut self, fsm: &mut FsmController<'_, Hero>, is_shutdown: bool) -> RuntimeResult<()> {
            record(fsm, &format!("Walk.leave({})", is_shutdown));
            Ok(())
        }

        fn on_destroy(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            record(fsm, "Walk.destroy");
            Ok(())
        }
    }

    /// Never registered with any FSM
    #[derive(Default)]
    struct Swim;

    impl FsmState<Hero> for Swim {}

    #[derive(Default)]
    struct Broken;

    impl FsmState<Hero> for Broken {
        fn on_init(&mut self, _: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            Err(RuntimeError::NotFound("missing animation".to_string()))
        }

        fn on_destroy(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            record(fsm, "Broken.destroy");
            Ok(())
        }
    }

    /// Queues a transition, then fails
    #[derive(Default)]
    struct Stumble;

    impl FsmState<Hero> for Stumble {
        fn on_update(&mut self, fsm: &mut FsmController<'_, Hero>, _: f32, _: f32) -> RuntimeResult<()> {
            fsm.change_state::<Walk>()?;
            Err(RuntimeError::InvalidState("tripped".to_string()))
        }
    }

    /// Requests whatever transition the test hands it, keeping the outcome
    #[derive(Default)]
    struct Trigger {
        request: Option<StateType>,
        outcome: Option<RuntimeResult<()>>,
        init_outcome: Option<RuntimeResult<()>>,
    }

    impl FsmState<Hero> for Trigger {
        fn on_init(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            self.init_outcome = Some(fsm.change_state::<Walk>());
            Ok(())
        }

        fn on_enter(&mut self, fsm: &mut FsmController<'_, Hero>) -> RuntimeResult<()> {
            record(fsm, "Trigger.enter");
            Ok(())
        }

        fn on_update(&mut self, fsm: &mut FsmController<'_, Hero>, _: f32, _: f32) -> RuntimeResult<()> {
            if let Some(target) = self.request.take() {
                self.outcome = Some(fsm.change_state_to(target));
            }
            Ok(())
        }

        fn on_leave(&mut self, fsm: &mut FsmController<'_, Hero>, is_shutdown: bool) -> RuntimeResult<()> {
            record(fsm, &format!("Trigger.leave({})", is_shutdown));
            Ok(())
        }
    }

    fn create_trigger_fsm(pool: &mut ReferencePool, hero: &Rc<Hero>) -> Fsm<Hero> {
        let states: Vec<Box<dyn FsmState<Hero>>> = vec![Box::new(Trigger::default()), Box::new(Walk)];
        Fsm::create(pool, "hero", Rc::downgrade(hero), states).unwrap()
    }

    fn hero_states() -> Vec<Box<dyn FsmState<Hero>>> {
        vec![Box::new(Idle::default()), Box::new(Walk)]
    }

    fn create_hero_fsm(pool: &mut ReferencePool, hero: &Rc<Hero>) -> Fsm<Hero> {
        Fsm::create(pool, "hero", Rc::downgrade(hero), hero_states()).unwrap()
    }

    #[test]
    fn test_create_rejects_dead_owner_and_empty_states() {
        let mut pool = ReferencePool::new();
        let dead = Rc::downgrade(&Rc::new(Hero::default()));
        assert!(matches!(
            Fsm::create(&mut pool, "hero", dead, hero_states()),
            Err(RuntimeError::InvalidArgument(_))
        ));

        let hero = Rc::new(Hero::default());
        assert!(matches!(
            Fsm::create(&mut pool, "hero", Rc::downgrade(&hero), Vec::new()),
            Err(RuntimeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_rejects_duplicate_states_before_init() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let states: Vec<Box<dyn FsmState<Hero>>> = vec![Box::new(Walk), Box::new(Idle::default()), Box::new(Walk)];

        let result = Fsm::create(&mut pool, "hero", Rc::downgrade(&hero), states);

        assert!(matches!(result, Err(RuntimeError::DuplicateRegistration(_))));
        assert!(hero.take_log().is_empty());
    }

    #[test]
    fn test_create_initializes_states_in_order() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let fsm = create_hero_fsm(&mut pool, &hero);

        assert_eq!(hero.take_log(), vec!["Idle.init", "Walk.init"]);
        assert_eq!(fsm.name(), "hero");
        assert_eq!(fsm.state_count(), 2);
        assert!(!fsm.is_running());
        assert!(!fsm.is_destroyed());
        assert!(fsm.has_state::<Walk>());
        assert!(!fsm.has_state::<Swim>());
        assert!(fsm.owner_type_name().ends_with("Hero"));
    }

    #[test]
    fn test_failed_init_returns_fsm_to_pool() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let states: Vec<Box<dyn FsmState<Hero>>> = vec![Box::new(Walk), Box::new(Broken)];

        let result = Fsm::create(&mut pool, "hero", Rc::downgrade(&hero), states);

        assert!(matches!(result, Err(RuntimeError::NotFound(_))));
        assert_eq!(hero.take_log(), vec!["Walk.init", "Walk.destroy", "Broken.destroy"]);
        let info = pool.info::<Fsm<Hero>>().unwrap();
        assert_eq!(info.unused_count, 1);
        assert_eq!(info.using_count, 0);
    }

    #[test]
    fn test_start_guards() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_hero_fsm(&mut pool, &hero);

        assert!(matches!(fsm.start::<Swim>(&mut pool), Err(RuntimeError::InvalidState(_))));
        assert!(!fsm.is_running());

        fsm.start::<Idle>(&mut pool).unwrap();
        assert_eq!(fsm.current_state_type(), Some(StateType::of::<Idle>()));
        assert!(matches!(fsm.start::<Walk>(&mut pool), Err(RuntimeError::InvalidState(_))));
        assert_eq!(fsm.current_state_type(), Some(StateType::of::<Idle>()));
    }

    #[test]
    fn test_change_state_requires_running_fsm() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let fsm = create_trigger_fsm(&mut pool, &hero);

        let outcome = fsm.get_state::<Trigger>().and_then(|s| s.init_outcome.as_ref());
        assert!(matches!(outcome, Some(Err(RuntimeError::InvalidState(_)))));
        assert!(hero.take_log().is_empty());
        assert!(!fsm.is_running());
    }

    #[test]
    fn test_failed_transition_leaves_fsm_unchanged() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_trigger_fsm(&mut pool, &hero);
        fsm.start::<Trigger>(&mut pool).unwrap();
        fsm.update(&mut pool, 0.25, 0.25).unwrap();
        hero.take_log();

        fsm.get_state_mut::<Trigger>().unwrap().request = Some(StateType::of::<Swim>());
        fsm.update(&mut pool, 0.25, 0.25).unwrap();

        let outcome = fsm.get_state::<Trigger>().and_then(|s| s.outcome.as_ref());
        assert!(matches!(outcome, Some(Err(RuntimeError::InvalidState(_)))));
        assert!(hero.take_log().is_empty());
        assert_eq!(fsm.current_state_type(), Some(StateType::of::<Trigger>()));
        assert_relative_eq!(fsm.current_state_time(), 0.5);
    }

    #[test]
    fn test_update_drives_requested_transition() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_hero_fsm(&mut pool, &hero);
        fsm.start::<Idle>(&mut pool).unwrap();
        hero.take_log();

        fsm.update(&mut pool, 0.5, 0.5).unwrap();
        assert_eq!(fsm.current_state_type(), Some(StateType::of::<Idle>()));
        assert_relative_eq!(fsm.current_state_time(), 0.5);

        fsm.update(&mut pool, 0.6, 0.6).unwrap();
        assert_eq!(
            hero.take_log(),
            vec!["Idle.update", "Idle.update", "Idle.leave(false)", "Walk.enter"]
        );
        assert_eq!(fsm.current_state_type(), Some(StateType::of::<Walk>()));
        assert_relative_eq!(fsm.current_state_time(), 0.0);
        assert_eq!(fsm.get_state::<Idle>().map(|s| s.updates), Some(2));
    }

    #[test]
    fn test_update_is_noop_when_not_running() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_hero_fsm(&mut pool, &hero);
        hero.take_log();

        fsm.update(&mut pool, 1.0, 1.0).unwrap();

        assert!(hero.take_log().is_empty());
        assert_relative_eq!(fsm.current_state_time(), 0.0);
    }

    #[test]
    fn test_reentering_current_state() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_trigger_fsm(&mut pool, &hero);
        fsm.start::<Trigger>(&mut pool).unwrap();
        fsm.update(&mut pool, 0.3, 0.3).unwrap();
        hero.take_log();

        fsm.get_state_mut::<Trigger>().unwrap().request = Some(StateType::of::<Trigger>());
        fsm.update(&mut pool, 0.2, 0.2).unwrap();

        let outcome = fsm.get_state::<Trigger>().and_then(|s| s.outcome.as_ref());
        assert!(matches!(outcome, Some(Ok(()))));
        assert_eq!(hero.take_log(), vec!["Trigger.leave(false)", "Trigger.enter"]);
        assert_eq!(fsm.current_state_type(), Some(StateType::of::<Trigger>()));
        assert_relative_eq!(fsm.current_state_time(), 0.0);
    }

    #[test]
    fn test_failing_hook_drops_queued_transition() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let states: Vec<Box<dyn FsmState<Hero>>> = vec![Box::new(Stumble), Box::new(Walk)];
        let mut fsm = Fsm::create(&mut pool, "hero", Rc::downgrade(&hero), states).unwrap();
        fsm.start::<Stumble>(&mut pool).unwrap();

        assert!(fsm.update(&mut pool, 0.1, 0.1).is_err());
        assert_eq!(fsm.current_state_type(), Some(StateType::of::<Stumble>()));

        assert!(fsm.update(&mut pool, 0.1, 0.1).is_err());
        assert_eq!(fsm.current_state_type(), Some(StateType::of::<Stumble>()));
    }

    #[test]
    fn test_state_access_by_type() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_hero_fsm(&mut pool, &hero);

        fsm.get_state_mut::<Idle>().unwrap().updates = 7;

        assert_eq!(fsm.get_state::<Idle>().unwrap().updates, 7);
        assert!(fsm.get_state::<Swim>().is_none());
        assert_eq!(
            fsm.state_types(),
            &[StateType::of::<Idle>(), StateType::of::<Walk>()]
        );
    }

    #[test]
    fn test_data_replacement_releases_previous_value_once() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_hero_fsm(&mut pool, &hero);

        let first = fsm.set_var(&mut pool, "score", 1_i64).unwrap();
        let second = fsm.set_var(&mut pool, "score", 2_i64).unwrap();

        assert!(pool.get(first).is_none());
        assert_eq!(fsm.get_var::<i64>(&pool, "score").unwrap(), Some(&2));
        assert_eq!(pool.info::<Var<i64>>().unwrap().release_count, 1);

        fsm.set_data(&mut pool, "score", second).unwrap();
        assert_eq!(pool.info::<Var<i64>>().unwrap().release_count, 1);
        assert_eq!(fsm.data_count(), 1);

        assert!(fsm.remove_data(&mut pool, "score").unwrap());
        assert!(!fsm.remove_data(&mut pool, "score").unwrap());
        assert_eq!(pool.info::<Var<i64>>().unwrap().release_count, 2);
        assert!(!fsm.has_data("score").unwrap());
    }

    #[test]
    fn test_data_contract_errors() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_hero_fsm(&mut pool, &hero);
        fsm.set_var(&mut pool, "title", String::from("knight")).unwrap();

        assert!(matches!(fsm.has_data(""), Err(RuntimeError::InvalidArgument(_))));
        assert!(matches!(
            fsm.set_var(&mut pool, "", 1_i64),
            Err(RuntimeError::InvalidArgument(_))
        ));
        assert!(matches!(
            fsm.get_var::<i64>(&pool, "title"),
            Err(RuntimeError::TypeContractViolation(_))
        ));
        assert_eq!(
            fsm.get_data::<VarString>(&pool, "title").unwrap().map(|v| v.value().as_str()),
            Some("knight")
        );
        assert_eq!(fsm.get_var::<i64>(&pool, "missing").unwrap(), None);
    }

    #[test]
    fn test_data_handle_points_into_pool() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_hero_fsm(&mut pool, &hero);
        fsm.set_var(&mut pool, "x", 5_i64).unwrap();

        let handle = fsm.data_handle("x").unwrap().unwrap();
        assert!(handle.is::<Var<i64>>());
        assert!(pool.contains(handle));
        assert_eq!(fsm.data_handle("y").unwrap(), None);
        assert!(matches!(fsm.data_handle(""), Err(RuntimeError::InvalidArgument(_))));

        fsm.remove_data(&mut pool, "x").unwrap();
        assert!(!pool.contains(handle));
    }

    #[test]
    fn test_clear_tears_everything_down() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let mut fsm = create_hero_fsm(&mut pool, &hero);
        fsm.start::<Walk>(&mut pool).unwrap();
        fsm.set_var(&mut pool, "hp", 10_i64).unwrap();
        fsm.set_var(&mut pool, "speed", 1.5_f32).unwrap();
        hero.take_log();

        fsm.clear(&mut pool).unwrap();

        assert_eq!(
            hero.take_log(),
            vec!["Walk.leave(true)", "Idle.destroy", "Walk.destroy"]
        );
        assert!(fsm.is_destroyed());
        assert!(!fsm.is_running());
        assert_eq!(fsm.name(), "");
        assert_eq!(fsm.state_count(), 0);
        assert_eq!(fsm.data_count(), 0);
        assert!(fsm.owner().is_none());
        assert_eq!(pool.info::<Var<i64>>().unwrap().using_count, 0);
        assert_eq!(pool.info::<Var<f32>>().unwrap().using_count, 0);
    }

    #[test]
    fn test_shutdown_recycles_fsm() {
        let mut pool = ReferencePool::new();
        let hero = Rc::new(Hero::default());
        let fsm = create_hero_fsm(&mut pool, &hero);
        fsm.shutdown(&mut pool).unwrap();
        assert_eq!(pool.info::<Fsm<Hero>>().unwrap().unused_count, 1);

        let mut again = Fsm::create(&mut pool, "hero-2", Rc::downgrade(&hero), hero_states()).unwrap();
        let info = pool.info::<Fsm<Hero>>().unwrap();
        assert_eq!(info.unused_count, 0);
        assert_eq!(info.acquire_count, 2);

        assert_eq!(again.name(), "hero-2");
        again.start::<Idle>(&mut pool).unwrap();
        assert!(again.is_running());
        again.shutdown(&mut pool).unwrap();
    }
}
