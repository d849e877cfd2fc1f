//! Runtime context tying the pool, modules and clock together

use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::foundation::logging;
use crate::foundation::time::{FrameTime, GameClock};
use crate::module::{Module, ModuleRegistry};
use crate::pool::ReferencePool;

/// One game runtime: a shared reference pool, the module registry and the
/// game clock
///
/// Everything runs on the thread that owns the runtime.
pub struct Runtime {
    config: RuntimeConfig,
    pool: ReferencePool,
    modules: ModuleRegistry,
    clock: GameClock,
    shut_down: bool,
}

impl Runtime {
    /// Build a runtime from validated configuration
    pub fn new(config: RuntimeConfig) -> RuntimeResult<Self> {
        config
            .validate()
            .map_err(|e| RuntimeError::InvalidArgument(e.to_string()))?;

        let mut clock = GameClock::new().with_max_frame_delta(config.max_frame_delta);
        clock.set_game_speed(config.game_speed)?;
        let pool = ReferencePool::with_strict_check(config.strict_check.is_enabled());

        log::info!(
            "Runtime initialized (strict pool checks: {}, game speed: {})",
            pool.strict_check(),
            clock.game_speed()
        );

        Ok(Self {
            config,
            pool,
            modules: ModuleRegistry::new(),
            clock,
            shut_down: false,
        })
    }

    /// Install the logger at the configured level
    pub fn init_logging(&self) -> bool {
        logging::init(&self.config.log_level)
    }

    /// Configuration the runtime was built with
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Shared reference pool
    pub fn pool(&self) -> &ReferencePool {
        &self.pool
    }

    /// Shared reference pool, mutably
    pub fn pool_mut(&mut self) -> &mut ReferencePool {
        &mut self.pool
    }

    /// Module registry
    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Module registry, mutably
    pub fn modules_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.modules
    }

    /// Game clock
    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Game clock, mutably
    pub fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// See [`ModuleRegistry::bind`]
    pub fn bind<I, M, F>(&mut self, factory: F, upcast: fn(&mut M) -> &mut I) -> RuntimeResult<()>
    where
        I: ?Sized + 'static,
        M: Module,
        F: Fn() -> RuntimeResult<M> + 'static,
    {
        self.modules.bind(factory, upcast)
    }

    /// See [`ModuleRegistry::bind_module`]
    pub fn bind_module<M: Module + Default>(&mut self) -> RuntimeResult<()> {
        self.modules.bind_module::<M>()
    }

    /// See [`ModuleRegistry::get_module`]
    pub fn get_module<I: ?Sized + 'static>(&mut self) -> RuntimeResult<&mut I> {
        self.modules.get_module::<I>()
    }

    /// Module bound to `I` together with the pool it works against
    pub fn get_module_with_pool<I: ?Sized + 'static>(
        &mut self,
    ) -> RuntimeResult<(&mut I, &mut ReferencePool)> {
        let module = self.modules.get_module::<I>()?;
        Ok((module, &mut self.pool))
    }

    /// Tick every module with explicit deltas
    ///
    /// # Errors
    /// `InvalidState` after shutdown, otherwise the first module error.
    pub fn update(&mut self, elapse_seconds: f32, real_elapse_seconds: f32) -> RuntimeResult<()> {
        if self.shut_down {
            return Err(RuntimeError::InvalidState(
                "Runtime has been shut down".to_string(),
            ));
        }
        self.modules
            .update(&mut self.pool, elapse_seconds, real_elapse_seconds)
    }

    /// Advance the clock by a measured real delta and tick every module
    pub fn advance(&mut self, real_elapse_seconds: f32) -> RuntimeResult<FrameTime> {
        let frame = self.clock.advance(real_elapse_seconds);
        self.update(frame.elapse_seconds, frame.real_elapse_seconds)?;
        Ok(frame)
    }

    /// Sample wall-clock time and tick every module
    pub fn tick(&mut self) -> RuntimeResult<FrameTime> {
        let frame = self.clock.sample();
        self.update(frame.elapse_seconds, frame.real_elapse_seconds)?;
        Ok(frame)
    }

    /// Shut every module down, clear the pool and reset the clock
    ///
    /// Calling it again does nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        log::info!("Shutting down runtime ({} modules)", self.modules.module_count());
        self.modules.shutdown(&mut self.pool);
        log::info!("Runtime shutdown complete");
        logging::flush();
        self.clock.reset();
        self.shut_down = true;
    }
}
