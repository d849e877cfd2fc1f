//! # Game Runtime
//!
//! Runtime services for single-threaded game loops.
//!
//! ## Features
//!
//! - **Reference Pool**: Per-type free lists with versioned handles and
//!   optional strict release checking
//! - **Finite State Machines**: Owner-typed FSMs with deferred, validated
//!   transitions and a pooled data bag
//! - **Modules**: Lazily created services resolved by interface and ticked
//!   in priority order
//! - **Game Clock**: Scaled, pausable frame time
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use game_runtime::prelude::*;
//!
//! struct Player;
//!
//! #[derive(Default)]
//! struct Alive;
//!
//! impl FsmState<Player> for Alive {}
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = Runtime::new(RuntimeConfig::default())?;
//!     runtime.init_logging();
//!     runtime.bind_module::<FsmManager>()?;
//!
//!     let player = Rc::new(Player);
//!     let (fsms, pool) = runtime.get_module_with_pool::<FsmManager>()?;
//!     let handle = fsms.create_fsm(pool, "player", Rc::downgrade(&player), vec![
//!         Box::new(Alive) as Box<dyn FsmState<Player>>,
//!     ])?;
//!     if let Some(fsm) = fsms.get_fsm_mut(handle) {
//!         fsm.start::<Alive>(pool)?;
//!     }
//!
//!     for _ in 0..3 {
//!         runtime.tick()?;
//!     }
//!     runtime.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod fsm;
pub mod module;
pub mod pool;
pub mod variable;

mod error;
mod runtime;

pub use error::{RuntimeError, RuntimeResult};
pub use runtime::Runtime;

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        Runtime, RuntimeError, RuntimeResult,
        config::{Config, RuntimeConfig, StrictCheckMode},
        foundation::time::{FrameTime, GameClock},
        fsm::{Fsm, FsmController, FsmHandle, FsmManager, FsmObserver, FsmState, StateType},
        module::{Module, ModuleRegistry},
        pool::{Pooled, Reference, ReferencePool, ReferenceType},
        variable::{Var, VarBool, VarFloat, VarInt, VarString, Variable},
    };
}
