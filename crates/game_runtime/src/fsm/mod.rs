//! Finite state machines
//!
//! An [`Fsm`] drives one owner through a fixed set of [`FsmState`]s.
//! States see the machine through an [`FsmController`], the only way to
//! request a transition; everybody else gets the read-only
//! [`FsmObserver`]. The [`FsmManager`] module owns FSMs and ticks them
//! every frame.

mod controller;
mod data;
mod machine;
mod manager;
mod observer;
mod state;

pub use controller::FsmController;
pub use machine::Fsm;
pub use manager::{FsmHandle, FsmKey, FsmManager};
pub use observer::FsmObserver;
pub use state::{FsmState, StateType};
