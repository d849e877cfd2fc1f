//! Runtime modules
//!
//! A module is a long-lived service ticked once per frame. Modules are
//! created lazily through the [`ModuleRegistry`] the first time an
//! interface bound to them is requested, ticked in descending
//! [`priority`](Module::priority) and shut down in the reverse order.

mod registry;

pub use registry::ModuleRegistry;

use crate::error::RuntimeResult;
use crate::foundation::any::{short_type_name, AsAny};
use crate::pool::ReferencePool;

/// A runtime service
pub trait Module: AsAny {
    /// Name used in logs
    fn name(&self) -> &'static str {
        short_type_name(self.concrete_type_name())
    }

    /// Higher priority modules tick first and shut down last
    fn priority(&self) -> i32 {
        0
    }

    /// Advance one frame
    fn update(
        &mut self,
        pool: &mut ReferencePool,
        elapse_seconds: f32,
        real_elapse_seconds: f32,
    ) -> RuntimeResult<()>;

    /// Release everything the module holds
    fn shutdown(&mut self, pool: &mut ReferencePool);
}
