//! Lazy, priority-ordered module registry

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use crate::error::{RuntimeError, RuntimeResult};
use crate::foundation::any::short_type_name;
use crate::pool::ReferencePool;

use super::Module;

type ModuleFactory = Box<dyn Fn() -> RuntimeResult<Box<dyn Module>>>;

/// Projection from a stored module to one of its interfaces
struct Upcast<I: ?Sized + 'static>(Box<dyn Fn(&mut Box<dyn Module>) -> Option<&mut I>>);

struct ModuleBinding {
    module_type: TypeId,
    module_name: &'static str,
    factory: ModuleFactory,
    /// `Upcast<I>` for the bound interface
    upcast: Box<dyn Any>,
}

struct ModuleEntry {
    type_id: TypeId,
    name: &'static str,
    priority: i32,
    module: Box<dyn Module>,
}

/// Owns every module and resolves them by interface
///
/// An interface is any `'static` type, usually a trait object type such
/// as `dyn Scoreboard`, bound to one concrete module with
/// [`bind`](Self::bind). The first [`get_module`](Self::get_module) for
/// that interface constructs the module and slots it into the update
/// order; later calls return the same instance.
#[derive(Default)]
pub struct ModuleRegistry {
    bindings: HashMap<TypeId, ModuleBinding>,
    modules: Vec<ModuleEntry>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind interface `I` to module `M`
    ///
    /// `factory` builds the module on first use; `upcast` projects the
    /// concrete module onto the interface.
    ///
    /// # Errors
    /// `DuplicateRegistration` when `I` is already bound.
    pub fn bind<I, M, F>(&mut self, factory: F, upcast: fn(&mut M) -> &mut I) -> RuntimeResult<()>
    where
        I: ?Sized + 'static,
        M: Module,
        F: Fn() -> RuntimeResult<M> + 'static,
    {
        let interface = TypeId::of::<I>();
        if let Some(existing) = self.bindings.get(&interface) {
            return Err(RuntimeError::DuplicateRegistration(format!(
                "Interface '{}' is already bound to module '{}'",
                type_name::<I>(),
                existing.module_name
            )));
        }

        let factory: ModuleFactory =
            Box::new(move || factory().map(|module| Box::new(module) as Box<dyn Module>));
        let cast: Box<dyn Fn(&mut Box<dyn Module>) -> Option<&mut I>> =
            Box::new(move |module| (**module).as_any_mut().downcast_mut::<M>().map(upcast));

        self.bindings.insert(
            interface,
            ModuleBinding {
                module_type: TypeId::of::<M>(),
                module_name: short_type_name(type_name::<M>()),
                factory,
                upcast: Box::new(Upcast(cast)),
            },
        );
        log::debug!("Bound {} to {}", type_name::<I>(), type_name::<M>());
        Ok(())
    }

    /// Bind module `M` as its own interface, built with `Default`
    pub fn bind_module<M: Module + Default>(&mut self) -> RuntimeResult<()> {
        self.bind::<M, M, _>(|| Ok(M::default()), |module| module)
    }

    /// Whether interface `I` is bound
    pub fn is_bound<I: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeId::of::<I>())
    }

    /// Whether the module bound to `I` has been created
    pub fn has_module<I: ?Sized + 'static>(&self) -> bool {
        self.bindings
            .get(&TypeId::of::<I>())
            .is_some_and(|b| self.modules.iter().any(|e| e.type_id == b.module_type))
    }

    /// Module bound to interface `I`, created on first request
    ///
    /// # Errors
    /// * `TypeContractViolation` when `I` is not bound
    /// * `NotFound` when the factory fails
    /// * `DuplicateRegistration` when an instance of the module type is
    ///   already registered under another identity
    pub fn get_module<I: ?Sized + 'static>(&mut self) -> RuntimeResult<&mut I> {
        let binding = self.bindings.get(&TypeId::of::<I>()).ok_or_else(|| {
            RuntimeError::TypeContractViolation(format!(
                "You must get a module through a bound interface, '{}' is not bound",
                type_name::<I>()
            ))
        })?;

        let index = match self.modules.iter().position(|e| e.type_id == binding.module_type) {
            Some(index) => index,
            None => {
                let module = (binding.factory)().map_err(|e| {
                    RuntimeError::NotFound(format!(
                        "Can not create module '{}': {}",
                        binding.module_name, e
                    ))
                })?;
                Self::insert(&mut self.modules, binding.module_type, module)?
            }
        };

        let Upcast(cast) = binding.upcast.downcast_ref::<Upcast<I>>().ok_or_else(|| {
            RuntimeError::TypeContractViolation(format!(
                "Binding for '{}' does not project onto it",
                type_name::<I>()
            ))
        })?;
        cast(&mut self.modules[index].module).ok_or_else(|| {
            RuntimeError::TypeContractViolation(format!(
                "Module '{}' does not implement '{}'",
                binding.module_name,
                type_name::<I>()
            ))
        })
    }

    fn insert(
        modules: &mut Vec<ModuleEntry>,
        type_id: TypeId,
        module: Box<dyn Module>,
    ) -> RuntimeResult<usize> {
        let name = module.name();
        if (*module).concrete_type_id() != type_id || modules.iter().any(|e| e.type_id == type_id) {
            return Err(RuntimeError::DuplicateRegistration(format!(
                "Module '{}' is already registered",
                name
            )));
        }

        let priority = module.priority();
        let index = modules
            .iter()
            .position(|e| priority > e.priority)
            .unwrap_or(modules.len());
        modules.insert(
            index,
            ModuleEntry {
                type_id,
                name,
                priority,
                module,
            },
        );
        log::info!("Created module {} (priority {})", name, priority);
        Ok(index)
    }

    /// Number of created modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Names of created modules in update order
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|e| e.name).collect()
    }

    /// Tick every module in descending priority, stopping at the first error
    pub fn update(
        &mut self,
        pool: &mut ReferencePool,
        elapse_seconds: f32,
        real_elapse_seconds: f32,
    ) -> RuntimeResult<()> {
        for entry in &mut self.modules {
            entry
                .module
                .update(pool, elapse_seconds, real_elapse_seconds)
                .map_err(|e| {
                    log::error!("Module {} failed to update: {}", entry.name, e);
                    e
                })?;
        }
        Ok(())
    }

    /// Shut modules down in ascending priority, drop them and clear `pool`
    ///
    /// Bindings survive, so modules are created afresh on the next request.
    pub fn shutdown(&mut self, pool: &mut ReferencePool) {
        for entry in self.modules.iter_mut().rev() {
            log::debug!("Shutting down module {}", entry.name);
            entry.module.shutdown(pool);
        }
        self.modules.clear();
        pool.clear_all();
    }
}
