//! Multi-instance coordination.

use std::sync::Arc;

use modula_core::{ModuleSetup, Registry, Result};

/// Knows whether this process is the primary application instance.
pub trait MultiInstancesProvider: Send + Sync {
    /// Whether this instance owns shared state such as settings.
    fn is_main_instance(&self) -> bool;
}

/// Provider for a process that never shares state with other instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleInstance;

impl MultiInstancesProvider for SingleInstance {
    fn is_main_instance(&self) -> bool {
        true
    }
}

/// Registers [`SingleInstance`].
#[derive(Debug, Default)]
pub struct MiModule;

impl ModuleSetup for MiModule {
    fn module_name(&self) -> &'static str {
        "mi"
    }

    fn register_exports(&self, registry: &Registry) -> Result<()> {
        registry
            .register_instance::<dyn MultiInstancesProvider>(self.module_name(), Arc::new(SingleInstance))
    }
}
