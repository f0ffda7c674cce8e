//! Cloud account capabilities.

use std::sync::Arc;

use modula_core::{ModuleSetup, Registry, Result};

/// Score sharing service account.
pub trait CloudService: Send + Sync {
    /// Whether the user is signed in.
    fn is_authorized(&self) -> bool;
}

/// Audio sharing service account.
pub trait AudioCloudService: Send + Sync {
    /// Whether the user is signed in.
    fn is_authorized(&self) -> bool;
}

/// Cloud provider for builds without network access. Never authorized.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineCloud;

impl CloudService for OfflineCloud {
    fn is_authorized(&self) -> bool {
        false
    }
}

impl AudioCloudService for OfflineCloud {
    fn is_authorized(&self) -> bool {
        false
    }
}

/// Registers [`OfflineCloud`] for both cloud capabilities.
#[derive(Debug, Default)]
pub struct CloudModule;

impl ModuleSetup for CloudModule {
    fn module_name(&self) -> &'static str {
        "cloud"
    }

    fn register_exports(&self, registry: &Registry) -> Result<()> {
        let offline = Arc::new(OfflineCloud);
        registry.register_instance::<dyn CloudService>(self.module_name(), offline.clone())?;
        registry.register_instance::<dyn AudioCloudService>(self.module_name(), offline)
    }
}
