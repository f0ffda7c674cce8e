//! The project module: recent files and the open/save scenario.
//!
//! [`ProjectConfiguration`] is registered as internal: only code resolving
//! on behalf of the `project` module may use it.

mod configuration;
mod recent_files;
mod scenario;
mod types;

use std::sync::Arc;

use modula_core::{ModuleSetup, Registry, Result};

use crate::cloud::{AudioCloudService, CloudService};
use crate::framework::Interactive;
use crate::io::FileSystem;
use crate::mi::MultiInstancesProvider;

pub use configuration::{ProjectConfiguration, ProjectSettings, ProjectSettingsValues};
pub use recent_files::{RecentFiles, RecentFilesController};
pub use scenario::{OpenSaveProjectScenario, OpenSaveScenario};
pub use types::{RecentFile, SaveLocation, SaveLocationType, SaveMode, SaveToCloudResponse};

pub(crate) const MODULE: &str = "project";

/// Registers the project configuration, recent files controller and
/// open/save scenario.
#[derive(Debug, Clone, Default)]
pub struct ProjectModule {
    settings: ProjectSettingsValues,
}

impl ProjectModule {
    /// Start from the given setting values instead of the defaults.
    pub fn with_settings(settings: ProjectSettingsValues) -> Self {
        Self { settings }
    }
}

impl ModuleSetup for ProjectModule {
    fn module_name(&self) -> &'static str {
        MODULE
    }

    fn register_exports(&self, registry: &Registry) -> Result<()> {
        registry.register_internal_instance::<dyn ProjectConfiguration>(
            MODULE,
            Arc::new(ProjectSettings::new(self.settings.clone())),
        )?;
        registry.register_instance::<dyn RecentFilesController>(
            MODULE,
            Arc::new(RecentFiles::new(registry)),
        )?;
        registry.register_instance::<dyn OpenSaveProjectScenario>(
            MODULE,
            Arc::new(OpenSaveScenario::new(registry)),
        )
    }

    fn resolve_imports(&self, registry: &Registry) -> Result<()> {
        registry.resolve_required::<dyn ProjectConfiguration>(MODULE)?;
        registry.resolve_required::<dyn FileSystem>(MODULE)?;
        registry.resolve_required::<dyn MultiInstancesProvider>(MODULE)?;
        registry.resolve_required::<dyn Interactive>(MODULE)?;
        registry.resolve_required::<dyn CloudService>(MODULE)?;
        registry.resolve_required::<dyn AudioCloudService>(MODULE)?;
        Ok(())
    }

    fn on_init(&self, registry: &Registry) -> Result<()> {
        let recent = registry
            .resolve_required::<dyn RecentFilesController>(MODULE)?
            .recent_files()?;
        log::debug!("{MODULE}: {} recent files", recent.len());
        Ok(())
    }

    fn on_deinit(&self) {
        log::debug!("{MODULE}: deinit");
    }
}
