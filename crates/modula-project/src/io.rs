//! File system capability.

use std::path::Path;
use std::sync::Arc;

use modula_core::{ModuleSetup, Registry, Result};

/// Read-only view of the file system.
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Registers [`LocalFileSystem`] as the process file system.
#[derive(Debug, Default)]
pub struct IoModule;

impl ModuleSetup for IoModule {
    fn module_name(&self) -> &'static str {
        "io"
    }

    fn register_exports(&self, registry: &Registry) -> Result<()> {
        registry.register_instance::<dyn FileSystem>(self.module_name(), Arc::new(LocalFileSystem))
    }
}
