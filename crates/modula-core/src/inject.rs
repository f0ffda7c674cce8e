//! Lazily-resolved capability bindings.
//!
//! A consumer holds one [`Inject<I>`] per capability it needs. Nothing is
//! looked up at construction; the first successful access resolves through
//! the registry with the consumer's declared module and caches the handle
//! for the binding's lifetime.
//!
//! Construction order of consumers is therefore decoupled from registration
//! order of providers, as long as the first access happens after the
//! provider is registered. A cached handle is never refreshed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use modula_core::{Inject, Registry, RegistryConfig};
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock;
//!
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         7
//!     }
//! }
//!
//! struct Scheduler {
//!     clock: Inject<dyn Clock>,
//! }
//!
//! let registry = Registry::new(RegistryConfig::reporting());
//! let scheduler = Scheduler {
//!     clock: Inject::with_registry(&registry, "scheduler"),
//! };
//!
//! // Registered after the consumer was built.
//! registry
//!     .register_instance::<dyn Clock>("time", Arc::new(FixedClock))
//!     .unwrap();
//!
//! assert_eq!(scheduler.clock.get().unwrap().now(), 7);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::identity::module_name_by_signature;
use crate::{Registry, Result};

/// A capability dependency resolved on first use.
pub struct Inject<I: ?Sized + Send + Sync + 'static> {
    module: Cow<'static, str>,
    registry: Option<Registry>,
    cell: OnceLock<Arc<I>>,
}

impl<I: ?Sized + Send + Sync + 'static> Inject<I> {
    /// Bind against the process-wide registry.
    pub fn new(module: impl Into<Cow<'static, str>>) -> Self {
        Self {
            module: module.into(),
            registry: None,
            cell: OnceLock::new(),
        }
    }

    /// Bind against a specific registry.
    pub fn with_registry(registry: &Registry, module: impl Into<Cow<'static, str>>) -> Self {
        Self {
            module: module.into(),
            registry: Some(registry.clone()),
            cell: OnceLock::new(),
        }
    }

    /// Bind against a specific registry, deriving the module from a
    /// `module_path!()` string.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedSignature`] for a crate-root path.
    pub fn from_module_path(registry: &Registry, path: &'static str) -> Result<Self> {
        let module = module_name_by_signature(path)?;
        Ok(Self::with_registry(registry, module))
    }

    /// The module this binding resolves on behalf of.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Whether a handle has been cached.
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Seed the binding with a handle, bypassing the registry.
    ///
    /// Returns `false` if a handle was already cached.
    pub fn provide(&self, instance: Arc<I>) -> bool {
        self.cell.set(instance).is_ok()
    }

    /// The capability, if any provider is registered.
    ///
    /// Absence is not cached; a later call resolves again.
    #[track_caller]
    pub fn get(&self) -> Option<Arc<I>> {
        if let Some(cached) = self.cell.get() {
            return Some(Arc::clone(cached));
        }
        let resolved = self.registry().resolve::<I>(&self.module)?;
        Some(Arc::clone(self.cell.get_or_init(|| resolved)))
    }

    /// The capability, treating absence as a wiring defect.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingCapability`] when nothing provides `I`.
    #[track_caller]
    pub fn required(&self) -> Result<Arc<I>> {
        if let Some(cached) = self.cell.get() {
            return Ok(Arc::clone(cached));
        }
        let resolved = self.registry().resolve_required::<I>(&self.module)?;
        Ok(Arc::clone(self.cell.get_or_init(|| resolved)))
    }

    fn registry(&self) -> &Registry {
        self.registry.as_ref().unwrap_or_else(|| Registry::global())
    }
}

impl<I: ?Sized + Send + Sync + 'static> fmt::Debug for Inject<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("capability", &std::any::type_name::<I>())
            .field("module", &self.module)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
