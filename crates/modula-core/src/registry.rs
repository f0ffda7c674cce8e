//! The capability registry.
//!
//! [`Registry`] maps a capability identifier (see [`crate::identity`]) to
//! the provider registered for it: either a shared instance or a
//! [`Factory`] invoked on every resolution. Providers are stored
//! type-erased; resolution downcasts back to `Arc<I>` after checking the
//! stored `TypeId`.
//!
//! # Design
//!
//! - One entry per identifier. A second registration is a wiring defect and
//!   leaves the first entry untouched.
//! - Capabilities registered as internal resolve only for requesters that
//!   declare the capability's owning module. Violations are recorded (see
//!   [`Registry::violations`]) and then handled by the configured
//!   [`VisibilityPolicy`].
//! - Lookups take a shared lock; registration, removal and reset take the
//!   exclusive lock. Factories run after the lock is released, so a factory
//!   may resolve its own dependencies.
//! - Resolved `Arc`s outlive their entry: unregistering or resetting never
//!   invalidates handles already held by consumers.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use modula_core::{Registry, RegistryConfig};
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct FixedClock;
//!
//! impl Clock for FixedClock {
//!     fn now(&self) -> u64 {
//!         42
//!     }
//! }
//!
//! let registry = Registry::new(RegistryConfig::reporting());
//! registry
//!     .register_instance::<dyn Clock>("time", Arc::new(FixedClock))
//!     .unwrap();
//!
//! let clock = registry.resolve::<dyn Clock>("ui").unwrap();
//! assert_eq!(clock.now(), 42);
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::config::{DefectPolicy, RegistryConfig, VisibilityPolicy};
use crate::identity::{CapabilityInfo, module_of};
use crate::{Error, Result};

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Recorded visibility violations kept per registry.
const VIOLATION_LIMIT: usize = 256;

// ============================================================================
// Factory
// ============================================================================

/// Deferred construction rule for a capability.
///
/// Invoked on every resolution that reaches it; results are not cached. Any
/// `Fn() -> Arc<I> + Send + Sync` closure is a factory.
pub trait Factory<I: ?Sized>: Send + Sync {
    /// Build a fresh provider instance.
    fn create(&self) -> Arc<I>;
}

impl<I: ?Sized, F> Factory<I> for F
where
    F: Fn() -> Arc<I> + Send + Sync,
{
    fn create(&self) -> Arc<I> {
        self()
    }
}

// ============================================================================
// Entries
// ============================================================================

/// How a registered capability is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Instance,
    Factory,
}

enum Provider {
    /// Holds an `Arc<I>`; `address` is its data pointer.
    Instance {
        handle: Box<dyn Any + Send + Sync>,
        address: usize,
    },
    /// Holds an `Arc<dyn Factory<I>>`.
    Factory(Box<dyn Any + Send + Sync>),
}

impl Provider {
    fn kind(&self) -> ProviderKind {
        match self {
            Self::Instance { .. } => ProviderKind::Instance,
            Self::Factory(_) => ProviderKind::Factory,
        }
    }
}

struct ServiceEntry {
    info: CapabilityInfo,
    source_module: String,
    type_id: TypeId,
    type_name: &'static str,
    provider: Provider,
}

/// Snapshot of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSummary {
    /// Capability identifier.
    pub identifier: String,
    /// Module whose namespace defines the capability.
    pub owning_module: String,
    /// Module that registered the provider.
    pub source_module: String,
    /// Instance or factory.
    pub kind: ProviderKind,
    /// Whether the capability is internal to its owning module.
    pub internal: bool,
    /// Full capability type name.
    pub type_name: String,
}

enum Found<I: ?Sized + 'static> {
    Instance(Arc<I>),
    Factory(Arc<dyn Factory<I>>),
}

// ============================================================================
// Registry
// ============================================================================

struct Inner {
    services: RwLock<BTreeMap<String, ServiceEntry>>,
    violations: Mutex<Vec<Error>>,
    config: RegistryConfig,
}

/// Thread-safe capability registry.
///
/// `Registry` is a handle: cloning is cheap (Arc clone) and every clone
/// sees the same entries.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("services", &self.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl Registry {
    /// Create an empty registry with the given policies.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                services: RwLock::new(BTreeMap::new()),
                violations: Mutex::new(Vec::new()),
                config,
            }),
        }
    }

    /// The process-wide registry.
    ///
    /// Created with default policies on first access unless
    /// [`Registry::init_global`] ran before.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::default)
    }

    /// Explicitly create the process-wide registry.
    ///
    /// Calling it again with the same configuration returns the existing
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the global registry already exists with
    /// different policies.
    pub fn init_global(config: RegistryConfig) -> Result<&'static Registry> {
        let registry = GLOBAL.get_or_init(|| Registry::new(config.clone()));
        if registry.config() == &config {
            Ok(registry)
        } else {
            Err(Error::config(format!(
                "global registry already initialised with {:?}",
                registry.config()
            )))
        }
    }

    /// The policies this registry applies.
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register a shared instance as the provider of `I`.
    ///
    /// # Errors
    ///
    /// [`Error::DoubleRegistration`] if `I` already has a provider,
    /// [`Error::IdentifierCollision`] if another type holds the identifier,
    /// [`Error::MalformedSignature`] if `I` has no usable identity. Under
    /// [`DefectPolicy::Panic`] these panic instead.
    pub fn register_instance<I>(&self, module: &str, instance: Arc<I>) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let info = self.describe::<I>(module)?;
        self.insert::<I>(module, info, instance_provider(instance))
    }

    /// Register a factory as the provider of `I`.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::register_instance`].
    pub fn register_factory<I, F>(&self, module: &str, factory: F) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Factory<I> + 'static,
    {
        let info = self.describe::<I>(module)?;
        self.insert::<I>(module, info, factory_provider(factory))
    }

    /// Register a factory object, taking the registering module from the
    /// factory type's own path.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::register_instance`], plus
    /// [`Error::MalformedSignature`] when the factory type lives at a crate
    /// root.
    pub fn register_factory_object<I, F>(&self, factory: F) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Factory<I> + 'static,
    {
        let module = module_of::<F>().map_err(|err| self.defect(err))?;
        self.register_factory::<I, F>(module, factory)
    }

    /// Register a shared instance usable only inside the capability's
    /// owning module.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::register_instance`].
    pub fn register_internal_instance<I>(&self, module: &str, instance: Arc<I>) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let info = self.describe::<I>(module)?.into_internal();
        self.insert::<I>(module, info, instance_provider(instance))
    }

    /// Register a factory usable only inside the capability's owning module.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::register_instance`].
    pub fn register_internal_factory<I, F>(&self, module: &str, factory: F) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
        F: Factory<I> + 'static,
    {
        let info = self.describe::<I>(module)?.into_internal();
        self.insert::<I>(module, info, factory_provider(factory))
    }

    fn describe<I: ?Sized + 'static>(&self, module: &str) -> Result<CapabilityInfo> {
        CapabilityInfo::of::<I>().map_err(|err| {
            log::error!("{module}: cannot register `{}`", type_name::<I>());
            self.defect(err)
        })
    }

    fn insert<I: ?Sized + 'static>(
        &self,
        module: &str,
        info: CapabilityInfo,
        provider: Provider,
    ) -> Result<()> {
        let mut services = self.inner.services.write();

        if let Some(existing) = services.get(info.identifier()) {
            let err = if existing.type_id == TypeId::of::<I>() {
                Error::DoubleRegistration {
                    identifier: info.identifier().to_string(),
                    module: module.to_string(),
                    first_module: existing.source_module.clone(),
                }
            } else {
                Error::IdentifierCollision {
                    identifier: info.identifier().to_string(),
                    module: module.to_string(),
                    existing_type: existing.type_name.to_string(),
                    new_type: type_name::<I>().to_string(),
                }
            };
            drop(services);
            return Err(self.defect(err));
        }

        log::debug!(
            "{module}: registered {} {info}{}",
            match provider.kind() {
                ProviderKind::Instance => "instance",
                ProviderKind::Factory => "factory",
            },
            if info.is_internal() { " (internal)" } else { "" }
        );

        services.insert(
            info.identifier().to_string(),
            ServiceEntry {
                info,
                source_module: module.to_string(),
                type_id: TypeId::of::<I>(),
                type_name: type_name::<I>(),
                provider,
            },
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Unregistration
    // ------------------------------------------------------------------------

    /// Remove the provider of `I`. Returns whether an entry was removed.
    pub fn unregister<I: ?Sized + 'static>(&self) -> bool {
        let Ok(info) = CapabilityInfo::of::<I>() else {
            return false;
        };

        let mut services = self.inner.services.write();
        let owned = services
            .get(info.identifier())
            .is_some_and(|entry| entry.type_id == TypeId::of::<I>());
        if owned {
            services.remove(info.identifier());
            log::debug!("unregistered {info}");
        }
        owned
    }

    /// Remove the provider of `I` only if it is exactly `instance`.
    ///
    /// A stale handle (the registry already holds a newer instance, or a
    /// factory) leaves the entry untouched.
    pub fn unregister_if_current<I>(&self, instance: &Arc<I>) -> bool
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let Ok(info) = CapabilityInfo::of::<I>() else {
            return false;
        };
        let target = arc_address(instance);

        let mut services = self.inner.services.write();
        let current = services.get(info.identifier()).is_some_and(|entry| {
            entry.type_id == TypeId::of::<I>()
                && matches!(entry.provider, Provider::Instance { address, .. } if address == target)
        });
        if current {
            services.remove(info.identifier());
            log::debug!("unregistered current instance of {info}");
        }
        current
    }

    /// Remove the entries held under `identifiers`, returning how many were
    /// present.
    ///
    /// Used to roll back a batch of registrations, e.g. a module set's
    /// exports.
    pub fn unregister_identifiers<S: AsRef<str>>(&self, identifiers: &[S]) -> usize {
        let mut services = self.inner.services.write();
        let removed = identifiers
            .iter()
            .filter(|identifier| services.remove(identifier.as_ref()).is_some())
            .count();
        log::debug!("unregistered {removed} of {} services", identifiers.len());
        removed
    }

    /// Remove every entry and forget recorded violations.
    ///
    /// Handles already resolved stay valid.
    pub fn reset(&self) {
        let mut services = self.inner.services.write();
        let removed = services.len();
        services.clear();
        self.inner.violations.lock().clear();
        log::debug!("registry reset, {removed} services removed");
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// Resolve `I` on behalf of `module`.
    ///
    /// Returns `None` when nothing provides `I`. The caller's source
    /// location is used as the call-site hint in diagnostics.
    #[track_caller]
    pub fn resolve<I>(&self, module: &str) -> Option<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        optional(self.lookup::<I>(module, Location::caller()))
    }

    /// Resolve `I` on behalf of `module` with a free-text call-site hint.
    pub fn resolve_with_hint<I>(&self, module: &str, hint: &str) -> Option<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let hint: &dyn fmt::Display = if hint.is_empty() { &"unknown" } else { &hint };
        optional(self.lookup::<I>(module, hint))
    }

    /// Resolve a capability the caller cannot work without.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCapability`] when nothing provides `I`,
    /// [`Error::IdentifierCollision`] when the identifier is held by a
    /// different type and [`Error::MalformedSignature`] when `I` has no
    /// usable identity. Under [`DefectPolicy::Panic`] these panic instead.
    #[track_caller]
    pub fn resolve_required<I>(&self, module: &str) -> Result<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        match self.lookup::<I>(module, Location::caller()) {
            Ok(Some(instance)) => Ok(instance),
            Err(err) => Err(self.defect(err)),
            Ok(None) => {
                let identifier = CapabilityInfo::of::<I>()
                    .map(|info| info.identifier().to_string())
                    .unwrap_or_else(|_| type_name::<I>().to_string());
                Err(self.defect(Error::MissingCapability {
                    identifier,
                    module: module.to_string(),
                }))
            }
        }
    }

    /// `Ok(None)` means absent or denied; `Err` is a wiring defect.
    fn lookup<I>(&self, module: &str, hint: &dyn fmt::Display) -> Result<Option<Arc<I>>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let info = CapabilityInfo::of::<I>()?;

        let (found, violation) = {
            let services = self.inner.services.read();
            let Some(entry) = services.get(info.identifier()) else {
                log::trace!("{module}: {info} is not registered");
                return Ok(None);
            };

            if entry.type_id != TypeId::of::<I>() {
                return Err(Error::IdentifierCollision {
                    identifier: info.identifier().to_string(),
                    module: module.to_string(),
                    existing_type: entry.type_name.to_string(),
                    new_type: type_name::<I>().to_string(),
                });
            }

            let violation = (!entry.info.is_visible_to(module)).then(|| {
                Error::VisibilityViolation {
                    identifier: entry.info.identifier().to_string(),
                    requesting_module: module.to_string(),
                    owning_module: entry.info.owning_module().to_string(),
                    called_from: hint.to_string(),
                }
            });

            let found = match &entry.provider {
                Provider::Instance { handle, .. } => {
                    handle.downcast_ref::<Arc<I>>().cloned().map(Found::Instance)
                }
                Provider::Factory(factory) => factory
                    .downcast_ref::<Arc<dyn Factory<I>>>()
                    .cloned()
                    .map(Found::Factory),
            };
            (found, violation)
        };

        if let Some(err) = violation {
            self.record_violation(&err);
            match self.inner.config.visibility {
                VisibilityPolicy::Enforce => {
                    log::error!("{err}");
                    panic!("{err}");
                }
                VisibilityPolicy::Warn => log::warn!("{err}"),
                VisibilityPolicy::Deny => {
                    log::error!("{err}");
                    return Ok(None);
                }
            }
        }

        Ok(found.map(|found| match found {
            Found::Instance(instance) => instance,
            Found::Factory(factory) => factory.create(),
        }))
    }

    fn record_violation(&self, err: &Error) {
        let mut violations = self.inner.violations.lock();
        if violations.len() < VIOLATION_LIMIT {
            violations.push(err.clone());
        }
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// Whether `I` currently has a provider.
    pub fn contains<I: ?Sized + 'static>(&self) -> bool {
        let Ok(info) = CapabilityInfo::of::<I>() else {
            return false;
        };
        self.inner
            .services
            .read()
            .get(info.identifier())
            .is_some_and(|entry| entry.type_id == TypeId::of::<I>())
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.inner.services.read().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.services.read().is_empty()
    }

    /// Snapshot of every entry, ordered by identifier.
    pub fn services(&self) -> Vec<ServiceSummary> {
        self.inner
            .services
            .read()
            .values()
            .map(|entry| ServiceSummary {
                identifier: entry.info.identifier().to_string(),
                owning_module: entry.info.owning_module().to_string(),
                source_module: entry.source_module.clone(),
                kind: entry.provider.kind(),
                internal: entry.info.is_internal(),
                type_name: entry.type_name.to_string(),
            })
            .collect()
    }

    /// Visibility violations seen so far, oldest first.
    ///
    /// Recorded under every [`VisibilityPolicy`], including the ones that
    /// let the request through.
    pub fn violations(&self) -> Vec<Error> {
        self.inner.violations.lock().clone()
    }

    /// Return and forget the recorded visibility violations.
    pub fn take_violations(&self) -> Vec<Error> {
        std::mem::take(&mut *self.inner.violations.lock())
    }

    /// Report a wiring defect according to the defect policy.
    fn defect(&self, err: Error) -> Error {
        log::error!("{err}");
        if self.inner.config.defects == DefectPolicy::Panic {
            panic!("{err}");
        }
        err
    }
}

/// Optional resolution logs a defect and reports the capability as absent.
fn optional<I: ?Sized>(found: Result<Option<Arc<I>>>) -> Option<Arc<I>> {
    found.unwrap_or_else(|err| {
        log::error!("{err}");
        None
    })
}

fn instance_provider<I>(instance: Arc<I>) -> Provider
where
    I: ?Sized + Send + Sync + 'static,
{
    Provider::Instance {
        address: arc_address(&instance),
        handle: Box::new(instance),
    }
}

fn factory_provider<I, F>(factory: F) -> Provider
where
    I: ?Sized + Send + Sync + 'static,
    F: Factory<I> + 'static,
{
    let factory: Arc<dyn Factory<I>> = Arc::new(factory);
    Provider::Factory(Box::new(factory))
}

fn arc_address<I: ?Sized>(instance: &Arc<I>) -> usize {
    Arc::as_ptr(instance).cast::<()>() as usize
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct ClockGreeter {
        clock: Arc<dyn Clock>,
    }

    impl Greeter for ClockGreeter {
        fn greet(&self) -> String {
            format!("hello at {}", self.clock.now())
        }
    }

    mod other {
        pub trait Clock: Send + Sync {}
        pub struct Sundial;
        impl Clock for Sundial {}
    }

    struct ClockFactory;

    impl Factory<dyn Clock> for ClockFactory {
        fn create(&self) -> Arc<dyn Clock> {
            Arc::new(FixedClock(7))
        }
    }

    /// Factory generic over a foreign trait object.
    struct Tagged<T: ?Sized>(std::marker::PhantomData<fn() -> Box<T>>);

    impl<T: ?Sized> Factory<dyn Clock> for Tagged<T> {
        fn create(&self) -> Arc<dyn Clock> {
            Arc::new(FixedClock(8))
        }
    }

    fn registry() -> Registry {
        Registry::new(RegistryConfig::reporting())
    }

    fn clock(at: u64) -> Arc<dyn Clock> {
        Arc::new(FixedClock(at))
    }

    // ------------------------------------------------------------------------
    // Registration and resolution
    // ------------------------------------------------------------------------

    #[test]
    fn test_register_then_resolve_returns_same_instance() {
        let registry = registry();
        let instance = clock(1);
        registry
            .register_instance::<dyn Clock>("time", instance.clone())
            .unwrap();

        let resolved = registry.resolve::<dyn Clock>("time").unwrap();
        assert!(Arc::ptr_eq(&resolved, &instance));
    }

    #[test]
    fn test_resolve_keeps_entry() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();

        let first = registry.resolve::<dyn Clock>("ui").unwrap();
        let second = registry.resolve::<dyn Clock>("net").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.contains::<dyn Clock>());
    }

    #[test]
    fn test_double_registration_rejected_first_kept() {
        let registry = registry();
        let original = clock(1);
        registry
            .register_instance::<dyn Clock>("time", original.clone())
            .unwrap();

        let err = registry
            .register_instance::<dyn Clock>("net", clock(2))
            .unwrap_err();
        assert_eq!(
            err,
            Error::DoubleRegistration {
                identifier: "Clock".into(),
                module: "net".into(),
                first_module: "time".into(),
            }
        );

        let resolved = registry.resolve::<dyn Clock>("time").unwrap();
        assert!(Arc::ptr_eq(&resolved, &original));
    }

    #[test]
    fn test_double_registration_factory_over_instance_rejected() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();
        let err = registry
            .register_factory::<dyn Clock, _>("time", || clock(2))
            .unwrap_err();
        assert!(matches!(err, Error::DoubleRegistration { .. }));
        assert_eq!(registry.resolve::<dyn Clock>("time").unwrap().now(), 1);
    }

    #[test]
    #[should_panic(expected = "double register")]
    fn test_double_registration_panics_under_strict_policy() {
        let registry = Registry::new(RegistryConfig::strict());
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();
        let _ = registry.register_instance::<dyn Clock>("net", clock(2));
    }

    #[test]
    fn test_identifier_collision_rejected() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();

        let err = registry
            .register_instance::<dyn other::Clock>("other", Arc::new(other::Sundial))
            .unwrap_err();
        match err {
            Error::IdentifierCollision {
                identifier,
                existing_type,
                new_type,
                ..
            } => {
                assert_eq!(identifier, "Clock");
                assert!(existing_type.ends_with("tests::Clock"));
                assert!(new_type.ends_with("other::Clock"));
            }
            unexpected => panic!("unexpected error: {unexpected:?}"),
        }

        assert!(registry.resolve::<dyn other::Clock>("other").is_none());
        assert!(!registry.contains::<dyn other::Clock>());
        assert!(!registry.unregister::<dyn other::Clock>());
        assert!(registry.contains::<dyn Clock>());
    }

    #[test]
    fn test_malformed_capability_rejected() {
        let registry = registry();
        let err = registry
            .register_instance::<u32>("numbers", Arc::new(3))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSignature { .. }));
        assert!(registry.is_empty());
        assert!(registry.resolve::<u32>("numbers").is_none());
    }

    // ------------------------------------------------------------------------
    // Factories
    // ------------------------------------------------------------------------

    #[test]
    fn test_factory_yields_fresh_instances() {
        let registry = registry();
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        registry
            .register_factory::<dyn Clock, _>("time", move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) as u64;
                Arc::new(FixedClock(n)) as Arc<dyn Clock>
            })
            .unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 0);

        let a = registry.resolve::<dyn Clock>("ui").unwrap();
        let b = registry.resolve::<dyn Clock>("ui").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!((a.now(), b.now()), (0, 1));
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factory_may_resolve_dependencies() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(9))
            .unwrap();

        let inner = registry.clone();
        registry
            .register_factory::<dyn Greeter, _>("greeting", move || {
                let clock = inner.resolve::<dyn Clock>("greeting").unwrap();
                Arc::new(ClockGreeter { clock }) as Arc<dyn Greeter>
            })
            .unwrap();

        let greeter = registry.resolve::<dyn Greeter>("ui").unwrap();
        assert_eq!(greeter.greet(), "hello at 9");
    }

    #[test]
    fn test_factory_object_module_from_type_path() {
        let registry = registry();
        registry
            .register_factory_object::<dyn Clock, _>(ClockFactory)
            .unwrap();

        let summary = &registry.services()[0];
        assert_eq!(summary.source_module, "registry");
        assert_eq!(summary.kind, ProviderKind::Factory);
        assert_eq!(registry.resolve::<dyn Clock>("ui").unwrap().now(), 7);
    }

    #[test]
    fn test_generic_factory_object_module_ignores_arguments() {
        let registry = registry();
        registry
            .register_factory_object::<dyn Clock, _>(Tagged::<dyn fmt::Debug + Send>(
                std::marker::PhantomData,
            ))
            .unwrap();

        assert_eq!(registry.services()[0].source_module, "registry");
        assert_eq!(registry.resolve::<dyn Clock>("ui").unwrap().now(), 8);
    }

    // ------------------------------------------------------------------------
    // Absence
    // ------------------------------------------------------------------------

    #[test]
    fn test_missing_optional_is_none() {
        let registry = registry();
        assert!(registry.resolve::<dyn Clock>("ui").is_none());
    }

    #[test]
    fn test_missing_required_is_error() {
        let registry = registry();
        let err = registry.resolve_required::<dyn Clock>("ui").err().unwrap();
        assert_eq!(
            err,
            Error::MissingCapability {
                identifier: "Clock".into(),
                module: "ui".into(),
            }
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_required_with_mismatched_type_reports_collision() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();

        let err = registry
            .resolve_required::<dyn Clock + Send>("ui")
            .err()
            .unwrap();
        match err {
            Error::IdentifierCollision {
                identifier,
                module,
                existing_type,
                new_type,
            } => {
                assert_eq!(identifier, "Clock");
                assert_eq!(module, "ui");
                assert!(existing_type.ends_with("tests::Clock"));
                assert!(new_type.ends_with("core::marker::Send"));
            }
            unexpected => panic!("unexpected error: {unexpected:?}"),
        }

        assert!(registry.resolve::<dyn Clock + Send>("ui").is_none());
        assert!(registry.resolve::<dyn Clock>("ui").is_some());
    }

    #[test]
    fn test_required_malformed_capability_is_error() {
        let registry = registry();
        let err = registry.resolve_required::<u32>("numbers").err().unwrap();
        assert!(matches!(err, Error::MalformedSignature { .. }));
    }

    #[test]
    #[should_panic(expected = "identifier collision")]
    fn test_required_with_mismatched_type_panics_under_strict_policy() {
        let registry = Registry::new(RegistryConfig::strict());
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();
        let _ = registry.resolve_required::<dyn Clock + Send>("ui");
    }

    #[test]
    #[should_panic(expected = "not found implementation for capability: Clock")]
    fn test_missing_required_panics_under_strict_policy() {
        let registry = Registry::new(RegistryConfig::strict());
        let _ = registry.resolve_required::<dyn Clock>("ui");
    }

    // ------------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------------

    #[test]
    fn test_internal_resolves_for_owning_module() {
        let registry = Registry::new(RegistryConfig::strict());
        registry
            .register_internal_instance::<dyn Clock>("registry", clock(3))
            .unwrap();
        assert_eq!(registry.resolve::<dyn Clock>("registry").unwrap().now(), 3);
    }

    #[test]
    #[should_panic(expected = "is internal")]
    fn test_internal_from_other_module_panics_when_enforced() {
        let registry = Registry::new(RegistryConfig::strict());
        registry
            .register_internal_instance::<dyn Clock>("registry", clock(3))
            .unwrap();
        let _ = registry.resolve::<dyn Clock>("ui");
    }

    #[test]
    fn test_internal_from_other_module_fails_open_when_warned() {
        let registry = registry();
        registry
            .register_internal_factory::<dyn Clock, _>("registry", || clock(4))
            .unwrap();

        assert_eq!(registry.resolve::<dyn Clock>("registry").unwrap().now(), 4);
        assert!(registry.violations().is_empty());

        assert_eq!(
            registry.resolve_with_hint::<dyn Clock>("ui", "ui::panel").unwrap().now(),
            4
        );
        assert_eq!(
            registry.violations(),
            vec![Error::VisibilityViolation {
                identifier: "Clock".into(),
                requesting_module: "ui".into(),
                owning_module: "registry".into(),
                called_from: "ui::panel".into(),
            }]
        );
    }

    #[test]
    fn test_internal_from_other_module_denied() {
        let registry =
            Registry::new(RegistryConfig::reporting().with_visibility(VisibilityPolicy::Deny));
        registry
            .register_internal_instance::<dyn Clock>("registry", clock(3))
            .unwrap();
        assert!(registry.resolve_with_hint::<dyn Clock>("ui", "ui::panel").is_none());
        assert!(registry.resolve::<dyn Clock>("registry").is_some());

        let violations = registry.take_violations();
        assert_eq!(violations.len(), 1);
        match &violations[0] {
            Error::VisibilityViolation {
                identifier,
                requesting_module,
                owning_module,
                called_from,
            } => {
                assert_eq!(identifier, "Clock");
                assert_eq!(requesting_module, "ui");
                assert_eq!(owning_module, "registry");
                assert_eq!(called_from, "ui::panel");
            }
            unexpected => panic!("unexpected error: {unexpected:?}"),
        }
        assert!(registry.violations().is_empty());
    }

    #[test]
    fn test_violation_call_site_defaults_to_caller_location() {
        let registry = registry();
        registry
            .register_internal_instance::<dyn Clock>("registry", clock(3))
            .unwrap();
        registry.resolve::<dyn Clock>("ui").unwrap();

        match &registry.violations()[..] {
            [Error::VisibilityViolation { called_from, .. }] => {
                assert!(called_from.contains("registry.rs"));
            }
            unexpected => panic!("unexpected violations: {unexpected:?}"),
        }

        registry.reset();
        assert!(registry.violations().is_empty());
    }

    #[test]
    fn test_exported_visible_everywhere() {
        let registry = Registry::new(RegistryConfig::strict());
        registry
            .register_instance::<dyn Clock>("registry", clock(3))
            .unwrap();
        assert!(registry.resolve::<dyn Clock>("ui").is_some());
    }

    // ------------------------------------------------------------------------
    // Unregistration
    // ------------------------------------------------------------------------

    #[test]
    fn test_unregister_and_reregister() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();

        assert!(registry.unregister::<dyn Clock>());
        assert!(registry.resolve::<dyn Clock>("ui").is_none());
        assert!(!registry.unregister::<dyn Clock>());

        registry
            .register_instance::<dyn Clock>("time", clock(2))
            .unwrap();
        assert_eq!(registry.resolve::<dyn Clock>("ui").unwrap().now(), 2);
    }

    #[test]
    fn test_unregister_identifiers_removes_only_listed() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();
        registry
            .register_factory::<dyn Greeter, _>("greeting", || {
                Arc::new(ClockGreeter { clock: clock(0) }) as Arc<dyn Greeter>
            })
            .unwrap();

        assert_eq!(registry.unregister_identifiers(&["Clock", "Calendar"]), 1);
        assert_eq!(registry.unregister_identifiers(&["Clock"]), 0);
        assert!(!registry.contains::<dyn Clock>());
        assert!(registry.contains::<dyn Greeter>());

        registry
            .register_instance::<dyn Clock>("time", clock(2))
            .unwrap();
        assert_eq!(registry.resolve::<dyn Clock>("ui").unwrap().now(), 2);
    }

    #[test]
    fn test_unregister_if_current_ignores_stale_handle() {
        let registry = registry();
        let stale = clock(1);
        registry
            .register_instance::<dyn Clock>("time", stale.clone())
            .unwrap();
        assert!(registry.unregister::<dyn Clock>());

        let current = clock(2);
        registry
            .register_instance::<dyn Clock>("time", current.clone())
            .unwrap();

        assert!(!registry.unregister_if_current(&stale));
        assert!(registry.contains::<dyn Clock>());

        assert!(registry.unregister_if_current(&current));
        assert!(!registry.contains::<dyn Clock>());
    }

    #[test]
    fn test_unregister_if_current_skips_factories() {
        let registry = registry();
        registry
            .register_factory::<dyn Clock, _>("time", || clock(1))
            .unwrap();
        let produced = registry.resolve::<dyn Clock>("ui").unwrap();
        assert!(!registry.unregister_if_current(&produced));
        assert!(registry.contains::<dyn Clock>());
    }

    #[test]
    fn test_resolved_instance_outlives_entry() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(5))
            .unwrap();
        let held = registry.resolve::<dyn Clock>("ui").unwrap();

        registry.unregister::<dyn Clock>();
        assert_eq!(held.now(), 5);
        assert_eq!(Arc::strong_count(&held), 1);
    }

    // ------------------------------------------------------------------------
    // Reset and inspection
    // ------------------------------------------------------------------------

    #[test]
    fn test_reset_isolates() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(5))
            .unwrap();
        registry
            .register_factory::<dyn Greeter, _>("greeting", || {
                Arc::new(ClockGreeter { clock: clock(0) }) as Arc<dyn Greeter>
            })
            .unwrap();
        let held = registry.resolve::<dyn Clock>("ui").unwrap();

        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.resolve::<dyn Clock>("ui").is_none());
        assert!(registry.resolve::<dyn Greeter>("ui").is_none());
        assert_eq!(held.now(), 5);
    }

    #[test]
    fn test_services_snapshot_is_ordered() {
        let registry = registry();
        registry
            .register_factory::<dyn Greeter, _>("greeting", || {
                Arc::new(ClockGreeter { clock: clock(0) }) as Arc<dyn Greeter>
            })
            .unwrap();
        registry
            .register_internal_instance::<dyn Clock>("time", clock(1))
            .unwrap();

        let services = registry.services();
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].identifier, "Clock");
        assert_eq!(services[0].owning_module, "registry");
        assert_eq!(services[0].source_module, "time");
        assert_eq!(services[0].kind, ProviderKind::Instance);
        assert!(services[0].internal);
        assert_eq!(services[1].identifier, "Greeter");
        assert_eq!(services[1].kind, ProviderKind::Factory);
        assert!(!services[1].internal);
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = registry();
        let other = registry.clone();
        registry
            .register_instance::<dyn Clock>("time", clock(1))
            .unwrap();
        assert_eq!(other.len(), 1);
        assert!(format!("{other:?}").contains("Registry"));
    }

    #[test]
    fn test_global_is_singleton() {
        assert!(std::ptr::eq(Registry::global(), Registry::global()));
    }

    // ------------------------------------------------------------------------
    // Concurrency
    // ------------------------------------------------------------------------

    #[test]
    fn test_concurrent_resolution() {
        let registry = registry();
        registry
            .register_instance::<dyn Clock>("time", clock(11))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    (0..500)
                        .map(|_| registry.resolve::<dyn Clock>("ui").unwrap().now())
                        .sum::<u64>()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 11 * 500);
        }
    }

    #[test]
    fn test_registry_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
