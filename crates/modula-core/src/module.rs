//! Module setup and bootstrap ordering.
//!
//! A module is a coarse ownership boundary that registers the capabilities
//! it provides and checks the ones it needs. [`ModuleSet::bootstrap`] runs
//! every module's exports before any module's imports, so providers are in
//! place before consumers start resolving. The exports a set registered are
//! removed again when bootstrap fails and on [`ModuleSet::teardown`].

use std::collections::BTreeSet;

use crate::{Error, Registry, Result};

/// Lifecycle hooks of one module.
pub trait ModuleSetup: Send + Sync {
    /// Module name; also the name it declares when resolving.
    fn module_name(&self) -> &'static str;

    /// Register the capabilities this module provides.
    fn register_exports(&self, registry: &Registry) -> Result<()>;

    /// Check the capabilities this module cannot work without.
    fn resolve_imports(&self, _registry: &Registry) -> Result<()> {
        Ok(())
    }

    /// Called once every module has registered and resolved.
    fn on_init(&self, _registry: &Registry) -> Result<()> {
        Ok(())
    }

    /// Called on teardown, in reverse registration order.
    fn on_deinit(&self) {}
}

/// Outcome of one module's import check.
#[derive(Debug)]
pub struct ImportCheck {
    /// Module name.
    pub module: &'static str,
    /// Result of [`ModuleSetup::resolve_imports`].
    pub result: Result<()>,
}

/// An ordered set of modules bootstrapped together.
#[derive(Default)]
pub struct ModuleSet {
    modules: Vec<Box<dyn ModuleSetup>>,
    initialized: bool,
    /// Registry bootstrapped into, with the identifiers the set registered.
    exported: Option<(Registry, Vec<String>)>,
}

impl ModuleSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module (builder style).
    pub fn with(mut self, module: impl ModuleSetup + 'static) -> Self {
        self.add(module);
        self
    }

    /// Add a module.
    pub fn add(&mut self, module: impl ModuleSetup + 'static) {
        self.modules.push(Box::new(module));
    }

    /// Module names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.module_name()).collect()
    }

    /// Whether [`ModuleSet::bootstrap`] completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register all exports, check all imports, then initialise every module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Module`] if a module name is declared twice or the
    /// set was already bootstrapped, otherwise the first error raised by a
    /// module hook. Nothing is initialised when exports or imports fail, and
    /// on any failure the exports registered by this call are removed, so the
    /// set can be bootstrapped again.
    pub fn bootstrap(&mut self, registry: &Registry) -> Result<()> {
        if self.initialized {
            return Err(Error::module("bootstrap", "module set already initialised"));
        }
        self.check_unique_names()?;

        let before: BTreeSet<String> = registry
            .services()
            .into_iter()
            .map(|service| service.identifier)
            .collect();
        let wired = self.wire(registry);
        let exported = self.new_exports(registry, &before);

        if let Err(err) = wired {
            let removed = registry.unregister_identifiers(&exported);
            log::warn!("bootstrap failed, {removed} exports rolled back: {err}");
            return Err(err);
        }

        self.exported = Some((registry.clone(), exported));
        self.initialized = true;
        log::info!(
            "bootstrapped {} modules, {} capabilities registered",
            self.modules.len(),
            registry.len()
        );
        Ok(())
    }

    /// Register every module's exports, in order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a module; exports registered before
    /// it stay in place.
    pub fn register_exports(&self, registry: &Registry) -> Result<()> {
        for module in &self.modules {
            log::debug!("{}: registering exports", module.module_name());
            module.register_exports(registry)?;
        }
        Ok(())
    }

    /// Run every module's import check without stopping at the first failure.
    pub fn check_imports(&self, registry: &Registry) -> Vec<ImportCheck> {
        self.modules
            .iter()
            .map(|module| {
                let result = module.resolve_imports(registry);
                if let Err(ref err) = result {
                    log::error!("{}: import check failed: {err}", module.module_name());
                }
                ImportCheck {
                    module: module.module_name(),
                    result,
                }
            })
            .collect()
    }

    /// Run `on_deinit` in reverse order, then unregister the set's exports.
    ///
    /// Handles consumers already resolved stay valid.
    pub fn teardown(&mut self) {
        if !self.initialized {
            return;
        }
        for module in self.modules.iter().rev() {
            log::debug!("{}: deinit", module.module_name());
            module.on_deinit();
        }
        if let Some((registry, exported)) = self.exported.take() {
            registry.unregister_identifiers(&exported);
        }
        self.initialized = false;
    }

    fn wire(&self, registry: &Registry) -> Result<()> {
        self.register_exports(registry)?;
        for check in self.check_imports(registry) {
            check.result?;
        }
        for module in &self.modules {
            module.on_init(registry)?;
        }
        Ok(())
    }

    /// Identifiers registered by this set's modules that were not in `before`.
    fn new_exports(&self, registry: &Registry, before: &BTreeSet<String>) -> Vec<String> {
        let names = self.names();
        registry
            .services()
            .into_iter()
            .filter(|service| {
                !before.contains(&service.identifier)
                    && names.iter().any(|name| *name == service.source_module)
            })
            .map(|service| service.identifier)
            .collect()
    }

    fn check_unique_names(&self) -> Result<()> {
        let mut seen = Vec::with_capacity(self.modules.len());
        for name in self.names() {
            if seen.contains(&name) {
                return Err(Error::module(name, "declared twice"));
            }
            seen.push(name);
        }
        Ok(())
    }
}
