//! The `modula` application.
//!
//! Loads configuration, initialises logging, bootstraps the example modules
//! into a registry and reports on what got wired.

use crate::cli::{CliArgs, Command};
use crate::config_handlers;
use modula_core::{
    DefectPolicy, Error, ImportCheck, ModulaConfig, ModuleSet, ProviderKind, Registry,
    RegistryConfig, Result, ServiceSummary, VisibilityPolicy,
};
use tracing_subscriber::EnvFilter;

// ============================================================================
// ModulaCli
// ============================================================================

/// CLI application state.
pub struct ModulaCli {
    name: String,
    config: ModulaConfig,
    version: String,
}

impl ModulaCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = ModulaConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create a new CLI application.
    pub fn new(name: impl Into<String>, config: ModulaConfig) -> Self {
        Self {
            name: name.into(),
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ModulaConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity
    /// flags. Registry diagnostics emitted through `log` are captured too.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI against the process-wide registry.
    pub fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);
        let registry = Registry::init_global(self.config.registry.clone())?;
        self.run_with(args, registry)
    }

    /// Run the CLI against a given registry.
    pub fn run_with(&self, args: CliArgs, registry: &Registry) -> Result<()> {
        match args.command {
            Some(Command::Capabilities { json }) => {
                let services = self.bootstrap(registry)?;
                if json {
                    println!("{}", services_json(&services)?);
                } else {
                    print!("{}", services_table(&services));
                }
                Ok(())
            }
            Some(Command::Check) => {
                let checks = check_modules(&modula_project::default_modules(), registry.config());
                print!("{}", checks_report(&checks));
                match checks.iter().filter(|c| c.result.is_err()).count() {
                    0 => Ok(()),
                    failed => Err(Error::module(
                        "check",
                        format!("{failed} modules failed their import check"),
                    )),
                }
            }
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {}, use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }

    /// Bootstrap the example modules and snapshot the registry.
    fn bootstrap(&self, registry: &Registry) -> Result<Vec<ServiceSummary>> {
        let mut modules = modula_project::default_modules();
        modules.bootstrap(registry)?;
        let services = registry.services();
        modules.teardown();
        Ok(services)
    }

}

// ============================================================================
// Import checks
// ============================================================================

/// Register a module set's exports into a scratch registry, then run every
/// import check once.
///
/// The scratch registry takes its policies from `config`, except that
/// defects are reported and visibility violations denied rather than
/// panicking, so every module gets a result.
pub fn check_modules(modules: &ModuleSet, config: &RegistryConfig) -> Vec<ImportCheck> {
    let visibility = match config.visibility {
        VisibilityPolicy::Enforce => VisibilityPolicy::Deny,
        other => other,
    };
    let registry = Registry::new(
        config
            .clone()
            .with_visibility(visibility)
            .with_defects(DefectPolicy::Report),
    );

    if let Err(err) = modules.register_exports(&registry) {
        tracing::warn!("exports incomplete: {err}");
    }
    modules.check_imports(&registry)
}

// ============================================================================
// Rendering
// ============================================================================

/// Render services as an aligned text table.
pub fn services_table(services: &[ServiceSummary]) -> String {
    let width = services
        .iter()
        .map(|s| s.identifier.len())
        .max()
        .unwrap_or(0)
        .max("CAPABILITY".len());

    let mut out = format!(
        "{:<width$}  {:<10}  {:<10}  {:<8}  VISIBILITY\n",
        "CAPABILITY", "MODULE", "SOURCE", "KIND"
    );
    for service in services {
        let kind = match service.kind {
            ProviderKind::Instance => "instance",
            ProviderKind::Factory => "factory",
        };
        let visibility = if service.internal { "internal" } else { "public" };
        out.push_str(&format!(
            "{:<width$}  {:<10}  {:<10}  {:<8}  {visibility}\n",
            service.identifier, service.owning_module, service.source_module, kind
        ));
    }
    out
}

/// Render services as pretty-printed JSON.
pub fn services_json(services: &[ServiceSummary]) -> Result<String> {
    serde_json::to_string_pretty(services).map_err(|e| Error::config(e.to_string()))
}

/// Render import check results, one line per module.
pub fn checks_report(checks: &[ImportCheck]) -> String {
    checks
        .iter()
        .map(|check| match &check.result {
            Ok(()) => format!("{:<10}  ok\n", check.module),
            Err(err) => format!("{:<10}  FAILED: {err}\n", check.module),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
