//! Configuration for the capability registry.
//!
//! Provides [`ModulaConfig`], loaded from TOML files, environment variables,
//! and defaults using the `confyg` crate, and [`RegistryConfig`], the policy
//! block the registry itself consumes.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `MODULA_CONFIG` environment variable
//! 3. XDG default: `~/.config/modula/config.toml`
//! 4. Built-in defaults

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

// ============================================================================
// Policies
// ============================================================================

/// What resolution does when an internal capability is requested from
/// outside its owning module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityPolicy {
    /// Report and panic.
    Enforce,
    /// Report and resolve anyway.
    Warn,
    /// Report and resolve to nothing.
    Deny,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Enforce
        } else {
            Self::Warn
        }
    }
}

/// What the registry does with wiring defects (double registration,
/// identifier collisions, missing required capabilities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectPolicy {
    /// Report and panic.
    Panic,
    /// Report and return the error to the caller.
    Report,
}

impl Default for DefectPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Panic
        } else {
            Self::Report
        }
    }
}

// ============================================================================
// Configuration structs
// ============================================================================

/// Registry policy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Handling of cross-module access to internal capabilities.
    pub visibility: VisibilityPolicy,

    /// Handling of wiring defects.
    pub defects: DefectPolicy,
}

impl RegistryConfig {
    /// Policies that never panic: every defect comes back as an error.
    pub fn reporting() -> Self {
        Self {
            visibility: VisibilityPolicy::Warn,
            defects: DefectPolicy::Report,
        }
    }

    /// Policies that panic on every defect and violation.
    pub fn strict() -> Self {
        Self {
            visibility: VisibilityPolicy::Enforce,
            defects: DefectPolicy::Panic,
        }
    }

    /// Override the visibility policy.
    pub fn with_visibility(mut self, visibility: VisibilityPolicy) -> Self {
        self.visibility = visibility;
        self
    }

    /// Override the defect policy.
    pub fn with_defects(mut self, defects: DefectPolicy) -> Self {
        self.defects = defects;
        self
    }
}

/// Main configuration for Modula applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulaConfig {
    /// Registry policies.
    pub registry: RegistryConfig,
}

// ============================================================================
// Config loading
// ============================================================================

impl ModulaConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Loading priority:
    /// 1. Explicit `config_path` (from `--config` flag)
    /// 2. `MODULA_CONFIG` env var
    /// 3. XDG default: `~/.config/modula/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("MODULA");
        env_opts.add_section("registry");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        log::debug!("loaded registry config: {:?}", config.registry);
        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("MODULA_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("modula").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
