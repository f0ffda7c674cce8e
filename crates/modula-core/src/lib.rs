//! Modula Core — capability identity, registry and lazy injection.
//!
//! This crate is the wiring layer shared by every Modula module. Modules
//! register providers for capabilities (trait objects) under an identifier
//! derived from the trait's type name, and consumers resolve them on first
//! use. It has no internal Modula dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`identity`]: Identifier and owning-module extraction from type names
//! - [`registry`]: The thread-safe capability registry
//! - [`inject`]: Lazily-resolved consumer bindings
//! - [`module`]: Module lifecycle hooks and bootstrap ordering
//! - [`config`]: Registry policies and configuration loading

pub mod config;
pub mod error;
pub mod identity;
pub mod inject;
pub mod module;
pub mod registry;

// Re-export key types at crate root for convenience
pub use config::{DefectPolicy, ModulaConfig, RegistryConfig, VisibilityPolicy};
pub use error::{Error, Result};
pub use identity::CapabilityInfo;
pub use inject::Inject;
pub use module::{ImportCheck, ModuleSet, ModuleSetup};
pub use registry::{Factory, ProviderKind, Registry, ServiceSummary};
