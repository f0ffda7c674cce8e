//! Modula Project — example modules wired through the capability registry.
//!
//! Each module registers the capabilities it provides and resolves the ones
//! it needs through [`modula_core::Registry`]:
//!
//! - [`io`]: file system access
//! - [`framework`]: user interaction
//! - [`cloud`]: cloud account state
//! - [`mi`]: multi-instance coordination
//! - [`project`]: recent files and the open/save scenario, built on the
//!   capabilities above

pub mod cloud;
pub mod error;
pub mod framework;
pub mod io;
pub mod mi;
pub mod project;

pub use error::{Error, Result};

use modula_core::ModuleSet;

/// Every example module, in registration order.
pub fn default_modules() -> ModuleSet {
    ModuleSet::new()
        .with(io::IoModule)
        .with(framework::FrameworkModule::default())
        .with(cloud::CloudModule)
        .with(mi::MiModule)
        .with(project::ProjectModule::default())
}
