//! Command-line front end for Modula.
//!
//! # Key Abstractions
//!
//! - [`app::ModulaCli`]: loads configuration, initialises logging and
//!   dispatches commands against a registry
//! - [`cli::CliArgs`]: the clap argument tree

pub mod app;
pub mod cli;
pub mod config_handlers;

pub use app::ModulaCli;
pub use cli::CliArgs;
