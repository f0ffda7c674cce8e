//! User interaction capability.
//!
//! [`Interactive`] is how controllers ask the user something. The default
//! provider registered by [`FrameworkModule`] never blocks: it answers every
//! question with a preconfigured button and accepts the preselected save
//! location.

use std::sync::Arc;

use modula_core::{ModuleSetup, Registry, Result};

/// The user's answer to a save location prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationChoice {
    /// Save to the cloud rather than locally.
    pub cloud: bool,
    /// Do not ask again; reuse this choice next time.
    pub remember: bool,
}

/// Dialogs shown to the user.
pub trait Interactive: Send + Sync {
    /// Ask a question with the given buttons.
    ///
    /// Returns the index of the pressed button, or `None` if the dialog was
    /// dismissed.
    fn question(&self, title: &str, text: &str, buttons: &[&str]) -> Option<usize>;

    /// Ask whether to save locally or to the cloud. `None` when cancelled.
    fn choose_save_location(&self, preselect_cloud: bool) -> Option<LocationChoice>;
}

/// [`Interactive`] for headless runs.
#[derive(Debug, Clone, Default)]
pub struct NonInteractive {
    answer: Option<usize>,
}

impl NonInteractive {
    /// Answer every question by pressing button `index`.
    pub fn answering(index: usize) -> Self {
        Self {
            answer: Some(index),
        }
    }
}

impl Interactive for NonInteractive {
    fn question(&self, title: &str, text: &str, buttons: &[&str]) -> Option<usize> {
        let answer = self.answer.filter(|index| *index < buttons.len());
        log::info!("{title}: {text} -> {:?}", answer.map(|index| buttons[index]));
        answer
    }

    fn choose_save_location(&self, preselect_cloud: bool) -> Option<LocationChoice> {
        Some(LocationChoice {
            cloud: preselect_cloud,
            remember: false,
        })
    }
}

/// Registers the headless [`Interactive`] provider.
#[derive(Debug, Clone, Default)]
pub struct FrameworkModule {
    interactive: NonInteractive,
}

impl FrameworkModule {
    /// Use a specific headless provider.
    pub fn with_interactive(interactive: NonInteractive) -> Self {
        Self { interactive }
    }
}

impl ModuleSetup for FrameworkModule {
    fn module_name(&self) -> &'static str {
        "framework"
    }

    fn register_exports(&self, registry: &Registry) -> Result<()> {
        registry.register_instance::<dyn Interactive>(
            self.module_name(),
            Arc::new(self.interactive.clone()),
        )
    }
}
