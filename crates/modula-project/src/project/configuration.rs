use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::types::{RecentFile, SaveLocationType};

/// Project settings. Internal to the project module.
pub trait ProjectConfiguration: Send + Sync {
    fn recent_files(&self) -> Vec<RecentFile>;
    fn set_recent_files(&self, files: Vec<RecentFile>);

    /// Bumped on every [`ProjectConfiguration::set_recent_files`].
    fn recent_files_revision(&self) -> u64;

    fn max_recent_files(&self) -> usize;

    fn should_ask_save_location_type(&self) -> bool;
    fn set_should_ask_save_location_type(&self, ask: bool);

    fn last_used_save_location_type(&self) -> SaveLocationType;
    fn set_last_used_save_location_type(&self, location: SaveLocationType);
}

/// Stored project setting values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettingsValues {
    pub recent_files: Vec<RecentFile>,
    pub max_recent_files: usize,
    pub ask_save_location_type: bool,
    pub last_used_save_location_type: SaveLocationType,
}

impl Default for ProjectSettingsValues {
    fn default() -> Self {
        Self {
            recent_files: Vec::new(),
            max_recent_files: 20,
            ask_save_location_type: true,
            last_used_save_location_type: SaveLocationType::Undefined,
        }
    }
}

/// In-memory [`ProjectConfiguration`].
#[derive(Debug, Default)]
pub struct ProjectSettings {
    values: RwLock<ProjectSettingsValues>,
    revision: AtomicU64,
}

impl ProjectSettings {
    pub fn new(values: ProjectSettingsValues) -> Self {
        Self {
            values: RwLock::new(values),
            revision: AtomicU64::new(0),
        }
    }

    /// Copy of the current values.
    pub fn snapshot(&self) -> ProjectSettingsValues {
        self.values.read().clone()
    }
}

impl ProjectConfiguration for ProjectSettings {
    fn recent_files(&self) -> Vec<RecentFile> {
        self.values.read().recent_files.clone()
    }

    fn set_recent_files(&self, files: Vec<RecentFile>) {
        self.values.write().recent_files = files;
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    fn recent_files_revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    fn max_recent_files(&self) -> usize {
        self.values.read().max_recent_files
    }

    fn should_ask_save_location_type(&self) -> bool {
        self.values.read().ask_save_location_type
    }

    fn set_should_ask_save_location_type(&self, ask: bool) {
        self.values.write().ask_save_location_type = ask;
    }

    fn last_used_save_location_type(&self) -> SaveLocationType {
        self.values.read().last_used_save_location_type
    }

    fn set_last_used_save_location_type(&self, location: SaveLocationType) {
        self.values.write().last_used_save_location_type = location;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ProjectSettings::default();
        assert!(settings.recent_files().is_empty());
        assert_eq!(settings.max_recent_files(), 20);
        assert!(settings.should_ask_save_location_type());
        assert_eq!(
            settings.last_used_save_location_type(),
            SaveLocationType::Undefined
        );
    }

    #[test]
    fn test_set_recent_files_bumps_revision() {
        let settings = ProjectSettings::default();
        let before = settings.recent_files_revision();
        settings.set_recent_files(vec![RecentFile::new("/a.mscz")]);
        assert_eq!(settings.recent_files_revision(), before + 1);
        assert_eq!(settings.snapshot().recent_files.len(), 1);
    }

    #[test]
    fn test_values_partial_input_uses_defaults() {
        let values: ProjectSettingsValues = serde_json::from_str(
            r#"{"max_recent_files": 5, "last_used_save_location_type": "cloud"}"#,
        )
        .unwrap();
        assert_eq!(values.max_recent_files, 5);
        assert!(values.ask_save_location_type);
        assert_eq!(values.last_used_save_location_type, SaveLocationType::Cloud);
    }
}
