use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where a project is saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveLocationType {
    #[default]
    Undefined,
    Local,
    Cloud,
}

/// Which save action triggered a location prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    Save,
    SaveAs,
    SaveCopy,
    SaveSelection,
}

/// The user's reaction when saving to the cloud is not possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveToCloudResponse {
    Cancel,
    Ok,
    SaveLocallyInstead,
}

/// A resolved save target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveLocation {
    pub location_type: SaveLocationType,
    pub mode: SaveMode,
}

/// An entry in the recent files list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFile {
    pub path: PathBuf,
    /// Shown instead of the file name when set (cloud projects).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl RecentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// The display name, falling back to the file name.
    pub fn title(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => self
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_file_title() {
        let file = RecentFile::new("/scores/minuet.mscz");
        assert_eq!(file.title(), "minuet.mscz");
        assert_eq!(file.with_display_name("Minuet").title(), "Minuet");
    }

    #[test]
    fn test_save_location_type_default() {
        assert_eq!(SaveLocationType::default(), SaveLocationType::Undefined);
    }
}
