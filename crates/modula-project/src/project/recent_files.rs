use std::path::Path;

use modula_core::{Inject, Registry};
use parking_lot::Mutex;

use super::MODULE;
use super::configuration::ProjectConfiguration;
use super::types::RecentFile;
use crate::Result;
use crate::io::FileSystem;
use crate::mi::MultiInstancesProvider;

/// Maintains the list of recently opened projects.
pub trait RecentFilesController: Send + Sync {
    /// The list, most recent first. Files that no longer exist are dropped.
    fn recent_files(&self) -> Result<Vec<RecentFile>>;

    /// Put `file` at the front, removing any older entry for the same path.
    fn prepend_recent_file(&self, file: RecentFile) -> Result<()>;

    /// Replace every entry for `before` with `after` (project moved or renamed).
    fn move_recent_file(&self, before: &Path, after: RecentFile) -> Result<()>;

    fn clear_recent_files(&self) -> Result<()>;
}

#[derive(Default)]
struct Cache {
    files: Vec<RecentFile>,
    /// Configuration revision `files` was loaded from; `None` until first load.
    revision: Option<u64>,
}

/// [`RecentFilesController`] backed by the project configuration.
///
/// The list is loaded lazily and reloaded whenever the stored list changes.
/// Only the main instance writes the list back.
pub struct RecentFiles {
    configuration: Inject<dyn ProjectConfiguration>,
    file_system: Inject<dyn FileSystem>,
    instances: Inject<dyn MultiInstancesProvider>,
    cache: Mutex<Cache>,
}

impl RecentFiles {
    pub fn new(registry: &Registry) -> Self {
        Self {
            configuration: Inject::with_registry(registry, MODULE),
            file_system: Inject::with_registry(registry, MODULE),
            instances: Inject::with_registry(registry, MODULE),
            cache: Mutex::new(Cache::default()),
        }
    }

    fn load(&self, cache: &mut Cache) -> Result<()> {
        let configuration = self.configuration.required()?;
        let revision = configuration.recent_files_revision();
        if cache.revision == Some(revision) {
            return Ok(());
        }

        let file_system = self.file_system.required()?;
        let stored = configuration.recent_files();
        let stored_len = stored.len();
        cache.files = stored
            .into_iter()
            .filter(|file| file_system.exists(&file.path))
            .collect();
        cache.revision = Some(revision);

        let removed = stored_len - cache.files.len();
        if removed > 0 {
            log::debug!("{removed} recent files no longer exist");
            self.save(cache)?;
        }
        Ok(())
    }

    fn update(&self, cache: &mut Cache, files: Vec<RecentFile>) -> Result<()> {
        if cache.files == files {
            return Ok(());
        }
        cache.files = files;
        self.save(cache)
    }

    fn save(&self, cache: &mut Cache) -> Result<()> {
        if !self.instances.required()?.is_main_instance() {
            log::trace!("not the main instance, recent files kept in memory");
            return Ok(());
        }
        let configuration = self.configuration.required()?;
        configuration.set_recent_files(cache.files.clone());
        cache.revision = Some(configuration.recent_files_revision());
        Ok(())
    }
}

impl RecentFilesController for RecentFiles {
    fn recent_files(&self) -> Result<Vec<RecentFile>> {
        let mut cache = self.cache.lock();
        self.load(&mut cache)?;
        Ok(cache.files.clone())
    }

    fn prepend_recent_file(&self, file: RecentFile) -> Result<()> {
        if file.path.as_os_str().is_empty() {
            return Ok(());
        }
        let max = self.configuration.required()?.max_recent_files();

        let mut cache = self.cache.lock();
        self.load(&mut cache)?;
        let mut files = cache.files.clone();
        files.retain(|existing| existing.path != file.path);
        files.insert(0, file);
        files.truncate(max);
        self.update(&mut cache, files)
    }

    fn move_recent_file(&self, before: &Path, after: RecentFile) -> Result<()> {
        let mut cache = self.cache.lock();
        self.load(&mut cache)?;
        let files = cache
            .files
            .iter()
            .map(|file| {
                if file.path == before {
                    after.clone()
                } else {
                    file.clone()
                }
            })
            .collect();
        self.update(&mut cache, files)
    }

    fn clear_recent_files(&self) -> Result<()> {
        let mut cache = self.cache.lock();
        self.load(&mut cache)?;
        self.update(&mut cache, Vec::new())
    }
}
