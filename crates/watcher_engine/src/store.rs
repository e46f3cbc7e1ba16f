use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use watcher_core::{AddError, EntryCollection, MonitoredEntry, Settings, SettingsError, UrlRules};
use watcher_logging::{watcher_debug, watcher_error, watcher_info, watcher_warn};

use crate::document::{load_state, read_state, save_state, CorruptState};
use crate::events::EventSink;
use crate::persist::PersistError;
use crate::WatchEvent;

/// Store shared between the shell and the scheduler thread.
pub type SharedStore = Arc<Mutex<EntryStore>>;

/// Locks a shared store, recovering the data if a previous holder panicked.
pub fn lock_store(store: &Mutex<EntryStore>) -> MutexGuard<'_, EntryStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the monitored entries and settings, and keeps the state document on
/// disk in step with them.
///
/// Other processes may edit the same document, so every mutation and every
/// [`save`](Self::save) first re-reads it. Entries and settings on disk win;
/// this store only carries its own fingerprint bookkeeping over.
///
/// Write failures never fail an operation: they are logged, and the first
/// one is also reported as a [`WatchEvent::PersistenceWarning`].
pub struct EntryStore {
    path: PathBuf,
    rules: UrlRules,
    settings: Settings,
    entries: EntryCollection,
    events: Arc<dyn EventSink>,
    save_warning_sent: bool,
    // In-memory edits the document has not seen yet; a reload would lose them.
    unsaved: bool,
}

impl EntryStore {
    /// Loads the document at `path`, falling back to defaults on corruption.
    pub fn load(
        path: impl Into<PathBuf>,
        rules: UrlRules,
        events: Arc<dyn EventSink>,
    ) -> (Self, Option<CorruptState>) {
        let path = path.into();
        let (loaded, warning) = load_state(&path);
        let entries = restore_entries(loaded.entries, &rules);
        let store = Self {
            path,
            rules,
            settings: loaded.settings,
            entries,
            events,
            save_warning_sent: false,
            unsaved: false,
        };
        (store, warning)
    }

    /// Re-reads the document so edits made by other processes are not lost.
    ///
    /// Entries and settings come from disk. For entries that are still
    /// present, this store's fingerprint and dispatched link are kept. A
    /// missing or corrupt document, or unsaved local edits, leave the store
    /// as it is.
    pub fn reload(&mut self) {
        if self.unsaved {
            watcher_debug!("Skipping reload of {:?}: local edits not yet saved", self.path);
            return;
        }
        let loaded = match read_state(&self.path) {
            Ok(Some(loaded)) => loaded,
            Ok(None) => return,
            Err(warning) => {
                watcher_warn!("Keeping in-memory state: {}", warning);
                return;
            }
        };

        let mut entries = restore_entries(loaded.entries, &self.rules);
        for ours in self.entries.entries() {
            if ours.last_content_hash.is_empty() {
                continue;
            }
            entries.record_change(
                &ours.url,
                &ours.last_content_hash,
                ours.last_dispatched_link.as_deref(),
            );
        }
        self.entries = entries;
        self.settings = loaded.settings;
    }

    pub fn add(&mut self, url: &str) -> Result<(), AddError> {
        self.reload();
        self.entries.add(url, &self.rules)?;
        watcher_info!("Added {}", url.trim());
        self.save_logged();
        Ok(())
    }

    pub fn remove_many(&mut self, urls: &HashSet<String>) -> usize {
        self.reload();
        let removed = self.entries.remove_many(urls);
        if removed > 0 {
            watcher_info!("Removed {} entr{}", removed, if removed == 1 { "y" } else { "ies" });
            self.save_logged();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.reload();
        self.entries.clear();
        watcher_info!("Cleared all entries");
        self.save_logged();
    }

    /// Updates fingerprint bookkeeping without persisting; see [`Self::save`].
    /// Returns `false` if `url` is no longer monitored.
    pub fn record_change(
        &mut self,
        url: &str,
        new_hash: &str,
        dispatched_link: Option<&str>,
    ) -> bool {
        self.entries.record_change(url, new_hash, dispatched_link)
    }

    /// Applies `edit` to the settings and persists them if it succeeds.
    pub fn update_settings<F>(&mut self, edit: F) -> Result<(), SettingsError>
    where
        F: FnOnce(&mut Settings) -> Result<(), SettingsError>,
    {
        self.reload();
        let mut next = self.settings.clone();
        edit(&mut next)?;
        if next != self.settings {
            self.settings = next;
            self.save_logged();
        }
        Ok(())
    }

    /// Merges with the document on disk (see [`Self::reload`]) and writes the
    /// result.
    pub fn save(&mut self) -> Result<(), PersistError> {
        self.reload();
        self.write()
    }

    fn write(&mut self) -> Result<(), PersistError> {
        match save_state(&self.path, &self.settings, self.entries.entries()) {
            Ok(()) => {
                self.unsaved = false;
                Ok(())
            }
            Err(err) => {
                self.unsaved = true;
                watcher_error!("Failed to write state document {:?}: {}", self.path, err);
                if !self.save_warning_sent {
                    self.save_warning_sent = true;
                    self.events.emit(WatchEvent::PersistenceWarning {
                        message: format!("Settings could not be saved: {err}"),
                    });
                }
                Err(err)
            }
        }
    }

    fn save_logged(&mut self) {
        // Failures are already logged and reported by `write`.
        let _ = self.write();
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rules(&self) -> &UrlRules {
        &self.rules
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, url: &str) -> Option<&MonitoredEntry> {
        self.entries.get(url)
    }

    pub fn snapshot(&self) -> Vec<MonitoredEntry> {
        self.entries.snapshot()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn restore_entries(stored: Vec<MonitoredEntry>, rules: &UrlRules) -> EntryCollection {
    let (entries, dropped) = EntryCollection::restore(stored, rules);
    for url in dropped {
        watcher_warn!("Dropping stored entry {:?}: invalid or duplicate URL, or over the limit", url);
    }
    entries
}
