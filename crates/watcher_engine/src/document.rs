//! The persisted state document: settings and monitored entries in one JSON
//! object.
//!
//! Keys are camelCase. PascalCase keys written by older releases are still
//! accepted on load.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use watcher_core::{LinkKind, MonitoredEntry, Settings, DEFAULT_POLL_INTERVAL_MINUTES};
use watcher_logging::{watcher_debug, watcher_info, watcher_warn};

use crate::persist::{write_atomically, PersistError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StateDocument {
    #[serde(alias = "PreferredLinkType")]
    preferred_link_type: Option<String>,
    #[serde(alias = "PollIntervalMin", deserialize_with = "null_as_default")]
    poll_interval_min: i64,
    #[serde(alias = "AutoRun", deserialize_with = "null_as_default")]
    auto_run: bool,
    #[serde(alias = "CloseToTray", deserialize_with = "null_as_default")]
    close_to_tray: bool,
    #[serde(alias = "AlwaysStartMinimized", deserialize_with = "null_as_default")]
    always_start_minimized: bool,
    #[serde(alias = "MonitoredUrls", deserialize_with = "null_as_default")]
    monitored_urls: Vec<PersistedEntry>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            preferred_link_type: Some(LinkKind::default().as_str().to_string()),
            poll_interval_min: i64::from(DEFAULT_POLL_INTERVAL_MINUTES),
            auto_run: false,
            close_to_tray: false,
            always_start_minimized: false,
            monitored_urls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedEntry {
    #[serde(default, alias = "Url")]
    url: Option<String>,
    #[serde(default, alias = "LastContentHash", deserialize_with = "null_as_default")]
    last_content_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_dispatched_link: Option<String>,
}

/// A `null` value reads the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Settings and entries as read from disk, before collection invariants are
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedState {
    pub settings: Settings,
    pub entries: Vec<MonitoredEntry>,
}

/// The state document existed but could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("state document {path:?} is corrupt: {message}")]
pub struct CorruptState {
    pub path: PathBuf,
    pub message: String,
}

/// Reads the state document at `path`.
///
/// A missing document yields defaults silently; an unreadable or unparsable
/// one yields defaults plus a [`CorruptState`] warning. Never fails.
pub fn load_state(path: &Path) -> (LoadedState, Option<CorruptState>) {
    match read_state(path) {
        Ok(Some(loaded)) => {
            watcher_info!(
                "Loaded state document from {:?} ({} entries)",
                path,
                loaded.entries.len()
            );
            (loaded, None)
        }
        Ok(None) => {
            watcher_info!("No state document at {:?}; starting with defaults", path);
            (LoadedState::default(), None)
        }
        Err(warning) => {
            watcher_warn!("{}; loading defaults", warning);
            (LoadedState::default(), Some(warning))
        }
    }
}

/// Like [`load_state`], but reports a missing document as `Ok(None)` and
/// leaves the fallback to the caller.
pub(crate) fn read_state(path: &Path) -> Result<Option<LoadedState>, CorruptState> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(corrupt(path, err.to_string())),
    };

    let document: StateDocument =
        serde_json::from_str(&content).map_err(|err| corrupt(path, err.to_string()))?;

    let preferred = match document.preferred_link_type {
        Some(name) => name.parse::<LinkKind>().unwrap_or_else(|err| {
            watcher_warn!("{}; using {}", err, LinkKind::default());
            LinkKind::default()
        }),
        None => LinkKind::default(),
    };
    let minutes = u32::try_from(document.poll_interval_min.max(0)).unwrap_or(u32::MAX);
    let mut settings = Settings::from_stored(preferred, minutes);
    settings.auto_run = document.auto_run;
    settings.close_to_tray = document.close_to_tray;
    settings.always_start_minimized = document.always_start_minimized;

    let entries = document
        .monitored_urls
        .into_iter()
        .filter_map(|entry| {
            let Some(url) = entry.url else {
                watcher_warn!("Skipping stored entry without a url in {:?}", path);
                return None;
            };
            Some(MonitoredEntry {
                url,
                last_content_hash: entry.last_content_hash,
                last_dispatched_link: entry.last_dispatched_link.filter(|link| !link.is_empty()),
            })
        })
        .collect::<Vec<_>>();

    watcher_debug!(
        "Read state document from {:?} ({} entries)",
        path,
        entries.len()
    );
    Ok(Some(LoadedState { settings, entries }))
}

fn corrupt(path: &Path, message: String) -> CorruptState {
    CorruptState {
        path: path.to_path_buf(),
        message,
    }
}

/// Serializes settings and entries into the document format.
pub fn render_state(settings: &Settings, entries: &[MonitoredEntry]) -> Result<String, PersistError> {
    let document = StateDocument {
        preferred_link_type: Some(settings.preferred_link_kind.as_str().to_string()),
        poll_interval_min: i64::from(settings.poll_interval_minutes()),
        auto_run: settings.auto_run,
        close_to_tray: settings.close_to_tray,
        always_start_minimized: settings.always_start_minimized,
        monitored_urls: entries
            .iter()
            .map(|entry| PersistedEntry {
                url: Some(entry.url.clone()),
                last_content_hash: entry.last_content_hash.clone(),
                last_dispatched_link: entry.last_dispatched_link.clone(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn save_state(
    path: &Path,
    settings: &Settings,
    entries: &[MonitoredEntry],
) -> Result<(), PersistError> {
    let content = render_state(settings, entries)?;
    write_atomically(path, &content)
}
