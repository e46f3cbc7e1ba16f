//! Watcher core: pure domain model for monitored posts, free of IO.
mod entry;
mod fingerprint;
mod links;
mod settings;
mod state;
mod validate;

pub use entry::{AddError, EntryCollection, MonitoredEntry, MAX_ENTRIES};
pub use fingerprint::{fingerprint, has_changed};
pub use links::{extract_link, find_link, ExtractedLink, LinkKind, ParseLinkKindError};
pub use settings::{
    Settings, SettingsError, DEFAULT_POLL_INTERVAL_MINUTES, MIN_POLL_INTERVAL_MINUTES,
};
pub use state::MonitorStatus;
pub use validate::{is_valid_post_url, UrlRules, DEFAULT_POST_PREFIX};
