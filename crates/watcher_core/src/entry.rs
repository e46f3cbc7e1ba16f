use std::collections::HashSet;

use crate::UrlRules;

/// Upper bound on the number of monitored posts.
pub const MAX_ENTRIES: usize = 5;

/// One monitored post plus its change-detection and dispatch bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonitoredEntry {
    pub url: String,
    /// Fingerprint of the post body at the last observed change; empty before
    /// the first successful fetch.
    pub last_content_hash: String,
    /// The most recent link handed to the dispatcher for this post.
    pub last_dispatched_link: Option<String>,
}

impl MonitoredEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_content_hash: String::new(),
            last_dispatched_link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddError {
    #[error("at most {max} posts can be monitored")]
    TooMany { max: usize },
    #[error("{0} is already being monitored")]
    Duplicate(String),
    #[error("{0:?} is not a valid post URL")]
    InvalidUrl(String),
}

/// Ordered, bounded set of monitored posts (insertion order is display order).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryCollection {
    entries: Vec<MonitoredEntry>,
}

impl EntryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a collection from previously stored entries.
    ///
    /// Entries that would break the collection invariants (blank, invalid or
    /// duplicate URLs, anything past [`MAX_ENTRIES`]) are dropped and their
    /// URLs returned so the caller can report them.
    pub fn restore(stored: Vec<MonitoredEntry>, rules: &UrlRules) -> (Self, Vec<String>) {
        let mut collection = Self::new();
        let mut dropped = Vec::new();
        for mut entry in stored {
            entry.url = entry.url.trim().to_string();
            let acceptable = collection.entries.len() < MAX_ENTRIES
                && rules.is_valid_post_url(&entry.url)
                && !collection.contains(&entry.url);
            if acceptable {
                collection.entries.push(entry);
            } else {
                dropped.push(entry.url);
            }
        }
        (collection, dropped)
    }

    pub fn add(&mut self, url: &str, rules: &UrlRules) -> Result<(), AddError> {
        let url = url.trim();
        if self.entries.len() >= MAX_ENTRIES {
            return Err(AddError::TooMany { max: MAX_ENTRIES });
        }
        if self.contains(url) {
            return Err(AddError::Duplicate(url.to_string()));
        }
        if !rules.is_valid_post_url(url) {
            return Err(AddError::InvalidUrl(url.to_string()));
        }
        self.entries.push(MonitoredEntry::new(url));
        Ok(())
    }

    /// Removes every entry whose URL is in `urls`; absent URLs are ignored.
    pub fn remove_many(&mut self, urls: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !urls.contains(&entry.url));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stores a new fingerprint (and dispatched link, when given) for `url`.
    ///
    /// Returns `false` when no entry matches; persisting is left to the caller.
    pub fn record_change(
        &mut self,
        url: &str,
        new_hash: &str,
        dispatched_link: Option<&str>,
    ) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|entry| entry.url == url) else {
            return false;
        };
        entry.last_content_hash = new_hash.to_string();
        if let Some(link) = dispatched_link {
            entry.last_dispatched_link = Some(link.to_string());
        }
        true
    }

    pub fn get(&self, url: &str) -> Option<&MonitoredEntry> {
        self.entries.iter().find(|entry| entry.url == url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    pub fn entries(&self) -> &[MonitoredEntry] {
        &self.entries
    }

    /// Owned copy for readers outside the scheduler.
    pub fn snapshot(&self) -> Vec<MonitoredEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
