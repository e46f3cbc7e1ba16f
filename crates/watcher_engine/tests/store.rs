use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use watcher_core::{AddError, LinkKind, UrlRules, MAX_ENTRIES};
use watcher_engine::{ChannelEventSink, EntryStore, NullEventSink, WatchEvent};

fn rules() -> UrlRules {
    UrlRules::new("https://forum.example/r/")
}

fn post(id: usize) -> String {
    format!("https://forum.example/r/x/comments/{id}/title/")
}

fn open_store(temp: &TempDir) -> EntryStore {
    let (store, warning) = EntryStore::load(
        temp.path().join("settings.json"),
        rules(),
        Arc::new(NullEventSink),
    );
    assert!(warning.is_none());
    store
}

#[test]
fn add_persists_immediately() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);

    store.add(&post(1)).unwrap();

    let reopened = open_store(&temp);
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.snapshot()[0].url, post(1));
    assert_eq!(reopened.snapshot()[0].last_content_hash, "");
}

#[test]
fn add_errors_leave_store_untouched() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    for id in 0..MAX_ENTRIES {
        store.add(&post(id)).unwrap();
    }

    assert_eq!(
        store.add(&post(99)).unwrap_err(),
        AddError::TooMany { max: MAX_ENTRIES }
    );
    store.remove_many(&HashSet::from([post(0)]));
    assert_eq!(store.add(&post(1)).unwrap_err(), AddError::Duplicate(post(1)));
    assert_eq!(
        store.add("https://elsewhere.example/x").unwrap_err(),
        AddError::InvalidUrl("https://elsewhere.example/x".to_string())
    );
    assert_eq!(open_store(&temp).len(), MAX_ENTRIES - 1);
}

#[test]
fn remove_many_and_clear_persist() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    store.add(&post(1)).unwrap();
    store.add(&post(2)).unwrap();

    let removed = store.remove_many(&HashSet::from([post(2), post(7)]));
    assert_eq!(removed, 1);
    assert_eq!(open_store(&temp).len(), 1);

    store.clear();
    assert!(open_store(&temp).is_empty());
}

#[test]
fn record_change_waits_for_explicit_save() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    store.add(&post(1)).unwrap();

    assert!(store.record_change(&post(1), "h1", Some("magnet:?xt=1")));
    assert_eq!(open_store(&temp).snapshot()[0].last_content_hash, "");

    store.save().unwrap();
    let reopened = open_store(&temp);
    let entry = reopened.get(&post(1)).unwrap();
    assert_eq!(entry.last_content_hash, "h1");
    assert_eq!(entry.last_dispatched_link.as_deref(), Some("magnet:?xt=1"));
}

#[test]
fn settings_updates_persist_and_respect_floor() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);

    store
        .update_settings(|settings| {
            settings.preferred_link_kind = LinkKind::Torrent;
            settings.set_poll_interval_minutes(180)
        })
        .unwrap();
    assert!(store
        .update_settings(|settings| settings.set_poll_interval_minutes(1))
        .is_err());

    let reopened = open_store(&temp);
    assert_eq!(reopened.settings().preferred_link_kind, LinkKind::Torrent);
    assert_eq!(reopened.settings().poll_interval_minutes(), 180);
}

#[test]
fn corrupt_document_yields_empty_store_and_warning() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(&path, "[1, 2,").unwrap();

    let (store, warning) = EntryStore::load(&path, rules(), Arc::new(NullEventSink));

    assert!(store.is_empty());
    assert!(warning.is_some());
}

#[test]
fn write_failure_warns_only_once() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();
    let (sink, rx) = ChannelEventSink::pair();
    let (mut store, _) = EntryStore::load(blocker.join("settings.json"), rules(), Arc::new(sink));

    // Adds still succeed in memory even though the document cannot be written.
    store.add(&post(1)).unwrap();
    store.add(&post(2)).unwrap();
    assert!(store.save().is_err());
    assert_eq!(store.len(), 2);

    let warnings = rx
        .try_iter()
        .filter(|event| matches!(event, WatchEvent::PersistenceWarning { .. }))
        .count();
    assert_eq!(warnings, 1);
}

#[test]
fn save_keeps_entries_added_by_another_store() {
    let temp = TempDir::new().unwrap();
    let mut watcher = open_store(&temp);
    watcher.add(&post(1)).unwrap();
    let mut shell = open_store(&temp);
    shell.add(&post(2)).unwrap();

    assert!(watcher.record_change(&post(1), "h1", Some("magnet:?xt=1")));
    watcher.save().unwrap();

    let reopened = open_store(&temp);
    let urls: Vec<_> = reopened.snapshot().into_iter().map(|entry| entry.url).collect();
    assert_eq!(urls, vec![post(1), post(2)]);
    let first = reopened.get(&post(1)).unwrap();
    assert_eq!(first.last_content_hash, "h1");
    assert_eq!(first.last_dispatched_link.as_deref(), Some("magnet:?xt=1"));
    assert_eq!(watcher.len(), 2);
}

#[test]
fn save_does_not_bring_back_entries_removed_elsewhere() {
    let temp = TempDir::new().unwrap();
    let mut watcher = open_store(&temp);
    watcher.add(&post(1)).unwrap();
    watcher.add(&post(2)).unwrap();
    let mut shell = open_store(&temp);
    shell.remove_many(&HashSet::from([post(2)]));

    assert!(watcher.record_change(&post(2), "h2", None));
    watcher.save().unwrap();

    let reopened = open_store(&temp);
    assert_eq!(reopened.len(), 1);
    assert!(reopened.get(&post(2)).is_none());
}

#[test]
fn reload_picks_up_settings_changed_elsewhere() {
    let temp = TempDir::new().unwrap();
    let mut watcher = open_store(&temp);
    watcher.add(&post(1)).unwrap();
    let mut shell = open_store(&temp);
    shell
        .update_settings(|settings| {
            settings.preferred_link_kind = LinkKind::Torrent;
            settings.set_poll_interval_minutes(240)
        })
        .unwrap();

    watcher.reload();

    assert_eq!(watcher.settings().preferred_link_kind, LinkKind::Torrent);
    assert_eq!(watcher.settings().poll_interval_minutes(), 240);
}

#[test]
fn corrupt_document_on_reload_keeps_memory() {
    let temp = TempDir::new().unwrap();
    let mut store = open_store(&temp);
    store.add(&post(1)).unwrap();
    fs::write(temp.path().join("settings.json"), "{ broken").unwrap();

    store.reload();

    assert_eq!(store.len(), 1);
}
