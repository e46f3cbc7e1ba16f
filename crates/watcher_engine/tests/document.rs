use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use watcher_core::{LinkKind, MonitoredEntry, Settings, MIN_POLL_INTERVAL_MINUTES};
use watcher_engine::{load_state, save_state, LoadedState};

fn entry(url: &str, hash: &str, link: Option<&str>) -> MonitoredEntry {
    MonitoredEntry {
        url: url.to_string(),
        last_content_hash: hash.to_string(),
        last_dispatched_link: link.map(str::to_string),
    }
}

#[test]
fn missing_document_loads_defaults_without_warning() {
    let temp = TempDir::new().unwrap();
    let (state, warning) = load_state(&temp.path().join("settings.json"));

    assert_eq!(state, LoadedState::default());
    assert!(warning.is_none());
}

#[test]
fn corrupt_document_loads_defaults_with_warning() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(&path, "{ this is not json").unwrap();

    let (state, warning) = load_state(&path);

    assert_eq!(state, LoadedState::default());
    let warning = warning.expect("corruption reported");
    assert_eq!(warning.path, path);
}

#[test]
fn saved_state_reloads_in_display_order() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    let mut settings = Settings::default();
    settings.preferred_link_kind = LinkKind::Torrent;
    settings.set_poll_interval_minutes(120).unwrap();
    settings.close_to_tray = true;
    let entries = vec![
        entry("https://www.reddit.com/r/b/comments/2/x/", "h2", Some("magnet:?xt=2")),
        entry("https://www.reddit.com/r/a/comments/1/x/", "", None),
    ];

    save_state(&path, &settings, &entries).unwrap();
    let (state, warning) = load_state(&path);

    assert!(warning.is_none());
    assert_eq!(state, LoadedState { settings, entries });
}

#[test]
fn document_uses_camel_case_keys() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    let entries = vec![entry("https://www.reddit.com/r/a/comments/1/x/", "h1", None)];

    save_state(&path, &Settings::default(), &entries).unwrap();
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(document["preferredLinkType"], "magnet");
    assert_eq!(document["pollIntervalMin"], 60);
    assert_eq!(document["autoRun"], false);
    assert_eq!(document["closeToTray"], false);
    assert_eq!(document["alwaysStartMinimized"], false);
    assert_eq!(
        document["monitoredUrls"],
        serde_json::json!([{ "url": "https://www.reddit.com/r/a/comments/1/x/", "lastContentHash": "h1" }])
    );
}

#[test]
fn poll_interval_floor_is_enforced_on_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(&path, r#"{"preferredLinkType":"torrent","pollIntervalMin":5}"#).unwrap();

    let (state, warning) = load_state(&path);

    assert!(warning.is_none());
    assert_eq!(state.settings.poll_interval_minutes(), MIN_POLL_INTERVAL_MINUTES);
    assert_eq!(state.settings.preferred_link_kind, LinkKind::Torrent);
    assert!(state.entries.is_empty());
}

#[test]
fn legacy_pascal_case_document_is_accepted() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(
        &path,
        r#"{"PreferredLinkType":"torrent","PollIntervalMin":90,"AutoRun":true,"CloseToTray":false,
            "AlwaysStartMinimized":true,
            "MonitoredUrls":[{"Url":"https://www.reddit.com/r/a/comments/1/x/","LastContentHash":"abc"}]}"#,
    )
    .unwrap();

    let (state, warning) = load_state(&path);

    assert!(warning.is_none());
    assert_eq!(state.settings.preferred_link_kind, LinkKind::Torrent);
    assert_eq!(state.settings.poll_interval_minutes(), 90);
    assert!(state.settings.auto_run);
    assert!(state.settings.always_start_minimized);
    assert_eq!(
        state.entries,
        vec![entry("https://www.reddit.com/r/a/comments/1/x/", "abc", None)]
    );
}

#[test]
fn unknown_link_type_falls_back_to_magnet() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(&path, r#"{"preferredLinkType":"ed2k"}"#).unwrap();

    let (state, warning) = load_state(&path);

    assert!(warning.is_none());
    assert_eq!(state.settings.preferred_link_kind, LinkKind::Magnet);
}

#[test]
fn null_fields_fall_back_one_by_one() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(
        &path,
        r#"{"preferredLinkType":null,"pollIntervalMin":null,"autoRun":true,"closeToTray":null,
            "monitoredUrls":[{"url":"https://www.reddit.com/r/a/comments/1/x/","lastContentHash":null,
                              "lastDispatchedLink":null}]}"#,
    )
    .unwrap();

    let (state, warning) = load_state(&path);

    assert!(warning.is_none());
    assert_eq!(state.settings.preferred_link_kind, LinkKind::Magnet);
    assert_eq!(state.settings.poll_interval_minutes(), MIN_POLL_INTERVAL_MINUTES);
    assert!(state.settings.auto_run);
    assert!(!state.settings.close_to_tray);
    assert_eq!(
        state.entries,
        vec![entry("https://www.reddit.com/r/a/comments/1/x/", "", None)]
    );
}

#[test]
fn null_entry_list_keeps_the_settings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(
        &path,
        r#"{"preferredLinkType":"torrent","pollIntervalMin":120,"monitoredUrls":null}"#,
    )
    .unwrap();

    let (state, warning) = load_state(&path);

    assert!(warning.is_none());
    assert!(state.entries.is_empty());
    assert_eq!(state.settings.preferred_link_kind, LinkKind::Torrent);
    assert_eq!(state.settings.poll_interval_minutes(), 120);
}

#[test]
fn entry_without_url_is_skipped_and_the_rest_kept() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.json");
    fs::write(
        &path,
        r#"{"monitoredUrls":[{"url":null,"lastContentHash":"h0"},
                             {"url":"https://www.reddit.com/r/a/comments/1/x/","lastContentHash":"h1"}]}"#,
    )
    .unwrap();

    let (state, warning) = load_state(&path);

    assert!(warning.is_none());
    assert_eq!(
        state.entries,
        vec![entry("https://www.reddit.com/r/a/comments/1/x/", "h1", None)]
    );
}
