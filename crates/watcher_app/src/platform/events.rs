use std::sync::mpsc;
use std::thread;

use chrono::Local;
use watcher_engine::WatchEvent;

/// Prints scheduler events to stdout until every sender is dropped.
pub(crate) fn spawn_printer(rx: mpsc::Receiver<WatchEvent>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in rx {
            if let Some(line) = describe(&event) {
                println!("[{}] {}", Local::now().format("%H:%M:%S"), line);
            }
        }
    })
}

pub(crate) fn describe(event: &WatchEvent) -> Option<String> {
    let line = match event {
        WatchEvent::CycleStarted { entries } => format!("Checking {entries} post(s)..."),
        WatchEvent::PostUpdated { url } => format!("[{url}] Post updated, scanning for links..."),
        WatchEvent::LinkFound { url, link, kind } => {
            format!("[{url}] New {kind} link found: {link}")
        }
        WatchEvent::NoLinkFound { url } => format!("[{url}] No matching link found in post."),
        WatchEvent::Dispatched { link, .. } => format!("Launched link via system: {link}"),
        WatchEvent::DispatchSuppressed { url, .. } => {
            format!("[{url}] Link already opened earlier; skipping.")
        }
        WatchEvent::FetchFailed { url, error } => format!("Failed to fetch {url}: {error}"),
        WatchEvent::LaunchFailed { message, .. } => format!("Failed to launch link: {message}"),
        WatchEvent::PersistenceWarning { message } => {
            format!("WARNING: {message}. See log for details.")
        }
        WatchEvent::Stopped => "Monitoring stopped.".to_string(),
        WatchEvent::StateSaved | WatchEvent::CycleFinished(_) => return None,
    };
    Some(line)
}
