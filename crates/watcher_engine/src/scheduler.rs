use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use watcher_core::{extract_link, fingerprint, has_changed, MonitorStatus};
use watcher_logging::{watcher_debug, watcher_info, watcher_warn};

use crate::dispatch::Launcher;
use crate::events::EventSink;
use crate::fetch::PostFetcher;
use crate::store::{lock_store, SharedStore};
use crate::{CycleReport, WatchEvent};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Granularity of the sleep between cycles; bounds how long `stop` takes
    /// to be noticed while idle.
    pub checkpoint: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            checkpoint: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("add at least one post before starting")]
    NoEntries,
    #[error("monitoring is already running")]
    AlreadyRunning,
    #[error("could not start the polling thread: {0}")]
    Runtime(#[from] std::io::Error),
}

/// The collaborators one poll cycle needs.
#[derive(Clone)]
pub struct PollContext {
    pub store: SharedStore,
    pub fetcher: Arc<dyn PostFetcher>,
    pub launcher: Arc<dyn Launcher>,
    pub events: Arc<dyn EventSink>,
}

/// Polls every entry once, in collection order.
///
/// The store is reloaded first, so entries and settings changed by another
/// process since the last cycle take effect.
///
/// Per entry: fetch, fingerprint, and on change record the new fingerprint
/// before extracting and dispatching a link. A link equal to the entry's last
/// dispatched link is not dispatched again. The document is written once at
/// the end if anything changed. `cancel` is checked before each entry.
pub async fn run_cycle(ctx: &PollContext, cancel: &CancellationToken) -> CycleReport {
    let (entries, preferred) = {
        let mut store = lock_store(&ctx.store);
        store.reload();
        (store.snapshot(), store.settings().preferred_link_kind)
    };
    ctx.events.emit(WatchEvent::CycleStarted {
        entries: entries.len(),
    });

    let mut report = CycleReport::default();
    let mut dirty = false;

    for entry in entries {
        if cancel.is_cancelled() {
            watcher_debug!("Cycle interrupted before {}", entry.url);
            break;
        }
        report.checked += 1;

        let post = match ctx.fetcher.fetch_post(&entry.url).await {
            Ok(post) => post,
            Err(error) => {
                watcher_warn!("Error polling {}: {}", entry.url, error);
                report.fetch_failures += 1;
                ctx.events.emit(WatchEvent::FetchFailed {
                    url: entry.url.clone(),
                    error,
                });
                continue;
            }
        };

        let new_hash = fingerprint(&post.selftext);
        if !has_changed(&entry, &new_hash) {
            watcher_debug!("[{}] No content change", entry.url);
            continue;
        }

        // Commit the fingerprint first so a failed launch is not retried forever.
        if !lock_store(&ctx.store).record_change(&entry.url, &new_hash, None) {
            watcher_debug!("[{}] Removed while polling; skipping", entry.url);
            continue;
        }
        dirty = true;
        report.changed += 1;
        watcher_info!("[{}] Post updated, scanning for links", entry.url);
        ctx.events.emit(WatchEvent::PostUpdated {
            url: entry.url.clone(),
        });

        let Some(link) = extract_link(&post.selftext, preferred) else {
            watcher_info!("[{}] No matching link found in post", entry.url);
            ctx.events.emit(WatchEvent::NoLinkFound {
                url: entry.url.clone(),
            });
            continue;
        };
        ctx.events.emit(WatchEvent::LinkFound {
            url: entry.url.clone(),
            link: link.url.clone(),
            kind: link.kind,
        });

        if entry.last_dispatched_link.as_deref() == Some(link.url.as_str()) {
            watcher_info!("[{}] Link already handled: {}", entry.url, link.url);
            report.suppressed += 1;
            ctx.events.emit(WatchEvent::DispatchSuppressed {
                url: entry.url.clone(),
                link: link.url,
            });
            continue;
        }

        match ctx.launcher.launch(&link.url) {
            Ok(()) => {
                lock_store(&ctx.store).record_change(&entry.url, &new_hash, Some(&link.url));
                report.dispatched += 1;
                watcher_info!("[{}] Launched {}", entry.url, link.url);
                ctx.events.emit(WatchEvent::Dispatched {
                    url: entry.url.clone(),
                    link: link.url,
                });
            }
            Err(err) => {
                watcher_warn!("[{}] {}", entry.url, err);
                report.launch_failures += 1;
                ctx.events.emit(WatchEvent::LaunchFailed {
                    url: entry.url.clone(),
                    link: link.url,
                    message: err.message,
                });
            }
        }
    }

    if dirty && lock_store(&ctx.store).save().is_ok() {
        watcher_info!("State saved after content change");
        ctx.events.emit(WatchEvent::StateSaved);
    }

    report
}

/// Sleeps for `total` in `checkpoint`-sized steps. Returns `false` if
/// cancellation was observed.
async fn sleep_with_checkpoints(
    total: Duration,
    checkpoint: Duration,
    cancel: &CancellationToken,
) -> bool {
    let checkpoint = checkpoint.max(Duration::from_millis(1));
    let mut remaining = total;
    while !remaining.is_zero() {
        if cancel.is_cancelled() {
            return false;
        }
        let step = remaining.min(checkpoint);
        tokio::time::sleep(step).await;
        remaining -= step;
    }
    !cancel.is_cancelled()
}

async fn poll_loop(ctx: PollContext, config: SchedulerConfig, cancel: CancellationToken) {
    while !cancel.is_cancelled() {
        let report = run_cycle(&ctx, &cancel).await;
        watcher_debug!("Cycle finished: {:?}", report);
        ctx.events.emit(WatchEvent::CycleFinished(report));

        let interval = lock_store(&ctx.store).settings().poll_interval();
        if !sleep_with_checkpoints(interval, config.checkpoint, &cancel).await {
            break;
        }
    }
}

struct Worker {
    cancel: CancellationToken,
    handle: thread::JoinHandle<()>,
}

/// Runs [`run_cycle`] repeatedly on a dedicated thread until stopped.
pub struct Scheduler {
    ctx: PollContext,
    config: SchedulerConfig,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<Worker>>,
}

impl Scheduler {
    pub fn new(ctx: PollContext, config: SchedulerConfig) -> Self {
        Self {
            ctx,
            config,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    pub fn start(&self) -> Result<(), StartError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.running.load(Ordering::SeqCst) {
            return Err(StartError::AlreadyRunning);
        }
        if let Some(finished) = worker.take() {
            let _ = finished.handle.join();
        }
        if lock_store(&self.ctx.store).is_empty() {
            return Err(StartError::NoEntries);
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let cancel = CancellationToken::new();
        let ctx = self.ctx.clone();
        let config = self.config.clone();
        let running = self.running.clone();
        let loop_cancel = cancel.clone();

        self.running.store(true, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name("post-watcher-poll".to_string())
            .spawn(move || {
                let events = ctx.events.clone();
                runtime.block_on(poll_loop(ctx, config, loop_cancel));
                running.store(false, Ordering::SeqCst);
                watcher_info!("Monitoring stopped");
                events.emit(WatchEvent::Stopped);
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(StartError::Runtime(err));
            }
        };

        watcher_info!("Monitoring started");
        *worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Requests a stop; the loop exits at its next checkpoint.
    pub fn stop(&self) {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(worker) = worker.as_ref() {
            worker.cancel.cancel();
        }
    }

    /// Blocks until the polling thread has exited.
    pub fn wait(&self) {
        let finished = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = finished {
            let _ = worker.handle.join();
        }
    }

    pub fn status(&self) -> MonitorStatus {
        if self.running.load(Ordering::SeqCst) {
            MonitorStatus::Running
        } else {
            MonitorStatus::Stopped
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
        self.wait();
    }
}
