use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;
use watcher_core::{MonitoredEntry, Settings, UrlRules};
use watcher_engine::{
    lock_store, run_cycle, ChannelEventSink, EntryStore, EventSink, FetchSettings, PollContext,
    PostFetcher, ReqwestFetcher, Scheduler, SchedulerConfig, SharedStore, SystemLauncher,
};
use watcher_logging::{watcher_info, LogDestination};

use super::{events, paths};
use crate::cli::{Cli, Command, SettingsArgs};

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let state_path = match cli.state_file.clone() {
        Some(path) => path,
        None => paths::default_state_path()?,
    };

    let log_file = paths::log_path(&state_path);
    if cli.verbose {
        watcher_logging::initialize(LogDestination::Both(log_file), LevelFilter::Debug);
    } else {
        watcher_logging::initialize(LogDestination::File(log_file), LevelFilter::Info);
    }
    // The shell has no window to hide; the flag is only recorded.
    watcher_info!("Starting (minimized: {})", cli.minimized);

    let (sink, rx) = ChannelEventSink::pair();
    let printer = events::spawn_printer(rx);
    let events: Arc<dyn EventSink> = Arc::new(sink);

    let (store, warning) =
        EntryStore::load(&state_path, UrlRules::new(cli.post_prefix.clone()), events.clone());
    if let Some(warning) = warning {
        eprintln!("Settings file is missing or corrupted. Loading defaults.");
        eprintln!("Settings error: {warning}");
    }

    let ctx = PollContext {
        store: Arc::new(Mutex::new(store)),
        fetcher: Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        launcher: Arc::new(SystemLauncher),
        events,
    };

    let outcome = run_command(cli.command.unwrap_or(Command::Watch { once: false }), &ctx);

    // The printer exits once the last event sender is gone.
    drop(ctx);
    let _ = printer.join();
    outcome
}

/// Runs `future` to completion on a throwaway single-threaded runtime.
fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

fn run_command(command: Command, ctx: &PollContext) -> anyhow::Result<()> {
    match command {
        Command::Add { url } => add(ctx, &url),
        Command::Remove { urls } => {
            remove(&ctx.store, urls);
            Ok(())
        }
        Command::Clear => {
            lock_store(&ctx.store).clear();
            println!("Cleared all URLs and reset state.");
            Ok(())
        }
        Command::List => {
            let snapshot = lock_store(&ctx.store).snapshot();
            for line in list_lines(&snapshot) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Settings(args) => settings(&ctx.store, &args),
        Command::Watch { once } => watch(ctx, once),
    }
}

fn add(ctx: &PollContext, url: &str) -> anyhow::Result<()> {
    let url = url.trim();
    lock_store(&ctx.store).add(url)?;

    let title = match block_on(ctx.fetcher.fetch_post(url))? {
        Ok(post) => post
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| "(No Title)".to_string()),
        Err(err) => {
            println!("Could not fetch post title: {err}");
            "(Failed to load title)".to_string()
        }
    };
    println!("Added: {title}");
    Ok(())
}

fn remove(store: &SharedStore, urls: Vec<String>) -> usize {
    let urls: HashSet<String> = urls.into_iter().map(|url| url.trim().to_string()).collect();
    let removed = lock_store(store).remove_many(&urls);
    if removed > 0 {
        println!(
            "Cleared {removed} URL{} from monitoring.",
            if removed > 1 { "s" } else { "" }
        );
    } else {
        println!("None of the given URLs were being monitored.");
    }
    removed
}

fn list_lines(entries: &[MonitoredEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No posts are being monitored.".to_string()];
    }
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let seen = if entry.last_content_hash.is_empty() {
                "not polled yet".to_string()
            } else {
                let short = entry.last_content_hash.get(..12).unwrap_or(&entry.last_content_hash);
                format!("fingerprint {short}")
            };
            match &entry.last_dispatched_link {
                Some(link) => format!("{}. {} ({seen}; last opened {link})", idx + 1, entry.url),
                None => format!("{}. {} ({seen})", idx + 1, entry.url),
            }
        })
        .collect()
}

fn settings(store: &SharedStore, args: &SettingsArgs) -> anyhow::Result<()> {
    let mut store = lock_store(store);
    if !args.is_empty() {
        store.update_settings(|settings| apply_settings(settings, args))?;
    }
    let current = store.settings();
    println!("Link type = {}", current.preferred_link_kind);
    println!("Interval = {} min", current.poll_interval_minutes());
    println!("Auto-run = {}", current.auto_run);
    println!("Close to tray = {}", current.close_to_tray);
    println!("Always start minimized = {}", current.always_start_minimized);
    Ok(())
}

fn apply_settings(
    settings: &mut Settings,
    args: &SettingsArgs,
) -> Result<(), watcher_core::SettingsError> {
    if let Some(kind) = args.link_type {
        settings.preferred_link_kind = kind;
    }
    if let Some(minutes) = args.interval_min {
        settings.set_poll_interval_minutes(minutes)?;
    }
    if let Some(value) = args.auto_run {
        settings.auto_run = value;
    }
    if let Some(value) = args.close_to_tray {
        settings.close_to_tray = value;
    }
    if let Some(value) = args.always_start_minimized {
        settings.always_start_minimized = value;
    }
    Ok(())
}

fn watch(ctx: &PollContext, once: bool) -> anyhow::Result<()> {
    if once {
        if lock_store(&ctx.store).is_empty() {
            bail!(watcher_engine::StartError::NoEntries);
        }
        let report = block_on(run_cycle(ctx, &CancellationToken::new()))?;
        println!(
            "Checked {}, changed {}, opened {}, failed {}.",
            report.checked,
            report.changed,
            report.dispatched,
            report.fetch_failures + report.launch_failures
        );
        return Ok(());
    }

    let scheduler = Scheduler::new(ctx.clone(), SchedulerConfig::default());
    scheduler.start()?;
    println!("Status: {}. Press Ctrl-C to stop.", scheduler.status());

    block_on(tokio::signal::ctrl_c())?.context("waiting for Ctrl-C")?;
    println!("Stopping...");
    scheduler.stop();
    scheduler.wait();
    println!("Status: {}", scheduler.status());
    Ok(())
}
