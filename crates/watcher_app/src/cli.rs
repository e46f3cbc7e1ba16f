use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use watcher_core::{LinkKind, DEFAULT_POST_PREFIX};

/// Watches forum posts and opens the first magnet or .torrent link whenever
/// a post's text changes.
#[derive(Debug, Parser)]
#[command(name = "post-watcher", version)]
pub struct Cli {
    /// Start without an interactive window (used by autostart entries).
    #[arg(long, global = true)]
    pub minimized: bool,

    /// State document to use instead of the per-user default.
    #[arg(long, global = true, value_name = "PATH")]
    pub state_file: Option<PathBuf>,

    /// Listing prefix every monitored post URL must start with.
    #[arg(long, global = true, value_name = "PREFIX", default_value = DEFAULT_POST_PREFIX)]
    pub post_prefix: String,

    /// Also log to the terminal, at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start monitoring a post.
    Add { url: String },
    /// Stop monitoring one or more posts.
    Remove {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Stop monitoring every post.
    Clear,
    /// Show monitored posts in display order.
    List,
    /// Show or change settings.
    Settings(SettingsArgs),
    /// Poll monitored posts until interrupted (the default command).
    Watch {
        /// Run a single polling pass and exit.
        #[arg(long)]
        once: bool,
    },
}

#[derive(Debug, Args, Default)]
pub struct SettingsArgs {
    /// Preferred link type: magnet or torrent.
    #[arg(long, value_name = "TYPE")]
    pub link_type: Option<LinkKind>,
    /// Minutes between polling passes.
    #[arg(long, value_name = "MINUTES")]
    pub interval_min: Option<u32>,
    #[arg(long, value_name = "BOOL")]
    pub auto_run: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub close_to_tray: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub always_start_minimized: Option<bool>,
}

impl SettingsArgs {
    pub fn is_empty(&self) -> bool {
        self.link_type.is_none()
            && self.interval_min.is_none()
            && self.auto_run.is_none()
            && self.close_to_tray.is_none()
            && self.always_start_minimized.is_none()
    }
}
