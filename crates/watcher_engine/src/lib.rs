//! Watcher engine: fetching, dispatching, persistence and the poll loop.
mod dispatch;
mod document;
mod events;
mod fetch;
mod persist;
mod scheduler;
mod store;
mod types;

pub use dispatch::{LaunchError, Launcher, SystemLauncher};
pub use document::{load_state, render_state, save_state, CorruptState, LoadedState};
pub use events::{ChannelEventSink, EventSink, NullEventSink};
pub use fetch::{parse_post_listing, post_json_url, FetchSettings, PostFetcher, ReqwestFetcher};
pub use persist::{write_atomically, PersistError};
pub use scheduler::{run_cycle, PollContext, Scheduler, SchedulerConfig, StartError};
pub use store::{lock_store, EntryStore, SharedStore};
pub use types::{CycleReport, FailureKind, FetchError, PostContent, WatchEvent};
