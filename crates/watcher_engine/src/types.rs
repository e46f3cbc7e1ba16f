use std::fmt;

use watcher_core::LinkKind;

/// Body and title of one post, as returned by the forum's JSON listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    pub selftext: String,
    pub title: Option<String>,
}

/// Counts gathered over one sweep of the monitored entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub checked: usize,
    pub changed: usize,
    pub dispatched: usize,
    pub suppressed: usize,
    pub fetch_failures: usize,
    pub launch_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    CycleStarted { entries: usize },
    PostUpdated { url: String },
    LinkFound { url: String, link: String, kind: LinkKind },
    NoLinkFound { url: String },
    Dispatched { url: String, link: String },
    DispatchSuppressed { url: String, link: String },
    FetchFailed { url: String, error: FetchError },
    LaunchFailed { url: String, link: String, message: String },
    StateSaved,
    /// Emitted at most once per store (the shell opens one per process) when
    /// the state document cannot be written.
    PersistenceWarning { message: String },
    CycleFinished(CycleReport),
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// The response was not the expected post listing shape.
    Parse,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Parse => write!(f, "unexpected response shape"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
