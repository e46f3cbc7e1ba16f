use std::fmt;

/// Whether the monitoring loop is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorStatus {
    #[default]
    Stopped,
    Running,
}

impl MonitorStatus {
    pub fn is_running(self) -> bool {
        self == MonitorStatus::Running
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Stopped => f.write_str("stopped"),
            MonitorStatus::Running => f.write_str("running"),
        }
    }
}
