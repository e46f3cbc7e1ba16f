use std::time::Duration;

use crate::LinkKind;

/// Polling more often than this risks being rate-limited upstream.
pub const MIN_POLL_INTERVAL_MINUTES: u32 = 60;
pub const DEFAULT_POLL_INTERVAL_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("poll interval of {requested} min is below the {minimum} min floor")]
    IntervalTooShort { requested: u32, minimum: u32 },
}

/// User preferences stored alongside the monitored entries.
///
/// The monitoring loop only reads `preferred_link_kind` and the poll
/// interval; the remaining flags belong to the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub preferred_link_kind: LinkKind,
    poll_interval_minutes: u32,
    pub auto_run: bool,
    pub close_to_tray: bool,
    pub always_start_minimized: bool,
}

impl Settings {
    /// Builds settings from stored values, raising the interval to the floor.
    pub fn from_stored(preferred_link_kind: LinkKind, poll_interval_minutes: u32) -> Self {
        Self {
            preferred_link_kind,
            poll_interval_minutes: poll_interval_minutes.max(MIN_POLL_INTERVAL_MINUTES),
            ..Self::default()
        }
    }

    pub fn poll_interval_minutes(&self) -> u32 {
        self.poll_interval_minutes
    }

    pub fn set_poll_interval_minutes(&mut self, minutes: u32) -> Result<(), SettingsError> {
        if minutes < MIN_POLL_INTERVAL_MINUTES {
            return Err(SettingsError::IntervalTooShort {
                requested: minutes,
                minimum: MIN_POLL_INTERVAL_MINUTES,
            });
        }
        self.poll_interval_minutes = minutes;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_interval_minutes) * 60)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preferred_link_kind: LinkKind::Magnet,
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
            auto_run: false,
            close_to_tray: false,
            always_start_minimized: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_interval_is_raised_to_floor() {
        let settings = Settings::from_stored(LinkKind::Torrent, 5);
        assert_eq!(settings.poll_interval_minutes(), MIN_POLL_INTERVAL_MINUTES);
        assert_eq!(settings.preferred_link_kind, LinkKind::Torrent);
    }

    #[test]
    fn setter_rejects_interval_below_floor() {
        let mut settings = Settings::default();
        let err = settings.set_poll_interval_minutes(10).unwrap_err();
        assert_eq!(
            err,
            SettingsError::IntervalTooShort {
                requested: 10,
                minimum: MIN_POLL_INTERVAL_MINUTES
            }
        );
        assert_eq!(settings.poll_interval_minutes(), DEFAULT_POLL_INTERVAL_MINUTES);
    }

    #[test]
    fn poll_interval_is_expressed_in_seconds() {
        let mut settings = Settings::default();
        settings.set_poll_interval_minutes(90).unwrap();
        assert_eq!(settings.poll_interval(), Duration::from_secs(90 * 60));
    }
}
