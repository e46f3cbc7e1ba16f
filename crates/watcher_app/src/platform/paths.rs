use std::path::{Path, PathBuf};

use anyhow::Context;

const APP_DIR: &str = "post_watcher";
const STATE_FILENAME: &str = "settings.json";
const LOG_FILENAME: &str = "watcher.log";

/// `<config dir>/post_watcher/settings.json` for the current user.
pub(crate) fn default_state_path() -> anyhow::Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(STATE_FILENAME))
        .context("no configuration directory is available for this user")
}

/// The log file lives next to the state document.
pub(crate) fn log_path(state_path: &Path) -> PathBuf {
    state_path.with_file_name(LOG_FILENAME)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::log_path;

    #[test]
    fn log_file_sits_beside_state_document() {
        assert_eq!(
            log_path(Path::new("/tmp/pw/settings.json")),
            Path::new("/tmp/pw/watcher.log")
        );
    }
}
