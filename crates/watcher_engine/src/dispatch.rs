#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to open {link}: {message}")]
pub struct LaunchError {
    pub link: String,
    pub message: String,
}

/// Hands a link to whatever the OS has registered for its scheme.
pub trait Launcher: Send + Sync {
    fn launch(&self, link: &str) -> Result<(), LaunchError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, link: &str) -> Result<(), LaunchError> {
        open::that_detached(link).map_err(|err| LaunchError {
            link: link.to_string(),
            message: err.to_string(),
        })
    }
}
