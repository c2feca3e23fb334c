use std::path::PathBuf;

use thiserror::Error;

use crate::bootstrap::steps::Step;
use crate::system::executor::CommandError;

/// Why a single step failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("failed to {action} {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("root privileges required to write {0:?}; re-run with sudo")]
    PrivilegeRequired(PathBuf),

    #[error("systemd not detected on this host (/run/systemd/system is missing)")]
    SystemdUnavailable,

    #[error("installer finished but the daemon binary {0:?} does not exist")]
    DaemonMissing(PathBuf),
}

impl StepError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// The first failing step of a run, with its diagnostic.
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct BootstrapError {
    pub step: Step,
    #[source]
    pub source: StepError,
}
