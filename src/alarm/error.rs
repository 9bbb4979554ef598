use thiserror::Error;

use super::model::MetricKind;

#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("unknown metric kind '{0}' (expected CPU, Memory or Disk)")]
    InvalidKind(String),
    #[error("threshold {0} is outside the allowed range 1-100")]
    OutOfRange(u32),
    #[error("no alarms are configured")]
    NothingToDelete,
    #[error("no alarm is configured for {0}")]
    NotConfigured(MetricKind),
    #[error("alarm storage {path} is unavailable: {source}")]
    StorageUnavailable { path: String, source: StorageFault },
}

impl AlarmError {
    /// What the user can do to get past this error, when there is something.
    pub fn hint(&self) -> Option<String> {
        match self {
            AlarmError::StorageUnavailable {
                path,
                source: StorageFault::Malformed(_),
            } => Some(format!(
                "fix or remove {} and try again; removing it clears all alarms",
                path
            )),
            _ => None,
        }
    }
}

/// Underlying cause of a [`AlarmError::StorageUnavailable`].
#[derive(Debug, Error)]
pub enum StorageFault {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed content: {0}")]
    Malformed(#[from] serde_json::Error),
}
