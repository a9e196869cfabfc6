use thiserror::Error;

/// Failure talking to a remote service or the local fallback store
///
/// These are reported as values; none of them is fatal to an editing session.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no bearer credential available")]
    MissingCredential,

    #[error("remote endpoint not configured")]
    NotConfigured,

    #[error("remote responded with HTTP {status}")]
    Status { status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("save worker is no longer running")]
    WorkerGone,
}

impl StoreError {
    /// Transient failures are recovered from the fallback store
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential | Self::NotConfigured | Self::Status { .. } | Self::Network(_)
        )
    }
}

/// Why an edit request was refused
///
/// Refused requests never change engine state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("dashboard is not in edit mode")]
    NotEditing,

    #[error("unknown widget '{0}'")]
    UnknownWidget(String),

    #[error("widget '{0}' may not be dragged")]
    NotDraggable(String),

    #[error("widget '{0}' may not be resized")]
    NotResizable(String),

    #[error("widget '{0}' may not be deleted")]
    NotDeletable(String),

    #[error("pointer is not on a drag or resize handle")]
    NotAHandle,

    #[error("another interaction is already in progress")]
    Busy,
}
