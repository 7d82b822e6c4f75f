use rustplex_core::{SettingsError, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("no server owns {0}")]
    NoServer(String),

    #[error("{0} cannot be queued: no library section")]
    NotQueueable(String),

    #[error("saved play queue reference is invalid: {0}")]
    InvalidSaved(String),
}

impl QueueError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(e) => e.code(),
            Self::Settings(e) => e.code(),
            Self::NoServer(_) => "no_server",
            Self::NotQueueable(_) => "not_queueable",
            Self::InvalidSaved(_) => "invalid_saved_queue",
        }
    }
}
