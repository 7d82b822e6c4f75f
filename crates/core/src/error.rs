use thiserror::Error;

/// Failure talking to a remote library server.
///
/// Always recoverable: cached state stays as it was and a later request may
/// succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("no server known for {0}")]
    UnknownServer(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("empty response from {0}")]
    Empty(String),
}

impl TransportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
            Self::UnknownServer(_) => "unknown_server",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Empty(_) => "empty",
        }
    }
}

/// Failure reading or writing persisted client settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings backend error: {0}")]
    Backend(String),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl SettingsError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "settings_backend",
            Self::Invalid { .. } => "settings_invalid",
        }
    }
}
