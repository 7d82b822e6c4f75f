use rustplex_core::TransportError;
use thiserror::Error;

/// Terminal outcome of a failed or abandoned resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("item has no media to play")]
    NoMediaAlternative,

    #[error("media has no parts")]
    NoMediaParts,

    #[error("indirect media with {0} parts cannot be followed")]
    AmbiguousIndirect(usize),

    #[error("gave up after {0} indirect hops")]
    IndirectDepthExceeded(usize),

    #[error("indirect lookup returned no media")]
    EmptyIndirect,

    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(e) => e.code(),
            Self::NoMediaAlternative => "no_media",
            Self::NoMediaParts => "no_parts",
            Self::AmbiguousIndirect(_) => "ambiguous_indirect",
            Self::IndirectDepthExceeded(_) => "indirect_depth",
            Self::EmptyIndirect => "empty_indirect",
            Self::Cancelled => "cancelled",
        }
    }

    /// User-initiated; callers should not show an error for it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
