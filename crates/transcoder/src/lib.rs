pub mod decision;
pub mod policy;

use decision::ClientCaps;

pub use policy::{CapsTranscodePolicy, TranscodePolicy};

/// Transcode preferences for local and remote servers.
#[derive(Debug, Clone)]
pub struct TranscodeSettings {
    /// Capabilities assumed when streaming from a server on the local network.
    pub local_caps: ClientCaps,
    /// Capabilities assumed for servers outside the local network; usually
    /// bitrate-capped.
    pub remote_caps: ClientCaps,
    /// Let the server remux when only the container is unsupported.
    pub remux_via_server: bool,
    /// Transcode everything regardless of capabilities.
    pub force: bool,
    /// Streaming protocol requested from the transcoder.
    pub protocol: String,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            local_caps: ClientCaps::default(),
            remote_caps: ClientCaps {
                max_bitrate_kbps: Some(8000),
                max_width: Some(1920),
                max_height: Some(1080),
                ..ClientCaps::default()
            },
            remux_via_server: false,
            force: false,
            protocol: "hls".to_string(),
        }
    }
}
