use tracing::debug;

use rustplex_core::{ContentItem, MediaServer, url};

use crate::TranscodeSettings;
use crate::decision::{self, PlayMethod};

const TRANSCODE_PATH: &str = "/video/:/transcode/universal/start.m3u8";

/// Decides whether a resolved item must go through the server's transcoder.
pub trait TranscodePolicy: Send + Sync {
    fn should_transcode(&self, server: &MediaServer, item: &ContentItem) -> bool;

    /// HTTP address of a transcode session for `item` on `server`.
    fn transcode_url(&self, server: &MediaServer, item: &ContentItem) -> String;
}

/// Transcode policy driven by static client capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapsTranscodePolicy {
    settings: TranscodeSettings,
}

impl CapsTranscodePolicy {
    pub fn new(settings: TranscodeSettings) -> Self {
        Self { settings }
    }

    fn caps_for(&self, server: &MediaServer) -> &decision::ClientCaps {
        if server.local {
            &self.settings.local_caps
        } else {
            &self.settings.remote_caps
        }
    }
}

impl TranscodePolicy for CapsTranscodePolicy {
    fn should_transcode(&self, server: &MediaServer, item: &ContentItem) -> bool {
        if self.settings.force {
            return true;
        }
        let Some(media) = item.selected_alternative() else {
            return false;
        };
        let d = decision::decide(media, self.caps_for(server));
        debug!(
            server = %server.uuid,
            method = ?d.method,
            reasons = ?d.reasons,
            "transcode decision"
        );
        match d.method {
            PlayMethod::DirectPlay => false,
            PlayMethod::Remux => self.settings.remux_via_server,
            PlayMethod::Transcode => true,
        }
    }

    fn transcode_url(&self, server: &MediaServer, item: &ContentItem) -> String {
        let key = match item.unprocessed_key.clone() {
            Some(key) => key,
            None => url::path_and_query(&item.path).unwrap_or_else(|_| item.path.clone()),
        };
        let caps = self.caps_for(server);

        let mut query = ::url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("path", &server.http_url(&key))
            .append_pair("mediaIndex", &item.selected_media_item.unwrap_or(0).to_string())
            .append_pair("partIndex", "0")
            .append_pair("protocol", &self.settings.protocol)
            .append_pair("fastSeek", "1")
            .append_pair("directStream", "1")
            .append_pair("session", &uuid::Uuid::new_v4().to_string());
        if let Some(br) = caps.max_bitrate_kbps {
            query.append_pair("maxVideoBitrate", &br.to_string());
        }
        if let (Some(w), Some(h)) = (caps.max_width, caps.max_height) {
            query.append_pair("videoResolution", &format!("{w}x{h}"));
        }
        if let Some(ref token) = server.token {
            query.append_pair("X-Plex-Token", token);
        }

        format!("{}?{}", server.http_url(TRANSCODE_PATH), query.finish())
    }
}
