use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::MediaKind;
use crate::url::SERVER_SCHEME;

/// One piece of content: playable media, a directory or a grouping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentItem {
    /// Stable path / identifier, e.g. `plexserver://<uuid>/library/metadata/12`.
    pub path: String,
    #[serde(alias = "title")]
    pub label: String,
    pub kind: MediaKind,
    /// The server-relative key the item was listed under. Used as the
    /// sequencing key for play queues.
    pub unprocessed_key: Option<String>,
    /// UUID of the owning server.
    pub server: Option<String>,
    /// Already resolved, player-ready leaf. Must never be re-resolved.
    #[serde(rename = "isSynthesized")]
    pub synthesized: bool,
    pub selected_media_item: Option<usize>,
    pub http_headers: Option<String>,
    pub http_cookies: Option<String>,
    pub user_agent: Option<String>,
    /// Set once the path has been replaced by a transcode request.
    pub transcoded: bool,
    pub library_section_uuid: Option<String>,
    /// Plugin identifier of the container the item was listed from.
    pub identifier: Option<String>,
    pub is_folder: bool,
    /// Arbitrary metadata: watched state, ratings, artwork and so on.
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "Media")]
    pub media: Vec<MediaAlternative>,
    #[serde(skip)]
    pub selected_part: Option<MediaPart>,
}

impl ContentItem {
    pub fn new(path: impl Into<String>, label: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
            kind,
            ..Self::default()
        }
    }

    /// Whether the item lives in a media server library (as opposed to a local
    /// file or a plain URL).
    pub fn is_server_backed(&self) -> bool {
        self.path.starts_with(SERVER_SCHEME)
    }

    /// The alternative at `selected_media_item` (0 when unset).
    pub fn selected_alternative(&self) -> Option<&MediaAlternative> {
        self.media.get(self.selected_media_item.unwrap_or(0))
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.properties.insert(key.to_string(), value.into());
    }
}

/// One playable representation (quality, bitrate, edition) of a content item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaAlternative {
    pub id: Option<String>,
    /// The real parts must be obtained with a follow-up request.
    pub indirect: bool,
    pub container: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub bitrate_kbps: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Transport headers handed out by the container that listed this alternative.
    pub http_headers: Option<String>,
    #[serde(rename = "Part")]
    pub parts: Vec<MediaPart>,
}

/// One physical stream or file of an alternative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaPart {
    /// Remote path the server streams this part from.
    pub path: String,
    pub unprocessed_key: Option<String>,
    /// Path of the underlying file as seen by the server.
    pub file: Option<String>,
    /// Data to submit before following an indirect part.
    #[serde(rename = "postURL")]
    pub post_url: Option<String>,
    pub duration_ms: Option<u64>,
    /// Served by a server that is not on the local network.
    pub remote: bool,
}

impl MediaPart {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Immutable, ordered snapshot of items for one (section, content kind) pair.
///
/// Cloning is cheap; a refresh replaces the whole snapshot instead of
/// editing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentList {
    items: Arc<[ContentItem]>,
    /// Transport headers the server attached to the whole listing.
    pub http_headers: Option<String>,
    pub play_queue_id: Option<u64>,
    pub play_queue_selected_offset: Option<usize>,
    pub identifier: Option<String>,
    pub library_section_uuid: Option<String>,
}

impl ContentList {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self {
            items: items.into(),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn first(&self) -> Option<&ContentItem> {
        self.items.first()
    }

    pub fn get(&self, index: usize) -> Option<&ContentItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentItem> {
        self.items.iter()
    }
}

impl From<Vec<ContentItem>> for ContentList {
    fn from(items: Vec<ContentItem>) -> Self {
        Self::new(items)
    }
}

impl<'a> IntoIterator for &'a ContentList {
    type Item = &'a ContentItem;
    type IntoIter = std::slice::Iter<'a, ContentItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
