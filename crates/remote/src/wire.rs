//! JSON listing format served by library servers.
//!
//! Responses are wrapped in a `MediaContainer` envelope holding `Metadata`
//! (leaf items) and `Directory` (navigation) entries. Keys are server-relative
//! and get rewritten into client references on conversion.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use rustplex_core::{
    ContentItem, ContentList, MediaAlternative, MediaKind, MediaPart, MediaServer, url,
};

#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "MediaContainer")]
    pub media_container: MediaContainer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaContainer {
    pub identifier: Option<String>,
    #[serde(rename = "librarySectionUUID")]
    pub library_section_uuid: Option<String>,
    pub http_headers: Option<String>,
    #[serde(rename = "playQueueID")]
    pub play_queue_id: Option<u64>,
    pub play_queue_selected_item_offset: Option<usize>,
    #[serde(rename = "Metadata")]
    pub metadata: Vec<WireItem>,
    #[serde(rename = "Directory")]
    pub directories: Vec<WireItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireItem {
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    #[serde(rename = "librarySectionUUID")]
    pub library_section_uuid: Option<String>,
    pub http_cookies: Option<String>,
    pub user_agent: Option<String>,
    #[serde(rename = "Media")]
    pub media: Vec<WireMedia>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireMedia {
    pub id: Option<Value>,
    pub indirect: Option<Value>,
    pub container: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub bitrate: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(rename = "Part")]
    pub parts: Vec<WirePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WirePart {
    pub key: String,
    pub file: Option<String>,
    pub duration: Option<u64>,
    #[serde(rename = "postURL")]
    pub post_url: Option<String>,
}

/// Servers send flags as booleans, numbers or strings.
fn truthy(value: &Option<Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn media_kind(item_type: Option<&str>) -> MediaKind {
    match item_type {
        Some("movie" | "episode" | "clip" | "video") => MediaKind::Video,
        Some("track") => MediaKind::Audio,
        Some("photo") => MediaKind::Photo,
        _ => MediaKind::Directory,
    }
}

/// Conversion context: who served the listing and where it was requested.
pub struct Origin<'a> {
    pub server: Option<&'a MediaServer>,
    pub request_url: &'a str,
}

impl Origin<'_> {
    fn item_path(&self, key: &str) -> String {
        if key.contains("://") {
            return key.to_string();
        }
        match self.server {
            Some(server) if key.starts_with('/') => server.build_url(key),
            _ => url::append_path(self.request_url, key).unwrap_or_else(|_| key.to_string()),
        }
    }

    fn part_path(&self, key: &str) -> String {
        if key.contains("://") {
            return key.to_string();
        }
        let Some(server) = self.server else {
            return key.to_string();
        };
        let http = server.http_url(key);
        match server.token {
            Some(ref token) => url::set_option(&http, "X-Plex-Token", token).unwrap_or(http),
            None => http,
        }
    }
}

impl MediaContainer {
    pub fn into_list(self, origin: &Origin<'_>) -> ContentList {
        let identifier = self.identifier.clone();
        let section_uuid = self.library_section_uuid.clone();
        let server_uuid = origin.server.map(|s| s.uuid.clone());
        let remote = origin.server.is_some_and(|s| !s.local);

        let leaves = self.metadata.into_iter().map(|i| (i, false));
        let folders = self.directories.into_iter().map(|i| (i, true));

        let items = leaves
            .chain(folders)
            .map(|(wire, is_folder)| {
                let kind = if is_folder {
                    MediaKind::Directory
                } else {
                    media_kind(wire.item_type.as_deref())
                };
                let media = wire
                    .media
                    .into_iter()
                    .map(|m| MediaAlternative {
                        id: m.id.map(|v| match v {
                            Value::String(s) => s,
                            other => other.to_string(),
                        }),
                        indirect: truthy(&m.indirect),
                        container: m.container,
                        video_codec: m.video_codec,
                        audio_codec: m.audio_codec,
                        bitrate_kbps: m.bitrate,
                        width: m.width,
                        height: m.height,
                        http_headers: None,
                        parts: m
                            .parts
                            .into_iter()
                            .map(|p| MediaPart {
                                path: origin.part_path(&p.key),
                                unprocessed_key: Some(p.key),
                                file: p.file,
                                post_url: p.post_url,
                                duration_ms: p.duration,
                                remote,
                            })
                            .collect(),
                    })
                    .collect();

                ContentItem {
                    path: origin.item_path(&wire.key),
                    label: wire.title,
                    kind,
                    unprocessed_key: Some(wire.key),
                    server: server_uuid.clone(),
                    http_cookies: wire.http_cookies,
                    user_agent: wire.user_agent,
                    library_section_uuid: wire.library_section_uuid.or_else(|| section_uuid.clone()),
                    identifier: identifier.clone(),
                    is_folder,
                    properties: wire.extra,
                    media,
                    ..ContentItem::default()
                }
            })
            .collect::<Vec<_>>();

        let mut list = ContentList::new(items);
        list.http_headers = self.http_headers;
        list.play_queue_id = self.play_queue_id;
        list.play_queue_selected_offset = self.play_queue_selected_item_offset;
        list.identifier = identifier;
        list.library_section_uuid = section_uuid;
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_keys_into_references() {
        let raw = serde_json::json!({
            "MediaContainer": {
                "identifier": "com.plexapp.plugins.library",
                "librarySectionUUID": "sec-1",
                "Metadata": [{
                    "key": "/library/metadata/7",
                    "title": "Heat",
                    "type": "movie",
                    "viewCount": 2,
                    "Media": [{
                        "id": 31,
                        "indirect": 1,
                        "videoCodec": "h264",
                        "Part": [{ "key": "/library/parts/31/file.mkv", "file": "/data/heat.mkv" }]
                    }]
                }],
                "Directory": [{ "key": "all", "title": "All Movies" }]
            }
        });
        let envelope: Envelope = serde_json::from_value(raw).unwrap();
        let mut server = MediaServer::new("abc", "http://nas:32400");
        server.token = Some("tok".into());
        let origin = Origin {
            server: Some(&server),
            request_url: "plexserver://abc/library/sections/1",
        };
        let list = envelope.media_container.into_list(&origin);

        assert_eq!(list.len(), 2);
        let heat = list.get(0).unwrap();
        assert_eq!(heat.path, "plexserver://abc/library/metadata/7");
        assert_eq!(heat.kind, MediaKind::Video);
        assert_eq!(heat.library_section_uuid.as_deref(), Some("sec-1"));
        assert_eq!(heat.properties.get("viewCount"), Some(&serde_json::json!(2)));
        assert!(heat.media[0].indirect);
        assert_eq!(heat.media[0].id.as_deref(), Some("31"));
        assert_eq!(
            heat.media[0].parts[0].path,
            "http://nas:32400/library/parts/31/file.mkv?X-Plex-Token=tok"
        );

        let all = list.get(1).unwrap();
        assert!(all.is_folder);
        assert_eq!(all.path, "plexserver://abc/library/sections/1/all");
    }
}
