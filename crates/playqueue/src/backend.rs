use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use rustplex_core::{ContentItem, ContentList, MediaKind, MediaServer, ServerRegistry, url};
use rustplex_remote::RemoteApi;

use crate::error::QueueError;

/// Plugin identifier of server library containers.
pub const LIBRARY_IDENTIFIER: &str = "com.plexapp.plugins.library";

/// Where a play queue is kept.
#[derive(Debug, Clone)]
pub enum QueueBackend {
    /// Built and owned by the server's play queue service.
    Remote(Arc<MediaServer>),
    /// Built here from the container listing.
    Local(Arc<MediaServer>),
}

/// Pick the backend for a queue started from `container`.
///
/// `None` when no known server owns the container.
pub fn select_backend(container: &ContentItem, servers: &ServerRegistry) -> Option<QueueBackend> {
    let Some(server) = servers.find_from_item(container) else {
        debug!(path = %container.path, "no server owns container, cannot queue");
        return None;
    };
    let library = container.identifier.as_deref() == Some(LIBRARY_IDENTIFIER);
    if library && server.supports_play_queues {
        debug!(server = %server.uuid, "using server play queue");
        Some(QueueBackend::Remote(server))
    } else {
        debug!(server = %server.uuid, identifier = ?container.identifier, "using local play queue");
        Some(QueueBackend::Local(server))
    }
}

/// `library://<section uuid>/<item|directory>/<encoded key>` for an item, or
/// `None` when it is not a server library item.
pub fn library_uri(item: &ContentItem, uri: Option<&str>) -> Option<String> {
    if !item.is_server_backed() {
        return None;
    }
    let Some(section) = item.library_section_uuid.as_deref() else {
        warn!(path = %item.path, "item has no section uuid");
        return None;
    };
    let kind = if item.is_folder { "directory" } else { "item" };
    let key = match uri.filter(|u| !u.is_empty()) {
        Some(uri) => uri,
        None => item.unprocessed_key.as_deref().unwrap_or_default(),
    };
    Some(format!("library://{section}/{kind}/{}", url::encode(key)))
}

fn queue_type(container: &ContentItem) -> &'static str {
    match container.kind {
        MediaKind::Audio => "audio",
        MediaKind::Photo => "photo",
        _ => "video",
    }
}

impl QueueBackend {
    pub fn server(&self) -> &Arc<MediaServer> {
        match self {
            Self::Remote(server) | Self::Local(server) => server,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Start a queue over `container`, positioned at `start_key` when given.
    pub async fn create(
        &self,
        remote: &dyn RemoteApi,
        container: &ContentItem,
        uri: Option<&str>,
        start_key: Option<&str>,
        shuffle: bool,
    ) -> Result<ContentList, QueueError> {
        match self {
            Self::Remote(server) => {
                let library = library_uri(container, uri)
                    .ok_or_else(|| QueueError::NotQueueable(container.path.clone()))?;
                let mut target = server.build_url("playQueues");
                target = url::set_option(&target, "type", queue_type(container))?;
                target = url::set_option(&target, "uri", &library)?;
                if let Some(key) = start_key {
                    target = url::set_option(&target, "key", key)?;
                }
                target = url::set_option(&target, "shuffle", if shuffle { "1" } else { "0" })?;
                debug!(url = %target, "creating server play queue");
                Ok(remote.fetch_directory(&target, Some("")).await?)
            }
            Self::Local(server) => {
                let listing = remote.fetch_directory(&container.path, None).await?;
                debug!(server = %server.uuid, items = listing.len(), shuffle, "building local play queue");
                Ok(local_queue(&listing, start_key, shuffle))
            }
        }
    }

    /// Fetch the current state of a server queue by id. Local queues have
    /// nothing to fetch.
    pub async fn fetch(&self, remote: &dyn RemoteApi, id: u64) -> Result<Option<ContentList>, QueueError> {
        match self {
            Self::Remote(server) => {
                let target = server.build_url(&format!("playQueues/{id}"));
                Ok(Some(remote.fetch_directory(&target, None).await?))
            }
            Self::Local(_) => Ok(None),
        }
    }
}

/// Playable items of `listing`, optionally shuffled, with `start_key` selected.
///
/// When shuffling, the start item is moved to the front.
fn local_queue(listing: &ContentList, start_key: Option<&str>, shuffle: bool) -> ContentList {
    let mut items: Vec<ContentItem> = listing
        .iter()
        .filter(|i| i.kind.is_playable())
        .cloned()
        .collect();
    if shuffle {
        items.shuffle(&mut rand::thread_rng());
    }

    let start = start_key.and_then(|key| {
        items
            .iter()
            .position(|i| i.unprocessed_key.as_deref() == Some(key) || i.path == key)
    });
    let selected = match start {
        Some(index) if shuffle => {
            let item = items.remove(index);
            items.insert(0, item);
            0
        }
        Some(index) => index,
        None => 0,
    };

    let mut list = ContentList::new(items);
    list.play_queue_selected_offset = Some(selected);
    list.identifier = listing.identifier.clone();
    list.library_section_uuid = listing.library_section_uuid.clone();
    list
}
