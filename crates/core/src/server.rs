use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::item::ContentItem;
use crate::url;

/// A remote library server the client knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaServer {
    pub uuid: String,
    pub name: String,
    /// HTTP base address, e.g. `http://192.168.1.10:32400`.
    pub base_url: String,
    pub token: Option<String>,
    /// Reachable on the local network.
    pub local: bool,
    /// Advertises the server-side play queue API.
    pub supports_play_queues: bool,
}

impl MediaServer {
    pub fn new(uuid: impl Into<String>, base_url: impl Into<String>) -> Self {
        let uuid = uuid.into();
        Self {
            name: uuid.clone(),
            uuid,
            base_url: base_url.into(),
            token: None,
            local: true,
            supports_play_queues: true,
        }
    }

    /// Server-scoped reference for `path` on this server.
    pub fn build_url(&self, path: &str) -> String {
        url::server_url(&self.uuid, path)
    }

    /// Whether `address` is streamed by this server: a reference on it, one of
    /// its HTTP addresses, or a server-relative key.
    pub fn serves(&self, address: &str) -> bool {
        if address.starts_with('/') {
            return true;
        }
        if address.starts_with(url::SERVER_SCHEME) {
            return url::host_of(address).as_deref() == Some(self.uuid.as_str());
        }
        address
            .strip_prefix(self.base_url.trim_end_matches('/'))
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']))
    }

    /// Absolute HTTP address for a server-relative path.
    pub fn http_url(&self, path_and_query: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path_and_query.trim_start_matches('/')
        )
    }
}

/// Servers currently known to the client, looked up by UUID.
///
/// Passed explicitly to the components that need it.
#[derive(Debug, Default)]
pub struct ServerRegistry {
    servers: RwLock<HashMap<String, Arc<MediaServer>>>,
    best: RwLock<Option<String>>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, server: MediaServer) -> Arc<MediaServer> {
        let server = Arc::new(server);
        self.servers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(server.uuid.clone(), server.clone());
        server
    }

    pub fn remove(&self, uuid: &str) -> Option<Arc<MediaServer>> {
        let mut best = self.best.write().unwrap_or_else(|e| e.into_inner());
        if best.as_deref() == Some(uuid) {
            *best = None;
        }
        self.servers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(uuid)
    }

    pub fn set_best(&self, uuid: &str) {
        *self.best.write().unwrap_or_else(|e| e.into_inner()) = Some(uuid.to_string());
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<Arc<MediaServer>> {
        self.servers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(uuid)
            .cloned()
    }

    /// The server owning an item: its explicit server, else the host of its path.
    pub fn find_from_item(&self, item: &ContentItem) -> Option<Arc<MediaServer>> {
        let uuid = item.server.clone().or_else(|| url::host_of(&item.path))?;
        self.find_by_uuid(&uuid)
    }

    /// The preferred server: the one marked best, else a local one, else any.
    pub fn best_server(&self) -> Option<Arc<MediaServer>> {
        let marked = self.best.read().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(server) = marked.and_then(|uuid| self.find_by_uuid(&uuid)) {
            return Some(server);
        }
        let servers = self.servers.read().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<&Arc<MediaServer>> = servers.values().collect();
        all.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        all.iter()
            .find(|s| s.local)
            .or_else(|| all.first())
            .map(|s| Arc::clone(s))
    }

    /// Reference to `path` on the best server, falling back to the local one.
    pub fn best_server_url(&self, path: &str) -> String {
        match self.best_server() {
            Some(server) => server.build_url(path),
            None => url::server_url("local", path),
        }
    }

    pub fn len(&self) -> usize {
        self.servers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
