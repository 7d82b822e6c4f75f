//! Owner of the live play queue.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use rustplex_core::settings::{MOST_RECENT_PLAY_QUEUE, SettingsStore};
use rustplex_core::{ContentItem, ContentList, ServerRegistry, url};
use rustplex_remote::RemoteApi;

use crate::backend::{QueueBackend, select_backend};
use crate::error::QueueError;
use crate::queue::{PlayQueue, PlayQueueItem};
use crate::reconcile::reconcile;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum QueueEvent {
    /// A different queue became live.
    #[serde(rename = "play_queue_replaced")]
    Replaced { id: Option<u64>, selected_offset: usize },
    /// The live queue was edited in place to match the server.
    #[serde(rename = "play_queue_updated")]
    Updated { id: Option<u64> },
}

struct Live {
    backend: QueueBackend,
    queue: PlayQueue,
}

pub struct PlayQueueManager {
    servers: Arc<ServerRegistry>,
    remote: Arc<dyn RemoteApi>,
    settings: Arc<dyn SettingsStore>,
    live: Mutex<Option<Live>>,
    events: broadcast::Sender<QueueEvent>,
}

impl PlayQueueManager {
    pub fn new(
        servers: Arc<ServerRegistry>,
        remote: Arc<dyn RemoteApi>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            servers,
            remote,
            settings,
            live: Mutex::new(None),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Live>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the live queue.
    pub fn current(&self) -> Option<PlayQueue> {
        self.lock().as_ref().map(|live| live.queue.clone())
    }

    /// Start playing a queue built over `container`.
    pub async fn create(
        &self,
        container: &ContentItem,
        uri: Option<&str>,
        start_key: Option<&str>,
        shuffle: bool,
    ) -> Result<PlayQueue, QueueError> {
        let backend = select_backend(container, &self.servers)
            .ok_or_else(|| QueueError::NoServer(container.path.clone()))?;
        let list = backend
            .create(self.remote.as_ref(), container, uri, start_key, shuffle)
            .await?;
        self.queue_updated(backend, &list).await
    }

    /// Refetch the live server queue and merge it in.
    pub async fn refresh(&self) -> Result<Option<PlayQueue>, QueueError> {
        let target = self
            .lock()
            .as_ref()
            .and_then(|live| Some((live.backend.clone(), live.queue.id?)));
        let Some((backend, id)) = target else {
            return Ok(None);
        };
        match backend.fetch(self.remote.as_ref(), id).await? {
            Some(list) => self.queue_updated(backend, &list).await.map(Some),
            None => Ok(None),
        }
    }

    /// Apply a fetched queue.
    ///
    /// The same queue already live is reconciled in place so playback is not
    /// disturbed; anything else replaces the live queue and is remembered for
    /// the next start.
    pub async fn queue_updated(
        &self,
        backend: QueueBackend,
        list: &ContentList,
    ) -> Result<PlayQueue, QueueError> {
        let server = backend.server().clone();
        let incoming = PlayQueue::from_list(list, Some(server.uuid.clone()));

        let replaced = {
            let mut live = self.lock();
            match live.as_mut() {
                Some(current) if incoming.id.is_some() && current.queue.id == incoming.id => {
                    let remote_items: Vec<PlayQueueItem> = incoming.items().to_vec();
                    if reconcile(&mut current.queue, &remote_items) {
                        debug!(id = ?incoming.id, items = current.queue.len(), "play queue reconciled");
                        let _ = self.events.send(QueueEvent::Updated { id: incoming.id });
                    }
                    current.backend = backend;
                    None
                }
                _ => {
                    let event = QueueEvent::Replaced {
                        id: incoming.id,
                        selected_offset: incoming.selected_offset,
                    };
                    *live = Some(Live {
                        backend,
                        queue: incoming.clone(),
                    });
                    let _ = self.events.send(event);
                    Some(incoming)
                }
            }
        };

        match replaced {
            Some(queue) => {
                info!(id = ?queue.id, kind = %queue.kind, items = queue.len(), "now playing play queue");
                if let Some(id) = queue.id.filter(|id| *id > 0) {
                    let saved = server.build_url(&id.to_string());
                    self.settings.set(MOST_RECENT_PLAY_QUEUE, &saved).await?;
                }
                Ok(queue)
            }
            None => self.current().ok_or_else(|| QueueError::NoServer(server.uuid.clone())),
        }
    }

    /// Restore the queue remembered by the last session, unless one is live.
    pub async fn load_saved(&self) -> Result<Option<PlayQueue>, QueueError> {
        if self.lock().is_some() {
            return Ok(None);
        }
        let Some(saved) = self.settings.get(MOST_RECENT_PLAY_QUEUE).await? else {
            return Ok(None);
        };

        let uuid = url::host_of(&saved).ok_or_else(|| QueueError::InvalidSaved(saved.clone()))?;
        let Some(server) = self.servers.find_by_uuid(&uuid) else {
            debug!(server = %uuid, "saved play queue server not available");
            return Ok(None);
        };
        let id: u64 = url::path_and_query(&saved)?
            .trim_matches('/')
            .parse()
            .map_err(|_| QueueError::InvalidSaved(saved.clone()))?;

        let backend = QueueBackend::Remote(server);
        match backend.fetch(self.remote.as_ref(), id).await? {
            Some(list) => self.queue_updated(backend, &list).await.map(Some),
            None => Ok(None),
        }
    }
}
