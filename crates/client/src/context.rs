//! Explicitly wired collaborators of one client session.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use rustplex_core::config::ClientConfig;
use rustplex_core::settings::SettingsStore;
use rustplex_core::{MediaServer, SectionKind, ServerRegistry};
use rustplex_db::{DbError, SqliteSettings};
use rustplex_fanout::{ContentCache, SectionEvent, WorkerPool};
use rustplex_playqueue::PlayQueueManager;
use rustplex_remote::{HttpRemoteApi, RemoteApi};
use rustplex_resolver::{LocalFs, MediaDecisionEngine};
use rustplex_transcoder::{CapsTranscodePolicy, TranscodeSettings};

/// Everything the client core needs, passed around instead of looked up.
#[derive(Clone)]
pub struct ClientContext {
    pub config: ClientConfig,
    pub servers: Arc<ServerRegistry>,
    pub remote: Arc<dyn RemoteApi>,
    pub settings: Arc<dyn SettingsStore>,
    pub cache: Arc<ContentCache>,
    pub engine: Arc<MediaDecisionEngine>,
    pub queues: Arc<PlayQueueManager>,
}

impl ClientContext {
    /// Wire the core around the given collaborators. Must run inside a tokio
    /// runtime; the section worker pool is spawned here.
    pub fn new(
        config: ClientConfig,
        servers: Arc<ServerRegistry>,
        remote: Arc<dyn RemoteApi>,
        settings: Arc<dyn SettingsStore>,
        transcode: TranscodeSettings,
    ) -> Self {
        let pool = Arc::new(WorkerPool::new(remote.clone(), config.workers));
        let cache = Arc::new(ContentCache::new(pool, servers.clone(), config.clone()));
        let engine = Arc::new(MediaDecisionEngine::new(
            remote.clone(),
            servers.clone(),
            Arc::new(CapsTranscodePolicy::new(transcode)),
            Arc::new(LocalFs),
            &config,
        ));
        let queues = Arc::new(PlayQueueManager::new(
            servers.clone(),
            remote.clone(),
            settings.clone(),
        ));

        Self {
            config,
            servers,
            remote,
            settings,
            cache,
            engine,
            queues,
        }
    }

    /// HTTP remote and SQLite settings for a single server.
    pub async fn open(config: ClientConfig, server: MediaServer) -> Result<Self, DbError> {
        let settings = SqliteSettings::open(&config.db_path).await?;
        info!(db_path = %config.db_path, "settings database ready");

        let servers = Arc::new(ServerRegistry::new());
        let server = servers.add(server);
        servers.set_best(&server.uuid);
        info!(server = %server.uuid, url = %server.base_url, "server registered");

        let remote = Arc::new(HttpRemoteApi::new(servers.clone()));
        Ok(Self::new(
            config,
            servers,
            remote,
            Arc::new(settings),
            TranscodeSettings::default(),
        ))
    }

    /// Refresh `sections` and wait until each has finished loading.
    ///
    /// Returns the sections that did not finish within `timeout`.
    pub async fn refresh_and_wait(
        &self,
        sections: &[(String, SectionKind)],
        timeout: Duration,
    ) -> Vec<String> {
        let mut events = self.cache.subscribe();
        for (reference, kind) in sections {
            self.cache.refresh_section(reference, *kind, true);
        }

        let mut pending: HashSet<String> = sections
            .iter()
            .filter(|(reference, _)| {
                self.cache
                    .section(reference)
                    .is_some_and(|s| s.outstanding_jobs() > 0)
            })
            .map(|(reference, _)| reference.clone())
            .collect();

        let deadline = tokio::time::Instant::now() + timeout;
        while !pending.is_empty() {
            match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Ok(SectionEvent::SectionReady { section, .. })) => {
                    debug!(section = %section, "section ready");
                    pending.remove(&section);
                }
                Ok(Ok(SectionEvent::FanartReady { .. })) => {}
                Ok(Err(RecvError::Closed)) => break,
                Ok(Err(e)) => {
                    warn!(error = %e, "section notifications lost");
                    pending.retain(|r| {
                        self.cache
                            .section(r)
                            .is_some_and(|s| s.outstanding_jobs() > 0)
                    });
                }
                Err(_) => break,
            }
        }

        let mut late: Vec<String> = pending.into_iter().collect();
        late.sort();
        late
    }
}
