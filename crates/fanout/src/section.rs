use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use rustplex_core::config::ClientConfig;
use rustplex_core::{ContentKind, ContentList, SectionKind, ServerRegistry, TransportError};

use crate::SectionEvent;
use crate::jobs::{JobId, JobScheduler, LoadJob, Priority};
use crate::plan;

/// Collaborators shared by every section of one cache.
pub struct FanoutContext {
    pub scheduler: Arc<dyn JobScheduler>,
    pub servers: Arc<ServerRegistry>,
    pub config: ClientConfig,
    pub events: broadcast::Sender<SectionEvent>,
}

#[derive(Default)]
struct FanoutState {
    lists: HashMap<ContentKind, ContentList>,
    /// Tracked (non-fanart) jobs of the current refresh round.
    outstanding: Vec<JobId>,
    last_refresh: Option<Instant>,
    needs_refresh: bool,
    /// Whether the current plan has any tracked job at all.
    tracks_jobs: bool,
}

/// Cached content lists of one section.
///
/// All mutation happens under one entry-local lock; readers get whole
/// snapshots.
pub struct SectionFanout {
    url: String,
    kind: SectionKind,
    ctx: Arc<FanoutContext>,
    state: Mutex<FanoutState>,
}

impl SectionFanout {
    pub fn new(url: impl Into<String>, kind: SectionKind, ctx: Arc<FanoutContext>) -> Self {
        Self {
            url: url.into(),
            kind,
            ctx,
            state: Mutex::new(FanoutState::default()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    fn lock(&self) -> MutexGuard<'_, FanoutState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the list for `kind`; empty when nothing was loaded yet.
    pub fn content_list(&self, kind: ContentKind) -> ContentList {
        self.lock().lists.get(&kind).cloned().unwrap_or_default()
    }

    /// Kinds that currently hold a loaded list.
    pub fn content_kinds(&self) -> Vec<ContentKind> {
        self.lock().lists.keys().copied().collect()
    }

    /// Jobs the next "section ready" notification still waits for.
    pub fn outstanding_jobs(&self) -> usize {
        self.lock().outstanding.len()
    }

    /// Force the next staleness check to report stale.
    pub fn mark_needs_refresh(&self) {
        self.lock().needs_refresh = true;
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Instant::now())
    }

    pub fn is_stale_at(&self, now: Instant) -> bool {
        let state = self.lock();
        if state.needs_refresh {
            return true;
        }
        let threshold = Duration::from_secs(self.kind.staleness_secs());
        match state.last_refresh {
            Some(at) => now.saturating_duration_since(at) > threshold,
            None => true,
        }
    }

    /// Schedule the loads this section's kind calls for.
    ///
    /// Without `force`, a refresh while tracked jobs are still in flight is
    /// coalesced into the running round.
    pub fn refresh(self: &Arc<Self>, force: bool) {
        let loads = match plan::plan_refresh(&self.url, self.kind, &self.ctx.config, &self.ctx.servers) {
            Ok(loads) => loads,
            Err(e) => {
                warn!(section = %self.url, error = %e, "cannot plan section refresh");
                return;
            }
        };

        let mut state = self.lock();
        if !force && !state.outstanding.is_empty() {
            debug!(section = %self.url, outstanding = state.outstanding.len(), "refresh coalesced");
            return;
        }

        debug!(section = %self.url, kind = %self.kind, loads = loads.len(), "refreshing section");
        state.needs_refresh = false;
        state.tracks_jobs = loads.iter().any(|l| l.tracked);
        if loads.is_empty() {
            state.last_refresh = Some(Instant::now());
            return;
        }

        for load in loads {
            let weak = Arc::downgrade(self);
            let kind = load.kind;
            let job = LoadJob {
                section: self.url.clone(),
                url: load.url,
                kind,
            };
            let id = self.ctx.scheduler.schedule(
                job,
                Priority::High,
                Box::new(move |id, result| {
                    // The section may have been removed while the job ran.
                    if let Some(section) = weak.upgrade() {
                        section.on_job_complete(id, kind, result);
                    }
                }),
            );
            if load.tracked {
                state.outstanding.push(id);
            }
        }
    }

    /// Apply the outcome of one load job.
    ///
    /// A failure keeps the previous snapshot and leaves the refresh time alone.
    pub fn on_job_complete(
        &self,
        job_id: JobId,
        kind: ContentKind,
        result: Result<ContentList, TransportError>,
    ) {
        let mut state = self.lock();

        match result {
            Ok(list) => {
                debug!(section = %self.url, %kind, items = list.len(), "content list replaced");
                state.lists.insert(kind, list);
                if kind != ContentKind::Fanart || !state.tracks_jobs {
                    state.last_refresh = Some(Instant::now());
                }
            }
            Err(e) => {
                warn!(section = %self.url, %kind, job_id, error = %e, "section load failed");
            }
        }

        let position = state.outstanding.iter().position(|id| *id == job_id);
        if let Some(position) = position {
            state.outstanding.remove(position);
        }

        if kind == ContentKind::Fanart {
            self.emit(SectionEvent::FanartReady {
                section: self.url.clone(),
            });
        } else if position.is_some() && state.outstanding.is_empty() {
            self.emit(SectionEvent::SectionReady {
                section: self.url.clone(),
                kind: self.kind,
            });
        }
    }

    /// Refresh when stale, otherwise replay the ready notifications so a
    /// re-displayed section does not wait on the network.
    pub fn show(self: &Arc<Self>) {
        if self.is_stale() {
            self.refresh(false);
            return;
        }
        self.emit(SectionEvent::SectionReady {
            section: self.url.clone(),
            kind: self.kind,
        });
        self.emit(SectionEvent::FanartReady {
            section: self.url.clone(),
        });
    }

    fn emit(&self, event: SectionEvent) {
        // No subscribers is fine.
        let _ = self.ctx.events.send(event);
    }
}
