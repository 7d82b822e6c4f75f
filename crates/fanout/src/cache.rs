//! Registry of section fanouts.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use rustplex_core::config::ClientConfig;
use rustplex_core::{
    ContentItem, ContentKind, ContentList, MediaKind, SectionKind, ServerRegistry, url,
};

use crate::SectionEvent;
use crate::jobs::JobScheduler;
use crate::section::{FanoutContext, SectionFanout};

const EVENT_CAPACITY: usize = 256;
const DEFAULT_FANART: &str = ":/resources/show-fanart.jpg";

/// Section kind for a server directory type; unknown types fall back to movies.
pub fn section_kind_for(dir_type: &str) -> SectionKind {
    SectionKind::from_directory_type(dir_type).unwrap_or_else(|| {
        warn!(dir_type, "unknown directory type, using movie fanout");
        SectionKind::Movie
    })
}

pub struct ContentCache {
    ctx: Arc<FanoutContext>,
    sections: RwLock<BTreeMap<String, Arc<SectionFanout>>>,
}

impl ContentCache {
    pub fn new(
        scheduler: Arc<dyn JobScheduler>,
        servers: Arc<ServerRegistry>,
        config: ClientConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let cache = Self {
            ctx: Arc::new(FanoutContext {
                scheduler,
                servers,
                config,
                events,
            }),
            sections: RwLock::new(BTreeMap::new()),
        };
        cache.ensure_section(url::GLOBAL_ART_SECTION, SectionKind::GlobalArt);
        cache
    }

    /// Receive section and fanart notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SectionEvent> {
        self.ctx.events.subscribe()
    }

    /// Register `reference` if it is not known yet. Performs no I/O.
    pub fn ensure_section(&self, reference: &str, kind: SectionKind) -> Arc<SectionFanout> {
        if let Some(section) = self.section(reference) {
            return section;
        }
        let mut sections = self.sections.write().unwrap_or_else(|e| e.into_inner());
        sections
            .entry(reference.to_string())
            .or_insert_with(|| {
                debug!(section = reference, %kind, "section registered");
                Arc::new(SectionFanout::new(reference, kind, self.ctx.clone()))
            })
            .clone()
    }

    /// Drop a section; completions of its in-flight jobs are discarded.
    pub fn remove_section(&self, reference: &str) -> bool {
        let removed = self
            .sections
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(reference)
            .is_some();
        if removed {
            debug!(section = reference, "section removed");
        }
        removed
    }

    pub fn section(&self, reference: &str) -> Option<Arc<SectionFanout>> {
        self.sections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(reference)
            .cloned()
    }

    /// Known section references, in order.
    pub fn sections(&self) -> Vec<String> {
        self.sections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Refresh a registered section. Returns `false` when it is unknown.
    pub fn refresh(&self, reference: &str, force: bool) -> bool {
        match self.section(reference) {
            Some(section) => {
                section.refresh(force);
                true
            }
            None => false,
        }
    }

    /// Register the section if needed, then refresh it.
    pub fn refresh_section(&self, reference: &str, kind: SectionKind, force: bool) {
        self.ensure_section(reference, kind).refresh(force);
    }

    /// Refresh stale sections, or every section when `force` is set.
    pub fn refresh_all(&self, force: bool) {
        for section in self.snapshot() {
            if force || section.is_stale() {
                section.refresh(force);
            }
        }
    }

    /// Flag every section served by `server_uuid` for a refresh on next display.
    pub fn mark_server_stale(&self, server_uuid: &str) -> usize {
        let mut marked = 0;
        for section in self.snapshot() {
            if url::host_of(section.url()).as_deref() == Some(server_uuid) {
                section.mark_needs_refresh();
                marked += 1;
            }
        }
        info!(server = server_uuid, sections = marked, "sections marked stale");
        marked
    }

    /// Make the registered sections match the published list.
    ///
    /// New sections are added, vanished ones dropped. The global artwork and
    /// channel sections are never dropped here.
    pub fn sync_sections(&self, published: &[(String, SectionKind)]) {
        for (reference, kind) in published {
            self.ensure_section(reference, *kind);
        }

        let mut sections = self.sections.write().unwrap_or_else(|e| e.into_inner());
        let before = sections.len();
        sections.retain(|reference, _| {
            reference == url::GLOBAL_ART_SECTION
                || reference == url::CHANNELS_SECTION
                || published.iter().any(|(r, _)| r == reference)
        });
        let dropped = before - sections.len();
        if dropped > 0 {
            info!(dropped, "vanished sections dropped");
        }
    }

    /// Display a section: refresh when stale, otherwise replay its notifications.
    /// Returns `false` when the section is unknown.
    pub fn show(&self, reference: &str) -> bool {
        match self.section(reference) {
            Some(section) => {
                section.show();
                true
            }
            None => false,
        }
    }

    pub fn content_kinds(&self, reference: &str) -> Vec<ContentKind> {
        self.section(reference)
            .map(|s| s.content_kinds())
            .unwrap_or_default()
    }

    /// Current snapshot for `(reference, kind)`. Never blocks on the network.
    pub fn content_list(&self, reference: &str, kind: ContentKind) -> ContentList {
        let list = self
            .section(reference)
            .map(|s| s.content_list(kind))
            .unwrap_or_default();

        if kind == ContentKind::Fanart && list.is_empty() && !self.ctx.config.global_slideshow {
            let path = self.ctx.servers.best_server_url(DEFAULT_FANART);
            return ContentList::new(vec![ContentItem::new(path, "fanart", MediaKind::Photo)]);
        }
        list
    }

    fn snapshot(&self) -> Vec<Arc<SectionFanout>> {
        self.sections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::jobs::{Completion, JobId, LoadJob, Priority};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingScheduler {
        jobs: Mutex<Vec<LoadJob>>,
    }

    impl JobScheduler for CountingScheduler {
        fn schedule(&self, job: LoadJob, _priority: Priority, _done: Completion) -> JobId {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.push(job);
            jobs.len() as JobId
        }
    }

    fn new_cache(config: ClientConfig) -> (ContentCache, Arc<CountingScheduler>) {
        let scheduler = Arc::new(CountingScheduler::default());
        let servers = Arc::new(ServerRegistry::new());
        servers.add(rustplex_core::MediaServer::new("abc", "http://nas:32400"));
        (ContentCache::new(scheduler.clone(), servers, config), scheduler)
    }

    #[test]
    fn global_art_is_registered_up_front() {
        let (cache, scheduler) = new_cache(ClientConfig::default());
        assert_eq!(cache.sections(), vec![url::GLOBAL_ART_SECTION.to_string()]);
        assert!(scheduler.jobs.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_directory_type_maps_to_movie() {
        assert_eq!(section_kind_for("artist"), SectionKind::Album);
        assert_eq!(section_kind_for("playlist"), SectionKind::Queue);
        assert_eq!(section_kind_for("clip"), SectionKind::Movie);
    }

    #[test]
    fn sync_keeps_global_and_channel_sections() {
        let (cache, _) = new_cache(ClientConfig::default());
        cache.ensure_section(url::CHANNELS_SECTION, SectionKind::Channels);
        cache.sync_sections(&[
            ("plexserver://abc/library/sections/1".into(), SectionKind::Movie),
            ("plexserver://abc/library/sections/2".into(), SectionKind::Show),
        ]);
        assert_eq!(cache.sections().len(), 4);

        cache.sync_sections(&[("plexserver://abc/library/sections/2".into(), SectionKind::Show)]);
        let sections = cache.sections();
        assert_eq!(sections.len(), 3);
        assert!(!sections.contains(&"plexserver://abc/library/sections/1".to_string()));
        assert!(sections.contains(&url::CHANNELS_SECTION.to_string()));
    }

    #[test]
    fn refresh_all_skips_fresh_sections_unless_forced() {
        let (cache, scheduler) = new_cache(ClientConfig::default());
        cache.refresh_section("plexserver://abc/library/sections/3", SectionKind::Album, false);
        let after_first = scheduler.jobs.lock().unwrap().len();
        // Global art (1 job) and the album section (2 jobs).
        cache.refresh_all(false);
        assert_eq!(scheduler.jobs.lock().unwrap().len(), after_first + 1);

        cache.refresh_all(true);
        assert_eq!(scheduler.jobs.lock().unwrap().len(), after_first + 4);
    }

    #[test]
    fn server_marked_stale_forces_refresh() {
        let (cache, _) = new_cache(ClientConfig::default());
        let section = cache.ensure_section("plexserver://abc/library/sections/1", SectionKind::Movie);
        cache.ensure_section("plexserver://other/library/sections/1", SectionKind::Movie);
        assert_eq!(cache.mark_server_stale("abc"), 1);
        assert!(section.is_stale());
    }

    #[test]
    fn fanart_falls_back_without_slideshow() {
        let (cache, _) = new_cache(ClientConfig {
            global_slideshow: false,
            ..ClientConfig::default()
        });
        let list = cache.content_list("plexserver://abc/library/sections/1", ContentKind::Fanart);
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.first().unwrap().path,
            "plexserver://abc/:/resources/show-fanart.jpg"
        );

        let (cache, _) = new_cache(ClientConfig::default());
        assert!(
            cache
                .content_list(url::GLOBAL_ART_SECTION, ContentKind::Fanart)
                .is_empty()
        );
    }

    #[test]
    fn unknown_section_operations_report_absence() {
        let (cache, _) = new_cache(ClientConfig::default());
        assert!(!cache.show("plexserver://abc/none"));
        assert!(!cache.refresh("plexserver://abc/none", true));
        assert!(cache.content_kinds("plexserver://abc/none").is_empty());
        assert!(!cache.remove_section("plexserver://abc/none"));
    }
}
