use rustplex_core::config::ClientConfig;
use rustplex_core::{ContentKind, SectionKind, ServerRegistry, TransportError, url};

/// Page size requested on memory-constrained platforms.
const CONSTRAINED_PAGE_SIZE: &str = "20";

/// One list fetch a section refresh needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLoad {
    pub url: String,
    pub kind: ContentKind,
    /// Whether the "section ready" notification waits for this load.
    pub tracked: bool,
}

impl PlannedLoad {
    fn tracked(url: String, kind: ContentKind) -> Self {
        Self {
            url,
            kind,
            tracked: true,
        }
    }

    fn fanart(url: String) -> Self {
        Self {
            url,
            kind: ContentKind::Fanart,
            tracked: false,
        }
    }
}

/// Work a refresh of `section` must schedule. Fanart is never tracked.
pub fn plan_refresh(
    section: &str,
    kind: SectionKind,
    config: &ClientConfig,
    servers: &ServerRegistry,
) -> Result<Vec<PlannedLoad>, TransportError> {
    let mut loads = Vec::new();

    match kind {
        SectionKind::GlobalArt => {
            if config.global_slideshow {
                loads.push(PlannedLoad::fanart(servers.best_server_url("library/arts")));
            }
        }
        SectionKind::Queue => {
            if !config.hide_fanouts {
                loads.push(PlannedLoad::tracked(
                    url::append_path(section, "unwatched")?,
                    ContentKind::Queue,
                ));
            }
        }
        SectionKind::Channels => {
            if !config.hide_fanouts {
                loads.push(PlannedLoad::tracked(
                    servers.best_server_url("channels/recentlyViewed"),
                    ContentKind::RecentlyAccessed,
                ));
            }
            loads.push(PlannedLoad::fanart(servers.best_server_url("channels/arts")));
        }
        _ => {
            if !config.hide_fanouts {
                let mut recent = section.to_string();
                if config.constrained {
                    recent = url::set_option(&recent, "X-Plex-Container-Start", "0")?;
                    recent = url::set_option(&recent, "X-Plex-Container-Size", CONSTRAINED_PAGE_SIZE)?;
                }
                if kind != SectionKind::Album {
                    recent = url::set_option(&recent, "unwatched", "1")?;
                }
                loads.push(PlannedLoad::tracked(
                    url::append_path(&recent, "recentlyAdded")?,
                    ContentKind::RecentlyAdded,
                ));

                if matches!(kind, SectionKind::Movie | SectionKind::Show) {
                    loads.push(PlannedLoad::tracked(
                        url::append_path(section, "onDeck")?,
                        ContentKind::OnDeck,
                    ));
                }
            }

            if config.global_slideshow {
                loads.push(PlannedLoad::fanart(url::append_path(section, "arts")?));
            }
        }
    }

    Ok(loads)
}
