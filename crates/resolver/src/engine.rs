//! Turns an item reference into one playable address.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rustplex_core::config::ClientConfig;
use rustplex_core::{ContentItem, ServerRegistry};
use rustplex_remote::RemoteApi;
use rustplex_transcoder::TranscodePolicy;

use crate::error::ResolveError;
use crate::headers;
use crate::indirect;
use crate::parts::{self, FileProbe, PartSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveState {
    Idle,
    Resolving,
    Resolved,
    Failed,
    Cancelled,
}

/// "This is taking a while" affordance shown while a resolution runs long.
pub trait BusyIndicator: Send + Sync {
    /// Show the indicator. The returned token fires when the user cancels.
    fn show(&self) -> CancellationToken;
    fn close(&self);
}

/// Indicator for callers without a display; never cancels.
#[derive(Debug, Default)]
pub struct NoBusyIndicator;

impl BusyIndicator for NoBusyIndicator {
    fn show(&self) -> CancellationToken {
        CancellationToken::new()
    }

    fn close(&self) {}
}

pub struct MediaDecisionEngine {
    remote: Arc<dyn RemoteApi>,
    servers: Arc<ServerRegistry>,
    policy: Arc<dyn TranscodePolicy>,
    probe: Arc<dyn FileProbe>,
    grace_period: Duration,
    max_depth: usize,
    state: watch::Sender<ResolveState>,
}

impl MediaDecisionEngine {
    pub fn new(
        remote: Arc<dyn RemoteApi>,
        servers: Arc<ServerRegistry>,
        policy: Arc<dyn TranscodePolicy>,
        probe: Arc<dyn FileProbe>,
        config: &ClientConfig,
    ) -> Self {
        let (state, _) = watch::channel(ResolveState::Idle);
        Self {
            remote,
            servers,
            policy,
            probe,
            grace_period: config.grace_period,
            max_depth: config.max_indirect_depth,
            state,
        }
    }

    pub fn state(&self) -> ResolveState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolveState> {
        self.state.subscribe()
    }

    /// Resolve `item` into a player-ready item.
    ///
    /// Waits silently for the grace period, then shows `busy` once and keeps
    /// waiting until the work finishes or either `cancel` or the indicator's
    /// token fires. Cancelling drops the in-flight requests.
    pub async fn resolve(
        &self,
        item: &ContentItem,
        cancel: CancellationToken,
        busy: &dyn BusyIndicator,
    ) -> Result<ContentItem, ResolveError> {
        self.state.send_replace(ResolveState::Resolving);

        let work = self.choose_media(item.clone());
        tokio::pin!(work);

        let early = tokio::select! {
            biased;
            _ = cancel.cancelled() => Some(Err(ResolveError::Cancelled)),
            result = &mut work => Some(result),
            _ = tokio::time::sleep(self.grace_period) => None,
        };

        let outcome = match early {
            Some(result) => result,
            None => {
                debug!(path = %item.path, "resolution slow, showing busy indicator");
                let dismissed = busy.show();
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ResolveError::Cancelled),
                    _ = dismissed.cancelled() => Err(ResolveError::Cancelled),
                    result = &mut work => result,
                };
                busy.close();
                result
            }
        };

        let state = match &outcome {
            Ok(resolved) => {
                info!(path = %item.path, url = %resolved.path, "item resolved");
                ResolveState::Resolved
            }
            Err(ResolveError::Cancelled) => {
                debug!(path = %item.path, "resolution cancelled");
                ResolveState::Cancelled
            }
            Err(e) => {
                warn!(path = %item.path, error = %e, code = e.code(), "resolution failed");
                ResolveState::Failed
            }
        };
        self.state.send_replace(state);
        outcome
    }

    async fn choose_media(&self, item: ContentItem) -> Result<ContentItem, ResolveError> {
        let mut chosen = if item.is_server_backed() && item.kind.is_playable() && !item.synthesized {
            debug!(path = %item.path, "loading item detail");
            let mut detail = self.remote.fetch_detail(&item).await?;
            if detail.selected_media_item.is_none() {
                detail.selected_media_item = item.selected_media_item;
            }
            detail
        } else if item.media.is_empty() {
            return Ok(item);
        } else {
            item
        };

        let alternative = chosen
            .selected_alternative()
            .cloned()
            .ok_or(ResolveError::NoMediaAlternative)?;
        let alternative = indirect::resolve_indirect(
            self.remote.as_ref(),
            alternative,
            chosen.server.as_deref(),
            self.max_depth,
        )
        .await?;

        if alternative.http_headers.is_some() {
            chosen.http_headers = alternative.http_headers.clone();
        }

        let sources: Vec<PartSource> = alternative
            .parts
            .iter()
            .map(|part| parts::part_source(part, self.probe.as_ref()))
            .collect();
        chosen.path = match sources.as_slice() {
            [] => return Err(ResolveError::NoMediaParts),
            [single] => {
                chosen.selected_part = alternative.parts.first().cloned();
                single.url().to_string()
            }
            many => {
                let stacked = parts::stack_url(many);
                debug!(parts = many.len(), url = %stacked, "built stack");
                stacked
            }
        };

        let index = chosen.selected_media_item.unwrap_or(0);
        if let Some(slot) = chosen.media.get_mut(index) {
            *slot = alternative;
        }

        // Only streams from the owning server can be swapped for a transcode.
        let owner = self
            .servers
            .find_from_item(&chosen)
            .filter(|server| sources.iter().all(|s| s.is_stream() && server.serves(s.url())));
        match owner {
            Some(server) if self.policy.should_transcode(&server, &chosen) => {
                chosen.path = self.policy.transcode_url(&server, &chosen);
                chosen.transcoded = true;
                debug!(server = %server.uuid, url = %chosen.path, "item will be transcoded");
            }
            Some(_) => {}
            None => debug!(url = %chosen.path, "not streamed by its server, no transcode"),
        }

        headers::inject(&mut chosen);
        Ok(chosen)
    }
}
