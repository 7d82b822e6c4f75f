//! Following indirect media to the address that actually plays.

use tracing::debug;

use rustplex_core::{MediaAlternative, MediaPart, url};
use rustplex_remote::RemoteApi;

use crate::error::ResolveError;

/// Some services only hand out session cookies to browsers.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_8_2) AppleWebKit/537.17 (KHTML, like Gecko) Chrome/24.0.1312.52 Safari/537.17";

/// Where to fetch the real media for an indirect part.
///
/// Server-relative keys stay on the owning server so the reply keeps its
/// server association.
fn follow_url(part: &MediaPart, server: Option<&str>) -> String {
    match (server, part.unprocessed_key.as_deref()) {
        (Some(uuid), Some(key)) if key.starts_with('/') => url::server_url(uuid, key),
        _ => part.path.clone(),
    }
}

/// Replace `alternative` with the media it points at until it is direct.
///
/// Each hop is one listing fetch. Indirection is only defined for single-part
/// alternatives, and at most `max_depth` hops are followed.
pub async fn resolve_indirect(
    remote: &dyn RemoteApi,
    mut alternative: MediaAlternative,
    server: Option<&str>,
    max_depth: usize,
) -> Result<MediaAlternative, ResolveError> {
    let mut depth = 0;

    while alternative.indirect {
        if depth == max_depth {
            return Err(ResolveError::IndirectDepthExceeded(max_depth));
        }
        depth += 1;

        let part = match alternative.parts.as_slice() {
            [] => return Err(ResolveError::NoMediaParts),
            [part] => part,
            parts => return Err(ResolveError::AmbiguousIndirect(parts.len())),
        };

        let mut target = follow_url(part, server);
        let mut body = None;
        if let Some(post_url) = part.post_url.as_deref() {
            debug!(depth, post_url, "fetching post data");
            let raw = remote.fetch_raw(post_url, Some(BROWSER_USER_AGENT)).await?;
            let data = format!("{}{}", raw.headers, raw.body);
            if !data.is_empty() {
                body = Some(data);
            }
            target = url::set_option(&target, "postURL", post_url)?;
        }

        debug!(depth, url = %target, post = body.is_some(), "following indirect media");
        let list = remote.fetch_directory(&target, body.as_deref()).await?;
        let mut next = list
            .first()
            .and_then(|item| item.media.first())
            .cloned()
            .ok_or(ResolveError::EmptyIndirect)?;
        if next.parts.is_empty() {
            return Err(ResolveError::NoMediaParts);
        }
        if list.http_headers.is_some() {
            next.http_headers = list.http_headers.clone();
        }
        alternative = next;
    }

    Ok(alternative)
}
