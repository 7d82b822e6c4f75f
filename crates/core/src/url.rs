//! Helpers for the URL-like references used across the client.
//!
//! Server-backed paths look like `plexserver://<server-uuid>/<path>?<options>`.
//! Player URLs may carry protocol options after a `|` separator, and stacked
//! items use `stack://a , b` with literal commas doubled.

use url::Url;

use crate::error::TransportError;

pub const SERVER_SCHEME: &str = "plexserver://";
pub const STACK_SCHEME: &str = "stack://";
pub const GLOBAL_ART_SECTION: &str = "global://art/";
pub const CHANNELS_SECTION: &str = "plexserver://channels/";

const STACK_SEPARATOR: &str = " , ";

fn parse(url: &str) -> Result<Url, TransportError> {
    Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))
}

/// Build a server-scoped reference for `path` on the server `uuid`.
pub fn server_url(uuid: &str, path: &str) -> String {
    format!("{SERVER_SCHEME}{uuid}/{}", path.trim_start_matches('/'))
}

/// Host component of a reference; for server-backed paths this is the server UUID.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// Path and query of a reference, without scheme and host.
pub fn path_and_query(url: &str) -> Result<String, TransportError> {
    let parsed = parse(url)?;
    Ok(match parsed.query() {
        Some(q) => format!("{}?{q}", parsed.path()),
        None => parsed.path().to_string(),
    })
}

/// Append one path segment, keeping any query options in place.
pub fn append_path(url: &str, segment: &str) -> Result<String, TransportError> {
    let mut parsed = parse(url)?;
    let base = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&format!("{base}/{}", segment.trim_start_matches('/')));
    Ok(parsed.into())
}

/// Set (or replace) a query option.
pub fn set_option(url: &str, key: &str, value: &str) -> Result<String, TransportError> {
    let mut parsed = parse(url)?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    parsed
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(key, value);
    Ok(parsed.into())
}

/// Combine part paths into a single stacked path, in order.
pub fn stack_path<S: AsRef<str>>(parts: &[S]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref().replace(',', ",,"))
        .collect::<Vec<_>>()
        .join(STACK_SEPARATOR);
    format!("{STACK_SCHEME}{joined}")
}

/// Split a stacked path back into its part paths.
pub fn split_stack_path(url: &str) -> Option<Vec<String>> {
    let body = url.strip_prefix(STACK_SCHEME)?;
    Some(
        body.split(STACK_SEPARATOR)
            .map(|p| p.replace(",,", ","))
            .collect(),
    )
}

/// Replace the protocol options segment (`url|opts`) of a player URL.
pub fn with_protocol_options(url: &str, options: &str) -> String {
    let base = url.split('|').next().unwrap_or(url);
    if options.is_empty() {
        base.to_string()
    } else {
        format!("{base}|{options}")
    }
}

/// Percent-encode an option value.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
