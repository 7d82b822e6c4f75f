use rustplex_core::{ContentItem, url};

/// Protocol options for the player: explicit transport headers win,
/// otherwise a cookie and user agent pair.
pub fn protocol_options(item: &ContentItem) -> Option<String> {
    if let Some(headers) = item.http_headers.as_deref().filter(|h| !h.is_empty()) {
        return Some(headers.to_string());
    }

    let mut options = Vec::new();
    if let Some(cookies) = &item.http_cookies {
        options.push(format!("Cookie={}", url::encode(cookies)));
    }
    if let Some(agent) = &item.user_agent {
        options.push(format!("User-Agent={}", url::encode(agent)));
    }
    (!options.is_empty()).then(|| options.join("&"))
}

/// Attach the item's protocol options to its path.
pub fn inject(item: &mut ContentItem) {
    if let Some(options) = protocol_options(item) {
        item.path = url::with_protocol_options(&item.path, &options);
    }
}
