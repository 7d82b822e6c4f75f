use std::path::Path;

use rustplex_core::{ContentItem, MediaAlternative, MediaPart, url};

use crate::error::ResolveError;

/// Local-existence check for part files.
pub trait FileProbe: Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Checks the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileProbe for LocalFs {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}

/// Where the player reads one part from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartSource {
    /// A file reachable from this machine.
    Local(String),
    /// A raw streaming-protocol address.
    Raw(String),
    /// The part's own address, normally a stream from its server.
    Stream(String),
}

impl PartSource {
    pub fn url(&self) -> &str {
        match self {
            Self::Local(url) | Self::Raw(url) | Self::Stream(url) => url,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

/// Pick the address to open for one part.
///
/// Parts of servers on the local network prefer the file itself when it is
/// reachable from here, then a raw streaming key, then the server stream.
pub fn part_source(part: &MediaPart, probe: &dyn FileProbe) -> PartSource {
    let Some(file) = part.file.as_deref().filter(|_| !part.remote) else {
        return PartSource::Stream(part.path.clone());
    };
    if probe.exists(file) {
        return PartSource::Local(file.to_string());
    }
    match part.unprocessed_key.as_deref() {
        Some(key) if key.starts_with("rtmp") => PartSource::Raw(key.to_string()),
        _ => PartSource::Stream(part.path.clone()),
    }
}

/// One stacked path playing every source in order.
pub fn stack_url(sources: &[PartSource]) -> String {
    let urls: Vec<&str> = sources.iter().map(PartSource::url).collect();
    url::stack_path(&urls)
}

/// Split a resolved, stacked item into one player-ready item per part.
///
/// Items that are not stacked come back unchanged.
pub fn expand_stack(item: &ContentItem) -> Result<Vec<ContentItem>, ResolveError> {
    let Some(segments) = url::split_stack_path(&item.path) else {
        return Ok(vec![item.clone()]);
    };
    let alternative = item
        .selected_alternative()
        .ok_or(ResolveError::NoMediaAlternative)?;
    if alternative.parts.len() != segments.len() {
        return Err(ResolveError::NoMediaParts);
    }

    let items = segments
        .into_iter()
        .zip(&alternative.parts)
        .enumerate()
        .map(|(index, (segment, part))| {
            let mut stacked = item.clone();
            stacked.path = segment;
            stacked.synthesized = true;
            stacked.selected_media_item = Some(0);
            stacked.media = vec![MediaAlternative {
                parts: vec![part.clone()],
                ..alternative.clone()
            }];
            stacked.selected_part = Some(part.clone());
            stacked.set_property("partIndex", index);
            if let Some(duration) = part.duration_ms {
                stacked.set_property("duration", duration);
            }
            if let Some(file) = &part.file {
                stacked.set_property("file", file.as_str());
            }
            stacked
        })
        .collect();
    Ok(items)
}
