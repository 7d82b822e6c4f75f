use serde::{Deserialize, Serialize};

/// Library grouping a section belongs to.
///
/// Declaration order matters: staleness thresholds treat every kind from
/// `Channels` onwards as a slow-moving grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Movie,
    Show,
    Album,
    Photo,
    Queue,
    Channels,
    GlobalArt,
}

impl SectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
            Self::Album => "album",
            Self::Photo => "photo",
            Self::Queue => "queue",
            Self::Channels => "channels",
            Self::GlobalArt => "global_art",
        }
    }

    /// Map a server directory type onto a section kind.
    ///
    /// Returns `None` for directory types that have no dedicated fanout; callers
    /// fall back to `Movie`.
    pub fn from_directory_type(dir_type: &str) -> Option<Self> {
        match dir_type {
            "movie" => Some(Self::Movie),
            "show" => Some(Self::Show),
            "album" | "artist" => Some(Self::Album),
            "photo" => Some(Self::Photo),
            "playlist" => Some(Self::Queue),
            _ => None,
        }
    }

    /// Seconds a section's lists stay fresh before a display triggers a refetch.
    pub fn staleness_secs(self) -> u64 {
        match self {
            Self::GlobalArt => 3600,
            Self::Album | Self::Queue => 20,
            k if k >= Self::Channels => 20,
            _ => 5,
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of list cached for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    RecentlyAdded,
    OnDeck,
    RecentlyAccessed,
    Queue,
    Fanart,
    Recommendations,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecentlyAdded => "recently_added",
            Self::OnDeck => "on_deck",
            Self::RecentlyAccessed => "recently_accessed",
            Self::Queue => "queue",
            Self::Fanart => "fanart",
            Self::Recommendations => "recommendations",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a content item is, as far as playback is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Photo,
    #[default]
    Directory,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Photo => "photo",
            Self::Directory => "directory",
        }
    }

    pub fn is_playable(self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
