use serde::Serialize;

use rustplex_core::{ContentItem, ContentList, MediaKind};

use crate::reconcile::EditableQueue;

/// A queued item and the key it is diffed by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayQueueItem {
    pub key: String,
    pub item: ContentItem,
}

impl PlayQueueItem {
    /// Keyed by the item's source key, or its path when it was never listed.
    pub fn new(item: ContentItem) -> Self {
        let key = item
            .unprocessed_key
            .clone()
            .unwrap_or_else(|| item.path.clone());
        Self { key, item }
    }
}

/// Ordered items scheduled for playback.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayQueue {
    /// Server-side id; local queues have none.
    pub id: Option<u64>,
    /// UUID of the server the queue lives on.
    pub server: Option<String>,
    pub kind: MediaKind,
    pub selected_offset: usize,
    items: Vec<PlayQueueItem>,
}

impl PlayQueue {
    pub fn from_list(list: &ContentList, server: Option<String>) -> Self {
        let items: Vec<PlayQueueItem> = list.iter().cloned().map(PlayQueueItem::new).collect();
        let kind = items
            .iter()
            .map(|i| i.item.kind)
            .find(|k| k.is_playable())
            .unwrap_or_default();
        Self {
            id: list.play_queue_id,
            server,
            kind,
            selected_offset: list.play_queue_selected_offset.unwrap_or(0),
            items,
        }
    }

    pub fn items(&self) -> &[PlayQueueItem] {
        &self.items
    }

    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected(&self) -> Option<&PlayQueueItem> {
        self.items.get(self.selected_offset)
    }
}

impl EditableQueue for PlayQueue {
    fn key_at(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|i| i.key.as_str())
    }

    // Edits keep `selected_offset` on the same item where it survives.
    fn remove(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
            if index < self.selected_offset {
                self.selected_offset -= 1;
            }
        }
    }

    fn insert(&mut self, index: usize, item: PlayQueueItem) {
        let index = index.min(self.items.len());
        let has_selection = self.selected_offset < self.items.len();
        self.items.insert(index, item);
        if has_selection && index <= self.selected_offset {
            self.selected_offset += 1;
        }
    }
}
