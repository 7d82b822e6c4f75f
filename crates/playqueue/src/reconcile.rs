//! Merging a refetched remote queue into the live local one.

use tracing::debug;

use crate::queue::PlayQueueItem;

/// The edits reconciliation needs from a live queue.
pub trait EditableQueue {
    /// Key at `index`, `None` past the end.
    fn key_at(&self, index: usize) -> Option<&str>;
    fn remove(&mut self, index: usize);
    fn insert(&mut self, index: usize, item: PlayQueueItem);
}

/// Bring `local` in line with `remote` with as few edits as the common case
/// needs: local items before the first shared key and items that diverge are
/// removed, remote items past the local end are inserted. Trailing local-only
/// items are left alone.
///
/// Keys must be unique and stable across fetches. Returns whether `local`
/// changed.
pub fn reconcile<Q: EditableQueue + ?Sized>(local: &mut Q, remote: &[PlayQueueItem]) -> bool {
    let mut first_common = false;
    let mut local_cursor = 0;
    let mut remote_cursor = 0;
    let mut changed = false;

    while let Some(incoming) = remote.get(remote_cursor) {
        let local_key = local
            .key_at(local_cursor)
            .filter(|k| !k.is_empty())
            .map(str::to_owned);

        match local_key {
            Some(key) if !first_common => {
                if key == incoming.key {
                    first_common = true;
                    remote_cursor += 1;
                } else {
                    debug!(index = local_cursor, key = %key, "dropping item before first common");
                    local.remove(local_cursor);
                    changed = true;
                    continue;
                }
            }
            None => {
                debug!(index = local_cursor, key = %incoming.key, "adding item");
                local.insert(local_cursor, incoming.clone());
                changed = true;
                remote_cursor += 1;
            }
            Some(key) if key == incoming.key => {
                remote_cursor += 1;
            }
            Some(key) => {
                debug!(index = local_cursor, key = %key, "dropping diverged item");
                local.remove(local_cursor);
                changed = true;
                continue;
            }
        }

        local_cursor += 1;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustplex_core::{ContentItem, MediaKind};

    #[derive(Debug, Default, PartialEq)]
    struct Keys(Vec<PlayQueueItem>);

    impl EditableQueue for Keys {
        fn key_at(&self, index: usize) -> Option<&str> {
            self.0.get(index).map(|i| i.key.as_str())
        }

        fn remove(&mut self, index: usize) {
            self.0.remove(index);
        }

        fn insert(&mut self, index: usize, item: PlayQueueItem) {
            self.0.insert(index, item);
        }
    }

    fn items(keys: &[&str]) -> Vec<PlayQueueItem> {
        keys.iter()
            .map(|k| {
                let mut item = ContentItem::new(format!("plexserver://abc{k}"), *k, MediaKind::Video);
                item.unprocessed_key = Some(k.to_string());
                PlayQueueItem::new(item)
            })
            .collect()
    }

    fn keys(queue: &Keys) -> Vec<&str> {
        queue.0.iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn converges_on_small_delta() {
        let mut local = Keys(items(&["a", "b", "c"]));
        assert!(reconcile(&mut local, &items(&["a", "c", "d"])));
        assert_eq!(keys(&local), vec!["a", "c", "d"]);
    }

    #[test]
    fn identical_queues_are_untouched() {
        let mut local = Keys(items(&["a", "b", "c"]));
        let before = Keys(items(&["a", "b", "c"]));
        assert!(!reconcile(&mut local, &items(&["a", "b", "c"])));
        assert_eq!(local, before);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let remote = items(&["b", "c", "e", "f"]);
        let mut local = Keys(items(&["a", "b", "c", "d"]));
        assert!(reconcile(&mut local, &remote));
        assert_eq!(keys(&local), vec!["b", "c", "e", "f"]);
        assert!(!reconcile(&mut local, &remote));
    }

    #[test]
    fn empty_local_takes_everything() {
        let mut local = Keys::default();
        assert!(reconcile(&mut local, &items(&["x", "y"])));
        assert_eq!(keys(&local), vec!["x", "y"]);
    }

    #[test]
    fn empty_remote_changes_nothing() {
        let mut local = Keys(items(&["a"]));
        assert!(!reconcile(&mut local, &[]));
        assert_eq!(keys(&local), vec!["a"]);
    }

    #[test]
    fn trailing_local_items_are_kept() {
        let mut local = Keys(items(&["a", "b", "c"]));
        assert!(!reconcile(&mut local, &items(&["a", "b"])));
        assert_eq!(keys(&local), vec!["a", "b", "c"]);
    }

    #[test]
    fn leading_items_removed_until_common() {
        let mut local = Keys(items(&["old1", "old2", "a", "b"]));
        assert!(reconcile(&mut local, &items(&["a", "b", "c"])));
        assert_eq!(keys(&local), vec!["a", "b", "c"]);
    }
}
