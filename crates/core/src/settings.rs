use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::SettingsError;

/// Key under which the most recently active play queue is remembered.
pub const MOST_RECENT_PLAY_QUEUE: &str = "system.mostrecentplayqueue";

/// Persistent key/value settings the client core reads and writes.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Settings kept in memory only; used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_settings_roundtrip() {
        let store = MemorySettings::new();
        assert_eq!(store.get(MOST_RECENT_PLAY_QUEUE).await.unwrap(), None);
        store
            .set(MOST_RECENT_PLAY_QUEUE, "plexserver://abc/playQueues/12")
            .await
            .unwrap();
        assert_eq!(
            store.get(MOST_RECENT_PLAY_QUEUE).await.unwrap().as_deref(),
            Some("plexserver://abc/playQueues/12")
        );
    }
}
