//! In-process [`IdentityStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use scribe_core::channel::Channel;
use scribe_core::types::TaskId;
use tokio::sync::RwLock;

use crate::{IdentityStore, StoreError};

/// Identity store held in memory. Entries are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Channel, TaskId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get(&self, channel: &Channel) -> Result<Option<TaskId>, StoreError> {
        Ok(self.entries.read().await.get(channel).cloned())
    }

    async fn set(&self, channel: &Channel, task_id: Option<&TaskId>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        match task_id {
            Some(task_id) => {
                entries.insert(channel.clone(), task_id.clone());
            }
            None => {
                entries.remove(channel);
            }
        }
        Ok(())
    }

    async fn clear_if(&self, channel: &Channel, expected: &TaskId) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        if entries.get(channel) == Some(expected) {
            entries.remove(channel);
            return Ok(true);
        }
        Ok(false)
    }

    async fn entries(&self) -> Result<Vec<(Channel, TaskId)>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .map(|(channel, task_id)| (channel.clone(), task_id.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> TaskId {
        TaskId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn absent_channel_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get(&Channel::transcription()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites_and_none_removes() {
        let store = MemoryStore::new();
        let channel = Channel::transcription();

        store.set(&channel, Some(&id("a"))).await.unwrap();
        store.set(&channel, Some(&id("b"))).await.unwrap();
        assert_eq!(store.get(&channel).await.unwrap(), Some(id("b")));

        store.set(&channel, None).await.unwrap();
        assert_eq!(store.get(&channel).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_if_only_removes_matching_id() {
        let store = MemoryStore::new();
        let channel = Channel::diarization();
        store.set(&channel, Some(&id("new"))).await.unwrap();

        assert!(!store.clear_if(&channel, &id("old")).await.unwrap());
        assert_eq!(store.get(&channel).await.unwrap(), Some(id("new")));

        assert!(store.clear_if(&channel, &id("new")).await.unwrap());
        assert_eq!(store.get(&channel).await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_are_sorted_by_channel() {
        let store = MemoryStore::new();
        store
            .set(&Channel::transcription(), Some(&id("t")))
            .await
            .unwrap();
        store
            .set(&Channel::diarization(), Some(&id("d")))
            .await
            .unwrap();

        let entries = store.entries().await.unwrap();
        assert_eq!(
            entries,
            vec![
                (Channel::diarization(), id("d")),
                (Channel::transcription(), id("t")),
            ]
        );
    }
}
