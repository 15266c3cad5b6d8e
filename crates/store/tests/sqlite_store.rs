//! Integration tests for the SQLite-backed identity store.
//!
//! Each test opens a fresh database file in a temporary directory, so
//! reopening the same path exercises durability across runs.

use scribe_core::channel::Channel;
use scribe_core::types::TaskId;
use scribe_store::{IdentityStore, SqliteStore};

fn id(raw: &str) -> TaskId {
    TaskId::new(raw).unwrap()
}

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("scribe.db").display())
}

// ---------------------------------------------------------------------------
// Test: basic get/set semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn absent_channel_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&database_url(&dir)).await.unwrap();

    assert_eq!(store.get(&Channel::transcription()).await.unwrap(), None);
}

#[tokio::test]
async fn set_then_get_returns_task_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&database_url(&dir)).await.unwrap();
    let channel = Channel::transcription();

    store.set(&channel, Some(&id("abc"))).await.unwrap();

    assert_eq!(store.get(&channel).await.unwrap(), Some(id("abc")));
}

#[tokio::test]
async fn second_set_overwrites_previous_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&database_url(&dir)).await.unwrap();
    let channel = Channel::diarization();

    store.set(&channel, Some(&id("first"))).await.unwrap();
    store.set(&channel, Some(&id("second"))).await.unwrap();

    assert_eq!(store.get(&channel).await.unwrap(), Some(id("second")));
    assert_eq!(store.entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn setting_none_removes_entry() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&database_url(&dir)).await.unwrap();
    let channel = Channel::transcription();

    store.set(&channel, Some(&id("abc"))).await.unwrap();
    store.set(&channel, None).await.unwrap();

    assert_eq!(store.get(&channel).await.unwrap(), None);
    // Removing an absent entry is also fine.
    store.set(&channel, None).await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: compare-and-clear
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clear_if_leaves_newer_id_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&database_url(&dir)).await.unwrap();
    let channel = Channel::model_install("nllb").unwrap();

    store.set(&channel, Some(&id("newer"))).await.unwrap();

    assert!(!store.clear_if(&channel, &id("older")).await.unwrap());
    assert_eq!(store.get(&channel).await.unwrap(), Some(id("newer")));

    assert!(store.clear_if(&channel, &id("newer")).await.unwrap());
    assert_eq!(store.get(&channel).await.unwrap(), None);
}

// ---------------------------------------------------------------------------
// Test: durability across reopen
// ---------------------------------------------------------------------------

#[tokio::test]
async fn entries_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let url = database_url(&dir);

    {
        let store = SqliteStore::open(&url).await.unwrap();
        store
            .set(&Channel::transcription(), Some(&id("abc")))
            .await
            .unwrap();
        store
            .set(&Channel::translation_download("opus").unwrap(), Some(&id("xyz")))
            .await
            .unwrap();
        store.close().await;
    }

    let reopened = SqliteStore::open(&url).await.unwrap();
    assert_eq!(
        reopened.get(&Channel::transcription()).await.unwrap(),
        Some(id("abc"))
    );
    assert_eq!(
        reopened.entries().await.unwrap(),
        vec![
            (Channel::transcription(), id("abc")),
            (Channel::translation_download("opus").unwrap(), id("xyz")),
        ]
    );
}

// ---------------------------------------------------------------------------
// Test: unreadable rows are discarded without affecting other channels
// ---------------------------------------------------------------------------

async fn insert_raw(store: &SqliteStore, storage_key: &str, channel: &str, task_id: &str) {
    sqlx::query(
        "INSERT INTO task_identities (storage_key, channel, task_id, updated_at) \
         VALUES (?1, ?2, ?3, '2026-01-01T00:00:00Z')",
    )
    .bind(storage_key)
    .bind(channel)
    .bind(task_id)
    .execute(store.pool())
    .await
    .unwrap();
}

async fn row_count(store: &SqliteStore) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM task_identities")
        .fetch_one(store.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn invalid_channel_row_is_skipped_and_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&database_url(&dir)).await.unwrap();

    store
        .set(&Channel::transcription(), Some(&id("abc")))
        .await
        .unwrap();
    insert_raw(&store, "task_bad name", "bad name", "zzz").await;

    assert_eq!(
        store.entries().await.unwrap(),
        vec![(Channel::transcription(), id("abc"))]
    );
    assert_eq!(row_count(&store).await, 1);
}

#[tokio::test]
async fn blank_task_id_row_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&database_url(&dir)).await.unwrap();
    let channel = Channel::diarization();

    insert_raw(&store, &channel.storage_key(), channel.as_str(), "  ").await;

    assert_eq!(store.get(&channel).await.unwrap(), None);
    assert_eq!(row_count(&store).await, 0);

    store.set(&channel, Some(&id("fresh"))).await.unwrap();
    assert_eq!(store.get(&channel).await.unwrap(), Some(id("fresh")));
}
