use tokio::io::AsyncReadExt;

use super::*;

#[tokio::test]
async fn test_open_streams_object_body() {
    let store = MemoryObjectStore::new();
    store.put("bucket", "uploaded/a.csv", "name,price\n").await;

    let mut reader = store.open("bucket", "uploaded/a.csv").await.unwrap();
    let mut body = String::new();
    reader.read_to_string(&mut body).await.unwrap();

    assert_eq!(body, "name,price\n");
}

#[tokio::test]
async fn test_open_missing_object() {
    let store = MemoryObjectStore::new();
    let result = store.open("bucket", "uploaded/missing.csv").await;
    assert!(matches!(result, Err(ObjectStoreError::NotFound { .. })));
}

#[tokio::test]
async fn test_move_object_relocates() {
    let store = MemoryObjectStore::new();
    store.put("bucket", "uploaded/a.csv", "data").await;

    move_object(&store, "bucket", "uploaded/a.csv", "parsed/a.csv")
        .await
        .unwrap();

    assert_eq!(store.keys("bucket").await, vec!["parsed/a.csv".to_string()]);
}

#[tokio::test]
async fn test_move_object_overwrites_existing_destination() {
    let store = MemoryObjectStore::new();
    store.put("bucket", "uploaded/a.csv", "new").await;
    store.put("bucket", "parsed/a.csv", "stale").await;

    move_object(&store, "bucket", "uploaded/a.csv", "parsed/a.csv")
        .await
        .unwrap();

    assert_eq!(
        store.get("bucket", "parsed/a.csv").await.unwrap(),
        bytes::Bytes::from("new")
    );
    assert!(!store.exists("bucket", "uploaded/a.csv").await.unwrap());
}

#[tokio::test]
async fn test_move_object_retries_until_source_gone() {
    let store = MemoryObjectStore::new();
    store.put("bucket", "uploaded/a.csv", "data").await;
    store.ignore_next_deletes(2).await;

    move_object(&store, "bucket", "uploaded/a.csv", "parsed/a.csv")
        .await
        .unwrap();

    assert_eq!(store.delete_calls().await, 3);
    assert!(!store.exists("bucket", "uploaded/a.csv").await.unwrap());
}

#[tokio::test]
async fn test_move_object_gives_up_when_delete_never_lands() {
    let store = MemoryObjectStore::new();
    store.put("bucket", "uploaded/a.csv", "data").await;
    store.ignore_next_deletes(100).await;

    let result = move_object(&store, "bucket", "uploaded/a.csv", "parsed/a.csv").await;

    assert!(matches!(result, Err(ObjectStoreError::MoveIncomplete { .. })));
    // Initial attempt plus three retries.
    assert_eq!(store.delete_calls().await, 4);
    // The copy already landed; a rerun can finish the move.
    assert!(store.exists("bucket", "parsed/a.csv").await.unwrap());
}

#[tokio::test]
async fn test_move_object_copy_failure_leaves_source() {
    let store = MemoryObjectStore::new();
    store.put("bucket", "uploaded/a.csv", "data").await;
    store.set_fail_on_copy(true).await;

    let result = move_object(&store, "bucket", "uploaded/a.csv", "parsed/a.csv").await;

    assert!(matches!(result, Err(ObjectStoreError::CopyFailed(_))));
    assert_eq!(store.keys("bucket").await, vec!["uploaded/a.csv".to_string()]);
    assert_eq!(store.delete_calls().await, 0);
}
