use stashbox_backend::{DeleteStatus, Storage, StorageError};
use stashbox_core::CacheKey;
use stashbox_file::{FileStorage, FileStorageError};

fn storage(dir: &tempfile::TempDir) -> FileStorage {
    FileStorage::builder().path(dir.path()).build().unwrap()
}

#[tokio::test]
async fn test_write_read_roundtrip_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let key = CacheKey::new("weather", "berlin");
    let record = r#"{"data":{"t":12},"timestamp":1000}"#;

    storage(&dir).write(&key, record.to_string()).await.unwrap();

    let reopened = storage(&dir);
    assert_eq!(reopened.read(&key).await.unwrap().as_deref(), Some(record));
    assert!(reopened.namespace_path("weather").exists());
}

#[tokio::test]
async fn test_read_missing_namespace_and_key() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    assert_eq!(storage.read(&CacheKey::new("none", "k")).await.unwrap(), None);

    storage
        .write(&CacheKey::new("ns", "a"), "1".into())
        .await
        .unwrap();
    assert_eq!(storage.read(&CacheKey::new("ns", "b")).await.unwrap(), None);
}

#[tokio::test]
async fn test_remove_and_file_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);
    let key = CacheKey::new("ns", "a");

    storage.write(&key, "v".into()).await.unwrap();
    assert_eq!(storage.remove(&key).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(storage.remove(&key).await.unwrap(), DeleteStatus::Missing);
    assert!(!storage.namespace_path("ns").exists());
}

#[tokio::test]
async fn test_clear_is_namespace_scoped() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    storage.write(&CacheKey::new("alerts", "1"), "a".into()).await.unwrap();
    storage.write(&CacheKey::new("alerts", "2"), "b".into()).await.unwrap();
    storage.write(&CacheKey::new("weather", "1"), "c".into()).await.unwrap();

    assert_eq!(storage.clear("alerts").await.unwrap(), 2);
    assert_eq!(storage.clear("alerts").await.unwrap(), 0);
    assert_eq!(
        storage
            .read(&CacheKey::new("weather", "1"))
            .await
            .unwrap()
            .as_deref(),
        Some("c")
    );
}

#[tokio::test]
async fn test_namespaces_with_separators_stay_inside_dir() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);

    storage
        .write(&CacheKey::new("../escape", "k"), "v".into())
        .await
        .unwrap();

    let path = storage.namespace_path("../escape");
    assert_eq!(path.parent(), Some(dir.path()));
    assert!(path.exists());
}

#[tokio::test]
async fn test_corrupt_document_reads_fail_and_writes_recover() {
    let dir = tempfile::tempdir().unwrap();
    let storage = storage(&dir);
    std::fs::write(storage.namespace_path("ns"), b"not json").unwrap();

    let err = storage.read(&CacheKey::new("ns", "a")).await.unwrap_err();
    assert!(matches!(err, StorageError::FormatError(_)));

    storage
        .write(&CacheKey::new("ns", "a"), "v".into())
        .await
        .unwrap();
    assert_eq!(
        storage
            .read(&CacheKey::new("ns", "a"))
            .await
            .unwrap()
            .as_deref(),
        Some("v")
    );
}

#[test]
fn test_build_requires_path() {
    let err = FileStorage::builder().build().unwrap_err();
    assert!(matches!(err, FileStorageError::InvalidConfig(_)));
}

#[test]
fn test_build_rejects_file_path() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let err = FileStorage::builder().path(file.path()).build().unwrap_err();
    assert!(matches!(err, FileStorageError::InvalidConfig(_)));
}

#[test]
fn test_build_creates_directory_and_label() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let storage = FileStorage::builder()
        .path(&nested)
        .label("disk")
        .build()
        .unwrap();

    assert!(nested.is_dir());
    assert_eq!(storage.label().as_str(), "disk");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_instances_on_same_directory_keep_every_write() {
    let dir = tempfile::tempdir().unwrap();
    let first = storage(&dir);
    let second = storage(&dir);

    let writes = (0..50).map(|i| {
        let storage = if i % 2 == 0 { first.clone() } else { second.clone() };
        tokio::spawn(async move {
            storage
                .write(&CacheKey::new("ns", format!("key-{i}")), i.to_string())
                .await
        })
    });
    for result in futures::future::join_all(writes).await {
        result.unwrap().unwrap();
    }

    for i in 0..50 {
        let value = first.read(&CacheKey::new("ns", format!("key-{i}"))).await.unwrap();
        assert_eq!(value, Some(i.to_string()), "key-{i} lost");
    }
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("ns.json")]);
}
