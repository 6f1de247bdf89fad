use bytes::Bytes;
use quillhub::infra::media::{MediaError, MediaStorage};
use tempfile::TempDir;

const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

fn storage() -> (TempDir, MediaStorage) {
    let dir = TempDir::new().expect("temp dir");
    let storage = MediaStorage::new(dir.path().to_path_buf()).expect("media storage");
    (dir, storage)
}

#[tokio::test]
async fn stores_gif_under_posts_directory() {
    let (dir, storage) = storage();

    let stored = storage
        .store("small.gif", Bytes::from_static(SMALL_GIF))
        .await
        .expect("store gif");

    assert_eq!(stored.reference, "posts/small.gif");
    assert_eq!((stored.width, stored.height), (2, 1));
    assert_eq!(stored.size_bytes, SMALL_GIF.len() as u64);
    assert_eq!(stored.checksum.len(), 64);
    assert!(dir.path().join("posts/small.gif").is_file());

    let read_back = storage.read(&stored.reference).await.expect("read back");
    assert_eq!(read_back.as_ref(), SMALL_GIF);
}

#[tokio::test]
async fn name_collisions_get_a_suffix() {
    let (_dir, storage) = storage();

    let first = storage
        .store("small.gif", Bytes::from_static(SMALL_GIF))
        .await
        .expect("first");
    let second = storage
        .store("small.gif", Bytes::from_static(SMALL_GIF))
        .await
        .expect("second");

    assert_ne!(first.reference, second.reference);
    assert!(second.reference.starts_with("posts/small_"));
    assert!(second.reference.ends_with(".gif"));
    assert_eq!(first.checksum, second.checksum);
}

#[tokio::test]
async fn rejects_non_images() {
    let (_dir, storage) = storage();

    let err = storage
        .store("notes.txt", Bytes::from_static(b"plain text"))
        .await
        .expect_err("text file");
    assert!(matches!(err, MediaError::UnsupportedType { .. }));

    let err = storage
        .store("fake.png", Bytes::from_static(b"definitely not a png"))
        .await
        .expect_err("bogus bytes");
    assert!(matches!(err, MediaError::NotAnImage { .. }));

    let err = storage
        .store("empty.gif", Bytes::new())
        .await
        .expect_err("empty payload");
    assert!(matches!(err, MediaError::EmptyPayload));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (dir, storage) = storage();
    let stored = storage
        .store("small.gif", Bytes::from_static(SMALL_GIF))
        .await
        .expect("store");

    storage.delete(&stored.reference).await.expect("delete");
    assert!(!dir.path().join(&stored.reference).exists());
    storage
        .delete(&stored.reference)
        .await
        .expect("second delete is a no-op");
}
