use bytes::Bytes;

use cairn_core::UploadId;

use crate::error::BlobError;
use crate::store::BlobStore;

fn key(value: &str) -> UploadId {
    UploadId::parse(value).expect("conformance keys are valid")
}

/// Run the full blob store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if the backend fails an operation. Contract violations
/// panic with a description of the failed expectation.
pub async fn run_store_conformance_tests(store: &dyn BlobStore) -> Result<(), BlobError> {
    test_get_missing(store).await?;
    test_put_and_get(store).await?;
    test_put_empty(store).await?;
    test_put_overwrite(store).await?;
    test_delete(store).await?;
    Ok(())
}

async fn test_get_missing(store: &dyn BlobStore) -> Result<(), BlobError> {
    let result = store.get(&key("missing")).await;
    assert!(
        matches!(result, Err(BlobError::NotFound(_))),
        "get on missing key should return NotFound"
    );
    Ok(())
}

async fn test_put_and_get(store: &dyn BlobStore) -> Result<(), BlobError> {
    let k = key("put-get");
    store.put(&k, Bytes::from_static(b"test_content")).await?;
    let data = store.get(&k).await?;
    assert_eq!(data.as_ref(), b"test_content");
    Ok(())
}

async fn test_put_empty(store: &dyn BlobStore) -> Result<(), BlobError> {
    let k = key("empty");
    store.put(&k, Bytes::new()).await?;
    let data = store.get(&k).await?;
    assert!(data.is_empty(), "empty content is stored, not treated as missing");
    Ok(())
}

async fn test_put_overwrite(store: &dyn BlobStore) -> Result<(), BlobError> {
    let k = key("overwrite");
    store.put(&k, Bytes::from_static(b"same bytes")).await?;
    store.put(&k, Bytes::from_static(b"same bytes")).await?;
    assert_eq!(store.get(&k).await?.as_ref(), b"same bytes");

    store.put(&k, Bytes::from_static(b"other")).await?;
    assert_eq!(store.get(&k).await?.as_ref(), b"other", "put replaces content");
    Ok(())
}

async fn test_delete(store: &dyn BlobStore) -> Result<(), BlobError> {
    let k = key("to-delete");
    store.put(&k, Bytes::from_static(b"bye")).await?;

    let existed = store.delete(&k).await?;
    assert!(existed, "delete should return true for existing key");
    assert!(matches!(store.get(&k).await, Err(BlobError::NotFound(_))));

    let existed = store.delete(&k).await?;
    assert!(!existed, "delete on missing key should return false");
    Ok(())
}
