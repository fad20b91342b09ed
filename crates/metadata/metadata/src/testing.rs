use chrono::{DateTime, Duration, Utc};

use cairn_core::{ContentType, NewUpload, UploadId};

use crate::error::MetadataError;
use crate::store::{InsertOutcome, MetadataStore};

fn id(value: &str) -> UploadId {
    UploadId::parse(value).expect("conformance ids are valid")
}

fn new_upload(upload_id: &str, content_type: &str, created_at: DateTime<Utc>) -> NewUpload {
    NewUpload {
        upload_id: id(upload_id),
        content_type: ContentType::parse(content_type).expect("conformance types are valid"),
        created_at,
    }
}

/// Run the full metadata store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if the backend fails an operation. Contract violations
/// panic with a description of the failed expectation.
pub async fn run_store_conformance_tests(store: &dyn MetadataStore) -> Result<(), MetadataError> {
    test_find_missing(store).await?;
    test_insert_and_find(store).await?;
    test_insert_duplicate(store).await?;
    test_delete(store).await?;
    test_count(store).await?;
    test_list_newest_first(store).await?;
    test_list_past_end(store).await?;
    Ok(())
}

async fn test_find_missing(store: &dyn MetadataStore) -> Result<(), MetadataError> {
    let found = store.find_by_id(&id("never-seen")).await?;
    assert!(found.is_none(), "find on missing id should return None");
    Ok(())
}

async fn test_insert_and_find(store: &dyn MetadataStore) -> Result<(), MetadataError> {
    let upload = new_upload("insert-find", "image/png", Utc::now());
    let outcome = store.insert(upload.clone()).await?;
    let InsertOutcome::Inserted(record) = outcome else {
        panic!("insert of a new id should report Inserted");
    };
    assert_eq!(record.upload_id, upload.upload_id);
    assert_eq!(record.content_type, upload.content_type);

    let found = store
        .find_by_id(&upload.upload_id)
        .await?
        .expect("inserted record should be found");
    assert_eq!(found.pk, record.pk, "surrogate key should be stable");
    assert_eq!(found.content_type.as_str(), "image/png");
    Ok(())
}

async fn test_insert_duplicate(store: &dyn MetadataStore) -> Result<(), MetadataError> {
    let first = new_upload("duplicate", "image/png", Utc::now());
    let second = new_upload("duplicate", "image/jpeg", Utc::now());

    let outcome = store.insert(first).await?;
    assert!(matches!(outcome, InsertOutcome::Inserted(_)));

    let outcome = store.insert(second).await?;
    assert_eq!(
        outcome,
        InsertOutcome::DuplicateKey,
        "second insert of the same id should report DuplicateKey"
    );

    let found = store.find_by_id(&id("duplicate")).await?;
    assert_eq!(
        found.map(|r| r.content_type.into_inner()).as_deref(),
        Some("image/png"),
        "original record should remain"
    );
    Ok(())
}

async fn test_delete(store: &dyn MetadataStore) -> Result<(), MetadataError> {
    let upload = new_upload("to-delete", "image/gif", Utc::now());
    store.insert(upload).await?;

    let existed = store.delete(&id("to-delete")).await?;
    assert!(existed, "delete should return true for existing id");
    assert!(store.find_by_id(&id("to-delete")).await?.is_none());

    let existed = store.delete(&id("to-delete")).await?;
    assert!(!existed, "delete on missing id should return false");

    // The id is free again once deleted.
    let outcome = store
        .insert(new_upload("to-delete", "image/gif", Utc::now()))
        .await?;
    assert!(matches!(outcome, InsertOutcome::Inserted(_)));
    Ok(())
}

async fn test_count(store: &dyn MetadataStore) -> Result<(), MetadataError> {
    let before = store.count().await?;
    store
        .insert(new_upload("counted", "image/png", Utc::now()))
        .await?;
    store
        .insert(new_upload("counted", "image/png", Utc::now()))
        .await?;
    assert_eq!(store.count().await?, before + 1, "duplicates are not counted");
    Ok(())
}

async fn test_list_newest_first(store: &dyn MetadataStore) -> Result<(), MetadataError> {
    // Far enough in the future to sort ahead of everything inserted above.
    let base = Utc::now() + Duration::days(1000);
    let ids = ["order-a", "order-b", "order-c", "order-d", "order-e"];
    let offsets = [0, 1, 2, 3, 3];
    for (upload_id, secs) in ids.iter().zip(offsets) {
        store
            .insert(new_upload(upload_id, "image/png", base + Duration::seconds(secs)))
            .await?;
    }

    let listed = store.list_ordered(0, 5).await?;
    let listed: Vec<&str> = listed.iter().map(UploadId::as_str).collect();
    assert_eq!(
        listed,
        ["order-e", "order-d", "order-c", "order-b", "order-a"],
        "newest first, ties broken by insertion order"
    );

    let page = store.list_ordered(1, 2).await?;
    let page: Vec<&str> = page.iter().map(UploadId::as_str).collect();
    assert_eq!(page, ["order-d", "order-c"]);
    Ok(())
}

async fn test_list_past_end(store: &dyn MetadataStore) -> Result<(), MetadataError> {
    let total = store.count().await?;
    let page = store.list_ordered(total, 10).await?;
    assert!(page.is_empty(), "offset past the end yields an empty page");

    let page = store.list_ordered(0, 0).await?;
    assert!(page.is_empty(), "zero limit yields an empty page");
    Ok(())
}
