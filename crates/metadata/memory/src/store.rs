use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;

use cairn_core::{NewUpload, UploadId, UploadRecord};
use cairn_metadata::error::MetadataError;
use cairn_metadata::store::{InsertOutcome, MetadataStore};

/// A stored record plus its insertion sequence, used to break timestamp ties.
#[derive(Debug, Clone)]
struct Entry {
    record: UploadRecord,
    seq: u64,
}

/// In-memory [`MetadataStore`] backed by a [`DashMap`].
///
/// Insert-if-absent goes through the map's entry API, which holds the shard
/// lock for the key, so it serializes concurrent inserts within one process.
/// It offers no cross-process guarantee; use it for tests and single-instance
/// development only.
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    data: DashMap<String, Entry>,
    next_seq: AtomicU64,
}

impl MemoryMetadataStore {
    /// Create a new, empty in-memory metadata store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, upload: NewUpload) -> Result<InsertOutcome, MetadataError> {
        match self.data.entry(upload.upload_id.as_str().to_owned()) {
            MapEntry::Occupied(_) => Ok(InsertOutcome::DuplicateKey),
            MapEntry::Vacant(vacant) => {
                let record = upload.into_record();
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                vacant.insert(Entry {
                    record: record.clone(),
                    seq,
                });
                Ok(InsertOutcome::Inserted(record))
            }
        }
    }

    async fn find_by_id(&self, upload_id: &UploadId) -> Result<Option<UploadRecord>, MetadataError> {
        Ok(self
            .data
            .get(upload_id.as_str())
            .map(|entry| entry.record.clone()))
    }

    async fn delete(&self, upload_id: &UploadId) -> Result<bool, MetadataError> {
        Ok(self.data.remove(upload_id.as_str()).is_some())
    }

    async fn list_ordered(&self, offset: u64, limit: u64) -> Result<Vec<UploadId>, MetadataError> {
        let mut entries: Vec<Entry> = self.data.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(entries
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|e| e.record.upload_id)
            .collect())
    }

    async fn count(&self) -> Result<u64, MetadataError> {
        Ok(self.data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use cairn_core::ContentType;
    use cairn_metadata::testing::run_store_conformance_tests;

    use super::*;

    fn upload(id: &str) -> NewUpload {
        NewUpload::now(
            UploadId::parse(id).unwrap(),
            ContentType::parse("image/png").unwrap(),
        )
    }

    #[tokio::test]
    async fn conformance() {
        let store = MemoryMetadataStore::new();
        run_store_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test]
    async fn same_timestamp_lists_latest_insert_first() {
        let store = MemoryMetadataStore::new();
        let at = chrono::Utc::now();
        for id in ["first", "second", "third"] {
            let mut u = upload(id);
            u.created_at = at;
            store.insert(u).await.unwrap();
        }
        let ids = store.list_ordered(0, 10).await.unwrap();
        let ids: Vec<&str> = ids.iter().map(UploadId::as_str).collect();
        assert_eq!(ids, ["third", "second", "first"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_have_one_winner() {
        let store = Arc::new(MemoryMetadataStore::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(
                async move { store.insert(upload("contended")).await },
            ));
        }

        let mut inserted = 0;
        for handle in handles {
            if let InsertOutcome::Inserted(_) = handle.await.unwrap().unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
