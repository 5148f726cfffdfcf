//! In-memory backends.
//!
//! The default server substrate and the test double for both external
//! stores. Behavior matches the trait contracts exactly: store-assigned
//! keys, RFC 3339 timestamps, recency ordering, NotFound on missing keys,
//! and idempotent file deletion.

use std::collections::HashMap;

use async_trait::async_trait;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{FileStoreError, StorageError};
use crate::record::{NewReportRecord, ReportRecord, ReportUpdate, StoredFile};
use crate::traits::{FileStore, ReportStore};

fn now_rfc3339() -> Result<String, StorageError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| StorageError::Backend(format!("timestamp formatting: {e}")))
}

#[derive(Default)]
struct ReportStoreInner {
    records: HashMap<String, ReportRecord>,
    /// Keys in insertion order; recency queries walk this in reverse.
    order: Vec<String>,
    next_key: u64,
}

/// An in-memory `ReportStore` behind a tokio `RwLock`.
///
/// The token lookup is a scan; it stands in for the secondary index a real
/// document store would provide.
#[derive(Default)]
pub struct MemoryReportStore {
    inner: RwLock<ReportStoreInner>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn insert(&self, record: NewReportRecord) -> Result<String, StorageError> {
        let now = now_rfc3339()?;
        let mut inner = self.inner.write().await;
        inner.next_key += 1;
        let key = format!("{:08x}", inner.next_key);
        let stored = ReportRecord {
            key: key.clone(),
            student_id: record.student_id,
            student_name: record.student_name,
            class: record.class,
            year: record.year,
            status: record.status,
            verification_status: Some(record.verification_status),
            verification_token: record.verification_token,
            file_ref: record.file_ref,
            file_url: record.file_url,
            created_at: now.clone(),
            updated_at: now,
        };
        inner.records.insert(key.clone(), stored);
        inner.order.push(key.clone());
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<ReportRecord>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(key).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ReportRecord>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .values()
            .find(|r| r.verification_token == token)
            .cloned())
    }

    async fn update(&self, key: &str, changes: ReportUpdate) -> Result<(), StorageError> {
        let now = now_rfc3339()?;
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(key)
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })?;
        if let Some(student_name) = changes.student_name {
            record.student_name = student_name;
        }
        if let Some(class) = changes.class {
            record.class = class;
        }
        if let Some(year) = changes.year {
            record.year = year;
        }
        if let Some(status) = changes.status {
            record.status = status;
        }
        if let Some(verification_status) = changes.verification_status {
            record.verification_status = Some(verification_status);
        }
        record.updated_at = now;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if inner.records.remove(key).is_none() {
            return Err(StorageError::NotFound {
                key: key.to_string(),
            });
        }
        inner.order.retain(|k| k != key);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ReportRecord>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|k| inner.records.get(k).cloned())
            .collect())
    }

    async fn count_all(&self) -> Result<u64, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.records.len() as u64)
    }

    async fn count_pending(&self) -> Result<u64, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .values()
            .filter(|r| match &r.verification_status {
                Some(vs) => vs == "Pending",
                None => r.status == "Pending",
            })
            .count() as u64)
    }
}

struct StoredObject {
    bytes: Vec<u8>,
    media_type: String,
}

/// An in-memory `FileStore`. Object references are the namespace paths.
#[derive(Default)]
pub struct MemoryFileStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects. Test hook.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Whether an object exists under the given reference. Test hook.
    pub async fn contains(&self, object_ref: &str) -> bool {
        self.objects.read().await.contains_key(object_ref)
    }

    /// Size and declared media type of a stored object. Test hook.
    pub async fn object_info(&self, object_ref: &str) -> Option<(usize, String)> {
        self.objects
            .read()
            .await
            .get(object_ref)
            .map(|o| (o.bytes.len(), o.media_type.clone()))
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn store(
        &self,
        namespace: &str,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<StoredFile, FileStoreError> {
        let mut objects = self.objects.write().await;
        objects.insert(
            namespace.to_string(),
            StoredObject {
                bytes,
                media_type: media_type.to_string(),
            },
        );
        Ok(StoredFile {
            object_ref: namespace.to_string(),
            public_url: format!("memory://{namespace}"),
        })
    }

    async fn delete(&self, object_ref: &str) -> Result<(), FileStoreError> {
        // Absent objects delete successfully.
        self.objects.write().await.remove(object_ref);
        Ok(())
    }
}
