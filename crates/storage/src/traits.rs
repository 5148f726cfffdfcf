use async_trait::async_trait;

use crate::error::{FileStoreError, StorageError};
use crate::record::{NewReportRecord, ReportRecord, ReportUpdate, StoredFile};

/// The record-store contract the verification core requires.
///
/// Implementations wrap a keyed, queryable document store. The only query
/// capability required beyond point lookups is an equality index on the
/// verification token field; if the backing technology lacks secondary
/// indexes, the implementation must maintain its own token-to-key mapping
/// with the same uniqueness guarantee.
///
/// There is no optimistic-concurrency contract: per-record updates are
/// last-write-wins, and token uniqueness is enforced by the entropy of the
/// token generator, not by a transactional check-then-insert.
///
/// Implementations must be `Send + Sync + 'static` to be shared as axum
/// application state and across async task boundaries.
#[async_trait]
pub trait ReportStore: Send + Sync + 'static {
    /// Insert a new record; the store assigns the key and timestamps.
    async fn insert(&self, record: NewReportRecord) -> Result<String, StorageError>;

    /// Point lookup by store key.
    async fn get(&self, key: &str) -> Result<Option<ReportRecord>, StorageError>;

    /// Unique-index lookup by verification token.
    async fn find_by_token(&self, token: &str) -> Result<Option<ReportRecord>, StorageError>;

    /// Apply a sparse update and refresh `updated_at`.
    ///
    /// Returns `Err(StorageError::NotFound)` if the key is absent.
    async fn update(&self, key: &str, changes: ReportUpdate) -> Result<(), StorageError>;

    /// Delete the record.
    ///
    /// Returns `Err(StorageError::NotFound)` if the key is absent; a second
    /// delete of the same key fails rather than silently succeeding.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Most recently created records first, up to `limit`.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ReportRecord>, StorageError>;

    /// Total number of records.
    async fn count_all(&self) -> Result<u64, StorageError>;

    /// Records whose effective verification status is Pending: explicit
    /// `verificationStatus == "Pending"`, or the field absent with the
    /// legacy status field holding `"Pending"`.
    async fn count_pending(&self) -> Result<u64, StorageError>;
}

/// The content-store contract for custodied report files.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Store a file under the given namespace path.
    ///
    /// Callers validate size and media type before calling; the store only
    /// reports transport failures.
    async fn store(
        &self,
        namespace: &str,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<StoredFile, FileStoreError>;

    /// Delete a stored object by reference.
    ///
    /// Deleting an already-absent object succeeds (idempotent delete).
    async fn delete(&self, object_ref: &str) -> Result<(), FileStoreError>;
}
