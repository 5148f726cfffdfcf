/// All errors that can be returned by a ReportStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No record with the given key.
    #[error("report not found: {key}")]
    NotFound { key: String },

    /// A backend-specific storage error (transport, permissions, encoding).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// All errors that can be returned by a FileStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    /// A backend-specific content-store error (transport, permissions).
    #[error("file store backend error: {0}")]
    Backend(String),
}
