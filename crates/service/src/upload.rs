//! The upload pipeline: validate, derive, store file, write record.
//!
//! The two store writes form a small saga with no compensating rollback.
//! The file goes in first, namespaced by the token, so a failure between the
//! two steps leaves an orphaned-but-harmless object rather than a record
//! claiming a file that was never stored. Orphans are reconcilable by an
//! out-of-band sweep.

use std::collections::BTreeMap;
use std::sync::Arc;

use veriport_core::{
    derive_verification_status, FilePayload, FileRejection, ReportDraft, ValidationError,
    VerificationToken, DEFAULT_MAX_FILE_BYTES,
};
use veriport_storage::{FileStore, FileStoreError, NewReportRecord, ReportStore, StorageError};

/// A failed submission. Validation and file-policy failures occur before any
/// store interaction; a store failure after the file write is reported here
/// and the orphaned object is logged.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    File(#[from] FileRejection),

    #[error(transparent)]
    FileStore(#[from] FileStoreError),

    #[error(transparent)]
    Store(#[from] StorageError),
}

/// What a successful submission hands back to the caller.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub token: VerificationToken,
    pub record_key: String,
    pub file_ref: String,
    pub file_url: String,
}

/// Validates and persists incoming report submissions.
pub struct UploadPipeline {
    store: Arc<dyn ReportStore>,
    files: Arc<dyn FileStore>,
    max_file_bytes: usize,
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn ReportStore>, files: Arc<dyn FileStore>) -> Self {
        UploadPipeline {
            store,
            files,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Submit a draft with its file payload.
    ///
    /// Not idempotent by design: resubmitting identical form data creates a
    /// new record with a new token, so every physical submission event is
    /// independently auditable.
    pub async fn submit(
        &self,
        draft: &ReportDraft,
        file: Option<FilePayload>,
    ) -> Result<UploadReceipt, UploadError> {
        draft.validate(file.as_ref())?;
        let Some(file) = file else {
            // validate() rejects a missing file; this arm keeps the type
            // system honest without an unwrap.
            let mut fields = BTreeMap::new();
            fields.insert(
                "reportFile".to_string(),
                vec!["A report file is required.".to_string()],
            );
            return Err(ValidationError { fields }.into());
        };
        file.check_policy(self.max_file_bytes)?;

        let verification_status = derive_verification_status(&draft.status);
        let token = VerificationToken::generate();

        // Files live under a token-scoped namespace so they are groupable
        // per record and a failed record write strands nothing ambiguous.
        let namespace = format!("reports/{}/{}", token, sanitize_filename(&file.filename));
        let stored = self
            .files
            .store(&namespace, file.bytes, &file.media_type)
            .await?;

        let insert = self
            .store
            .insert(NewReportRecord {
                student_id: draft.student_id.clone(),
                student_name: draft.student_name.clone(),
                class: draft.class.clone(),
                year: draft.year,
                status: draft.status.clone(),
                verification_status: verification_status.as_str().to_string(),
                verification_token: token.as_str().to_string(),
                file_ref: Some(stored.object_ref.clone()),
                file_url: Some(stored.public_url.clone()),
            })
            .await;

        let record_key = match insert {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(
                    object_ref = %stored.object_ref,
                    error = %e,
                    "record insert failed after file store; object is orphaned"
                );
                return Err(e.into());
            }
        };

        Ok(UploadReceipt {
            token,
            record_key,
            file_ref: stored.object_ref,
            file_url: stored.public_url,
        })
    }
}

/// Strip anything path-like from a client-supplied filename.
fn sanitize_filename(raw: &str) -> String {
    if raw.is_empty() || raw.contains('/') || raw.contains('\\') || raw.contains("..") {
        return "report".to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("card.pdf"), "card.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "report");
        assert_eq!(sanitize_filename("a/b.pdf"), "report");
        assert_eq!(sanitize_filename(""), "report");
    }
}
