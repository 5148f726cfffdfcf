//! Authorized record mutation: sparse update and cascading delete.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use veriport_core::{
    derive_verification_status, OutcomeStatus, ValidationError, VerificationStatus,
    MIN_ACADEMIC_YEAR,
};
use veriport_storage::{FileStore, ReportStore, ReportUpdate, StorageError};

/// A failed update or delete.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("report not found: {key}")]
    NotFound { key: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(StorageError),
}

impl From<StorageError> for MutationError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { key } => MutationError::NotFound { key },
            other => MutationError::Store(other),
        }
    }
}

/// A sparse patch over the mutable record fields, as received on the wire.
///
/// Double-option on `year`: the outer level is "field present in the
/// request", the inner is the value (null clears the year).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportPatch {
    #[serde(rename = "studentName")]
    pub student_name: Option<String>,
    pub class: Option<String>,
    #[serde(default, with = "double_option")]
    pub year: Option<Option<i32>>,
    pub status: Option<String>,
    #[serde(rename = "verificationStatus")]
    pub verification_status: Option<String>,
}

/// Deserialize a JSON field that distinguishes absent from null.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<i32>::deserialize(deserializer).map(Some)
    }
}

impl ReportPatch {
    /// Check the patched values against the same rules the upload pipeline
    /// enforces. Fields absent from the patch are not checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();

        if let Some(Some(year)) = self.year {
            if year < MIN_ACADEMIC_YEAR {
                fields
                    .entry("year".to_string())
                    .or_default()
                    .push("Invalid year.".to_string());
            }
        }
        if let Some(status) = &self.status {
            if OutcomeStatus::parse(status).is_none() {
                fields
                    .entry("status".to_string())
                    .or_default()
                    .push("Unknown outcome status.".to_string());
            }
        }
        if let Some(vs) = &self.verification_status {
            if VerificationStatus::parse(vs).is_none() {
                fields
                    .entry("verificationStatus".to_string())
                    .or_default()
                    .push("Unknown verification status.".to_string());
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }
}

/// Updates and deletes existing records.
pub struct MutationService {
    store: Arc<dyn ReportStore>,
    files: Arc<dyn FileStore>,
}

impl MutationService {
    pub fn new(store: Arc<dyn ReportStore>, files: Arc<dyn FileStore>) -> Self {
        MutationService { store, files }
    }

    /// Apply a sparse patch; only fields present in the request are written,
    /// plus a refreshed `updatedAt`.
    ///
    /// An explicit `verificationStatus` in the patch wins (administrative
    /// override). Otherwise, a changed outcome re-derives the verification
    /// status so it never goes stale.
    pub async fn update(&self, key: &str, patch: ReportPatch) -> Result<(), MutationError> {
        patch.validate()?;

        let mut changes = ReportUpdate {
            student_name: patch.student_name,
            class: patch.class,
            year: patch.year,
            status: patch.status,
            verification_status: patch.verification_status,
        };
        if changes.verification_status.is_none() {
            if let Some(status) = &changes.status {
                changes.verification_status =
                    Some(derive_verification_status(status).as_str().to_string());
            }
        }

        self.store.update(key, changes).await?;
        Ok(())
    }

    /// Delete the record, then best-effort release the custodied file.
    ///
    /// Metadata deletion is the primary contract: it is permanent,
    /// immediate, and never blocked or rolled back by content-store failure.
    /// A failed file release is logged and swallowed.
    pub async fn delete(&self, key: &str) -> Result<(), MutationError> {
        let record = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| MutationError::NotFound {
                key: key.to_string(),
            })?;

        self.store.delete(key).await?;

        if let Some(file_ref) = record.file_ref {
            if let Err(e) = self.files.delete(&file_ref).await {
                tracing::warn!(
                    key,
                    object_ref = %file_ref,
                    error = %e,
                    "file release failed after record deletion; object left orphaned"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_validation_rejects_bad_values() {
        let patch = ReportPatch {
            year: Some(Some(1999)),
            status: Some("Graduated".to_string()),
            verification_status: Some("valid".to_string()),
            ..Default::default()
        };
        let err = patch.validate().unwrap_err();
        assert!(err.fields.contains_key("year"));
        assert!(err.fields.contains_key("status"));
        assert!(err.fields.contains_key("verificationStatus"));
    }

    #[test]
    fn test_patch_validation_skips_absent_fields() {
        assert!(ReportPatch::default().validate().is_ok());
        let patch = ReportPatch {
            student_name: Some("Bob".to_string()),
            year: Some(None),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_patch_year_absent_vs_null() {
        let absent: ReportPatch = serde_json::from_str(r#"{"class":"9th Grade"}"#).unwrap();
        assert_eq!(absent.year, None);
        let null: ReportPatch = serde_json::from_str(r#"{"year":null}"#).unwrap();
        assert_eq!(null.year, Some(None));
        let set: ReportPatch = serde_json::from_str(r#"{"year":2025}"#).unwrap();
        assert_eq!(set.year, Some(Some(2025)));
    }
}
