use serde::{Deserialize, Serialize};

/// A report record as stored in the backend.
///
/// `status` holds the outcome status wire name as submitted; legacy records
/// predating the `verificationStatus` field sometimes carry the tri-state
/// literals here instead. Normalization of that overlap belongs to the
/// status model, not to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Store-assigned opaque key.
    #[serde(rename = "id")]
    pub key: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(rename = "studentName")]
    pub student_name: String,
    pub class: String,
    pub year: Option<i32>,
    pub status: String,
    /// "Valid" | "Pending" | "Invalid"; absent on legacy records.
    #[serde(rename = "verificationStatus")]
    pub verification_status: Option<String>,
    /// Globally unique, assigned once at creation, immutable.
    #[serde(rename = "verificationId")]
    pub verification_token: String,
    /// Content-store object reference; present once upload completes.
    #[serde(rename = "filePath")]
    pub file_ref: Option<String>,
    #[serde(rename = "fileUrl")]
    pub file_url: Option<String>,
    /// RFC 3339 timestamp string, store-assigned.
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// RFC 3339 timestamp string, refreshed on write.
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

/// The fields of a record to be created. Key and timestamps are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewReportRecord {
    pub student_id: String,
    pub student_name: String,
    pub class: String,
    pub year: Option<i32>,
    pub status: String,
    pub verification_status: String,
    pub verification_token: String,
    pub file_ref: Option<String>,
    pub file_url: Option<String>,
}

/// A sparse field-level update. Only `Some` fields are written; `updated_at`
/// is always refreshed. The verification token is deliberately absent: it is
/// immutable after creation.
#[derive(Debug, Clone, Default)]
pub struct ReportUpdate {
    pub student_name: Option<String>,
    pub class: Option<String>,
    /// `Some(None)` clears the year; `None` leaves it untouched.
    pub year: Option<Option<i32>>,
    pub status: Option<String>,
    pub verification_status: Option<String>,
}

impl ReportUpdate {
    /// True when the update would write no fields.
    pub fn is_empty(&self) -> bool {
        self.student_name.is_none()
            && self.class.is_none()
            && self.year.is_none()
            && self.status.is_none()
            && self.verification_status.is_none()
    }
}

/// The result of storing a file: an opaque object reference for later
/// deletion, plus the public URL the record advertises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub object_ref: String,
    pub public_url: String,
}
