//! Submission drafts and validation.
//!
//! Field validation happens before any store interaction and reports a
//! field-level error map so the caller can surface specific, actionable
//! messages. The file acceptance policy (size and declared media type) is
//! checked separately so the pipeline can reject a bad file before touching
//! the content store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::OutcomeStatus;

/// Maximum accepted file size: 10 MiB.
pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Earliest plausible academic year. No upper bound is enforced.
pub const MIN_ACADEMIC_YEAR: i32 = 2000;

/// An incoming report submission, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDraft {
    #[serde(rename = "studentId")]
    pub student_id: String,
    #[serde(rename = "studentName")]
    pub student_name: String,
    pub class: String,
    pub year: Option<i32>,
    /// Outcome status wire name, e.g. "Passed".
    pub status: String,
}

/// The uploaded file payload accompanying a draft.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Malformed or missing submitted fields, keyed by wire field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid submission")]
pub struct ValidationError {
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    fn new() -> Self {
        ValidationError {
            fields: BTreeMap::new(),
        }
    }

    fn push(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }
}

/// A file rejected by the acceptance policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileRejection {
    #[error("file exceeds maximum size of {max_bytes} bytes (got {got_bytes})")]
    TooLarge { max_bytes: usize, got_bytes: usize },

    #[error("unsupported media type: {media_type}")]
    UnsupportedMediaType { media_type: String },
}

impl ReportDraft {
    /// Validate the draft and the presence of a file payload.
    ///
    /// Returns the complete field-level error map rather than stopping at
    /// the first problem.
    pub fn validate(&self, file: Option<&FilePayload>) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        if self.student_id.trim().is_empty() {
            errors.push("studentId", "Student ID is required.");
        }
        if self.student_name.trim().is_empty() {
            errors.push("studentName", "Student name is required.");
        }
        if self.class.trim().is_empty() {
            errors.push("class", "Class is required.");
        }
        match self.year {
            Some(year) if year >= MIN_ACADEMIC_YEAR => {}
            _ => errors.push("year", "Invalid year."),
        }
        if OutcomeStatus::parse(&self.status).is_none() {
            errors.push("status", "Unknown outcome status.");
        }
        if file.is_none() {
            errors.push("reportFile", "A report file is required.");
        }

        if errors.fields.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl FilePayload {
    /// Check the file against the acceptance policy.
    ///
    /// Accepted declared media types: `application/pdf` and any `image/*`.
    pub fn check_policy(&self, max_bytes: usize) -> Result<(), FileRejection> {
        if self.bytes.len() > max_bytes {
            return Err(FileRejection::TooLarge {
                max_bytes,
                got_bytes: self.bytes.len(),
            });
        }
        let accepted =
            self.media_type == "application/pdf" || self.media_type.starts_with("image/");
        if !accepted {
            return Err(FileRejection::UnsupportedMediaType {
                media_type: self.media_type.clone(),
            });
        }
        Ok(())
    }
}
