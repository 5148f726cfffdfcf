//! The public verification read path.

use std::sync::Arc;

use serde::Serialize;
use veriport_core::{effective_status, redact, PublicView, VerificationStatus};
use veriport_storage::{ReportStore, StorageError};

/// The answer to "is this token valid": a tri-state status, with a redacted
/// payload only when Valid. `data` serializes as `null` otherwise, so the
/// response shape never varies with the reason for non-validity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    pub data: Option<PublicView>,
}

/// Resolves public tokens to status-gated views. Requires no principal.
pub struct VerificationService {
    store: Arc<dyn ReportStore>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        VerificationService { store }
    }

    /// Look up a token and apply the disclosure policy.
    ///
    /// An unknown token yields `{Invalid, null}`, indistinguishable from a
    /// record whose status is Invalid: the read path leaks nothing about
    /// token existence.
    pub async fn verify(&self, token: &str) -> Result<VerificationOutcome, StorageError> {
        let Some(record) = self.store.find_by_token(token).await? else {
            return Ok(VerificationOutcome {
                status: VerificationStatus::Invalid,
                data: None,
            });
        };

        let status = effective_status(record.verification_status.as_deref(), &record.status);
        let view = PublicView {
            student_name: record.student_name,
            class: record.class,
            status: record.status,
            year: record.year,
        };
        Ok(VerificationOutcome {
            status,
            data: redact(status, view),
        })
    }
}
