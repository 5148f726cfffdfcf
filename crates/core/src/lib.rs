//! Veriport domain core.
//!
//! Pure domain logic for the report-card verification portal: the outcome
//! and verification status vocabulary, the derivation and disclosure rules,
//! the opaque verification token, and submission validation. No I/O lives
//! here; the storage and service crates build on these types.

mod draft;
mod status;
mod token;

pub use draft::{
    FilePayload, FileRejection, ReportDraft, ValidationError, DEFAULT_MAX_FILE_BYTES,
    MIN_ACADEMIC_YEAR,
};
pub use status::{
    derive_verification_status, effective_status, redact, OutcomeStatus, PublicView,
    VerificationStatus,
};
pub use token::VerificationToken;
