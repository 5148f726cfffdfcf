//! Veriport service layer.
//!
//! The four operations the portal core exposes, written against the storage
//! traits so every collaborator can be substituted in tests:
//!
//! - `UploadPipeline` — validate a submission, derive its verification
//!   status, store the file, then write the record.
//! - `VerificationService` — resolve a public token to a status-gated,
//!   redacted view.
//! - `MutationService` — authorized sparse update and delete, with
//!   best-effort file release on delete.
//! - `ListingService` — recency page plus total/pending counts.
//!
//! All operations are stateless request/response interactions against the
//! injected stores; there is no in-process shared mutable state here.

mod listing;
mod mutate;
mod upload;
mod verify;

pub use listing::{ListingService, ReportPage, DEFAULT_PAGE_LIMIT};
pub use mutate::{MutationError, MutationService, ReportPatch};
pub use upload::{UploadError, UploadPipeline, UploadReceipt};
pub use verify::{VerificationOutcome, VerificationService};
