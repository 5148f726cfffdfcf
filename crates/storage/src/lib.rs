//! Storage contracts for the verification portal.
//!
//! The document store and the binary content store are external
//! collaborators; this crate pins down only the access patterns the core
//! needs from them (`ReportStore`, `FileStore`) plus in-memory backends used
//! by the default server and by tests. Adapters are constructed explicitly
//! and injected; there is no ambient global store handle.

mod error;
mod memory;
mod record;
mod traits;

pub use error::{FileStoreError, StorageError};
pub use memory::{MemoryFileStore, MemoryReportStore};
pub use record::{NewReportRecord, ReportRecord, ReportUpdate, StoredFile};
pub use traits::{FileStore, ReportStore};
