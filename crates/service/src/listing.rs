//! The dashboard read-model: recency page plus counts.

use std::sync::Arc;

use serde::Serialize;
use veriport_storage::{ReportRecord, ReportStore, StorageError};

/// Page size the dashboard requests.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// A page of records newest-first, with the two dashboard counts.
///
/// Consistent with the store at query time; no transactional snapshot is
/// promised across the three reads.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPage {
    pub reports: Vec<ReportRecord>,
    pub total: u64,
    pub pending: u64,
}

pub struct ListingService {
    store: Arc<dyn ReportStore>,
}

impl ListingService {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        ListingService { store }
    }

    pub async fn page(&self, limit: usize) -> Result<ReportPage, StorageError> {
        let reports = self.store.list_recent(limit).await?;
        let total = self.store.count_all().await?;
        let pending = self.store.count_pending().await?;
        Ok(ReportPage {
            reports,
            total,
            pending,
        })
    }
}
