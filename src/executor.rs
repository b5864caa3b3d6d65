pub mod error;


use crate::listing::Listing;
use crate::planner::SearchSpec;
use crate::query::{ListingPredicate, SortKey};
use crate::storage::InventoryStore;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

pub use error::{ExecError, ExecStats};

/// Listings shown on the homepage when no limit is given.
pub const DEFAULT_FEATURED_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    /// Requested page, echoed back even when past the last page.
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u32, page_size: u32) -> Self {
        Self {
            total,
            page,
            page_size,
            total_pages: total.div_ceil(u64::from(page_size.max(1))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    pub items: Vec<Listing>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub page: ListingPage,
    pub stats: ExecStats,
}

/// Runs canonical searches against the inventory store.
///
/// Holds no mutable state, so one executor can serve concurrent requests.
pub struct ListingExecutor {
    storage: Arc<dyn InventoryStore>,
}

impl ListingExecutor {
    pub fn new(storage: Arc<dyn InventoryStore>) -> Self {
        Self { storage }
    }

    pub async fn execute(&self, spec: &SearchSpec) -> Result<ExecResult, ExecError> {
        let start = Instant::now();
        let mut stats = ExecStats::default();

        let (items, total) = self
            .storage
            .find_available_listings(
                &spec.predicate,
                spec.sort,
                spec.offset(),
                u64::from(spec.page_size),
            )
            .await?;

        stats.record_rows(items.len(), total);
        stats.record_duration(start.elapsed());
        debug!(
            "page {} ({}): {} of {} listings in {}ms",
            spec.page, spec.sort, stats.rows_returned, stats.total_matched, stats.duration_ms
        );

        Ok(ExecResult {
            page: ListingPage {
                items,
                pagination: Pagination::new(total, spec.page, spec.page_size),
            },
            stats,
        })
    }

    /// Featured AVAILABLE listings, newest first.
    pub async fn featured(&self, limit: u32) -> Result<Vec<Listing>, ExecError> {
        let predicate = ListingPredicate {
            featured_only: true,
            ..ListingPredicate::any_price()
        };

        let (items, _) = self
            .storage
            .find_available_listings(&predicate, SortKey::Newest, 0, u64::from(limit))
            .await?;

        Ok(items)
    }

    /// Public detail lookup. Listings that are not AVAILABLE are not served.
    pub async fn listing(&self, id: &str) -> Result<Option<Listing>, ExecError> {
        let listing = self.storage.get_listing(id).await?;
        Ok(listing.filter(Listing::is_available))
    }
}
