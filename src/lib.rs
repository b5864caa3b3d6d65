pub mod aggregator;
pub mod executor;
pub mod extraction;
pub mod inventory;
pub mod listing;
pub mod planner;
pub mod query;
pub mod server;
pub mod storage;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use aggregator::{FilterOptionAggregator, FilterOptions, PriceRange};
pub use executor::{ExecError, ExecResult, ExecStats, ListingExecutor, ListingPage, Pagination};
pub use extraction::{Extraction, ExtractionError, SearchExtraction};
pub use inventory::{InventoryError, InventoryService};
pub use listing::{BodyType, FuelType, Listing, ListingStatus, NewListing, Transmission};
pub use planner::{PAGE_SIZE, Planner, SearchParams, SearchSpec};
pub use query::{Facet, ListingPredicate, SortKey};
pub use storage::{InventoryStore, MemoryStorage, RocksStorage, StorageError};
