pub mod memory;
pub mod rocks;


use crate::listing::Listing;
use crate::query::{Facet, ListingPredicate, SortKey};
use async_trait::async_trait;
use futures_util::StreamExt;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tokio_stream::wrappers::ReceiverStream;

pub use memory::MemoryStorage;
pub use rocks::{Config, RocksStorage};

#[derive(Debug)]
pub enum StorageError {
    BackendError(rocksdb::Error),
    InvalidRecord(rmp_serde::decode::Error),
    EncodeError(rmp_serde::encode::Error),
    MissingColumnFamily(String),
    InvalidKey(String),
    TaskFailed(tokio::task::JoinError),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BackendError(e) => write!(f, "Storage backend error: {e}"),
            Self::InvalidRecord(e) => write!(f, "Invalid record: {e}"),
            Self::EncodeError(e) => write!(f, "Record encoding error: {e}"),
            Self::MissingColumnFamily(name) => write!(f, "Missing column family: {name}"),
            Self::InvalidKey(key) => write!(f, "Invalid key: {key:?}"),
            Self::TaskFailed(e) => write!(f, "Storage task failed: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BackendError(e) => Some(e),
            Self::InvalidRecord(e) => Some(e),
            Self::EncodeError(e) => Some(e),
            Self::TaskFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        Self::BackendError(e)
    }
}

impl From<rmp_serde::decode::Error> for StorageError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Self::InvalidRecord(e)
    }
}

impl From<rmp_serde::encode::Error> for StorageError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::EncodeError(e)
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskFailed(e)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Data-access interface the catalog core depends on.
///
/// The first three methods are the read path used by public search. The rest
/// serve inventory management and the saved-cars list.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// One page of AVAILABLE listings matching `predicate`, ordered by `sort`,
    /// plus the total number of matches.
    async fn find_available_listings(
        &self,
        predicate: &ListingPredicate,
        sort: SortKey,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Listing>, u64)>;

    /// Distinct values of `facet` across AVAILABLE listings.
    async fn distinct_values(&self, facet: Facet) -> Result<BTreeSet<String>>;

    /// Lowest and highest price across AVAILABLE listings, `None` if there are none.
    async fn price_bounds(&self) -> Result<Option<(Decimal, Decimal)>>;

    async fn get_listing(&self, id: &str) -> Result<Option<Listing>>;
    async fn put_listing(&self, listing: &Listing) -> Result<()>;
    async fn put_batch(&self, listings: &[Listing]) -> Result<()>;
    /// Returns whether a listing was removed.
    async fn delete_listing(&self, id: &str) -> Result<bool>;
    /// Every listing regardless of status, in id order.
    async fn scan_listings(&self) -> Result<ReceiverStream<Result<Listing>>>;

    /// Listing ids saved by `user_id`, most recently saved first.
    async fn saved_listing_ids(&self, user_id: &str) -> Result<Vec<String>>;
    /// Saves the listing for `user_id` if it is not saved, removes it if it
    /// is, and returns the new state. Concurrent toggles of the same pair
    /// never observe the same prior state.
    async fn toggle_saved(&self, user_id: &str, listing_id: &str) -> Result<bool>;
}

/// Sorts the matched listings and cuts out `[offset, offset + limit)`.
pub fn rank_page(
    mut matched: Vec<Listing>,
    sort: SortKey,
    offset: u64,
    limit: u64,
) -> (Vec<Listing>, u64) {
    let total = matched.len() as u64;
    matched.sort_by(|a, b| sort.compare(a, b));

    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    let items = matched.into_iter().skip(offset).take(limit).collect();

    (items, total)
}

/// Filters a stream of listings through `predicate` and ranks the result.
pub async fn collect_page(
    mut stream: ReceiverStream<Result<Listing>>,
    predicate: &ListingPredicate,
    sort: SortKey,
    offset: u64,
    limit: u64,
) -> Result<(Vec<Listing>, u64)> {
    let mut matched = Vec::new();

    while let Some(listing) = stream.next().await {
        let listing = listing?;
        if predicate.matches(&listing) {
            matched.push(listing);
        }
    }

    Ok(rank_page(matched, sort, offset, limit))
}

/// Accumulates the facet sets and price bounds of AVAILABLE listings.
#[derive(Debug, Default)]
pub struct FacetAccumulator {
    values: BTreeSet<String>,
    bounds: Option<(Decimal, Decimal)>,
}

impl FacetAccumulator {
    pub fn observe(&mut self, facet: Option<Facet>, listing: &Listing) {
        if !listing.is_available() {
            return;
        }

        if let Some(facet) = facet {
            self.values.insert(facet.value_of(listing));
        }

        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(listing.price), max.max(listing.price)),
            None => (listing.price, listing.price),
        });
    }

    pub fn into_values(self) -> BTreeSet<String> {
        self.values
    }

    pub const fn bounds(&self) -> Option<(Decimal, Decimal)> {
        self.bounds
    }
}
