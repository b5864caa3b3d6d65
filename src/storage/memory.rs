use super::{FacetAccumulator, InventoryStore, Result, rank_page};
use crate::listing::Listing;
use crate::query::{Facet, ListingPredicate, SortKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::{RwLock, mpsc};
use tokio_stream::wrappers::ReceiverStream;

/// Inventory held in process memory. Used by tests, benches and `--memory`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    listings: RwLock<BTreeMap<String, Listing>>,
    saved: RwLock<BTreeMap<String, BTreeMap<String, DateTime<Utc>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: impl IntoIterator<Item = Listing>) -> Self {
        let listings = listings
            .into_iter()
            .map(|listing| (listing.id.clone(), listing))
            .collect();

        Self {
            listings: RwLock::new(listings),
            saved: RwLock::default(),
        }
    }
}

#[async_trait]
impl InventoryStore for MemoryStorage {
    async fn find_available_listings(
        &self,
        predicate: &ListingPredicate,
        sort: SortKey,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Listing>, u64)> {
        let listings = self.listings.read().await;
        let matched = listings
            .values()
            .filter(|listing| predicate.matches(listing))
            .cloned()
            .collect();

        Ok(rank_page(matched, sort, offset, limit))
    }

    async fn distinct_values(&self, facet: Facet) -> Result<BTreeSet<String>> {
        let listings = self.listings.read().await;
        let mut acc = FacetAccumulator::default();
        for listing in listings.values() {
            acc.observe(Some(facet), listing);
        }

        Ok(acc.into_values())
    }

    async fn price_bounds(&self) -> Result<Option<(Decimal, Decimal)>> {
        let listings = self.listings.read().await;
        let mut acc = FacetAccumulator::default();
        for listing in listings.values() {
            acc.observe(None, listing);
        }

        Ok(acc.bounds())
    }

    async fn get_listing(&self, id: &str) -> Result<Option<Listing>> {
        Ok(self.listings.read().await.get(id).cloned())
    }

    async fn put_listing(&self, listing: &Listing) -> Result<()> {
        self.listings
            .write()
            .await
            .insert(listing.id.clone(), listing.clone());
        Ok(())
    }

    async fn put_batch(&self, listings: &[Listing]) -> Result<()> {
        let mut guard = self.listings.write().await;
        for listing in listings {
            guard.insert(listing.id.clone(), listing.clone());
        }
        Ok(())
    }

    async fn delete_listing(&self, id: &str) -> Result<bool> {
        Ok(self.listings.write().await.remove(id).is_some())
    }

    async fn scan_listings(&self) -> Result<ReceiverStream<Result<Listing>>> {
        let listings = self.listings.read().await;
        let (tx, rx) = mpsc::channel(listings.len().max(1));

        for listing in listings.values() {
            // Capacity covers every row, so this never reports `Full`.
            if tx.try_send(Ok(listing.clone())).is_err() {
                break;
            }
        }

        Ok(ReceiverStream::new(rx))
    }

    async fn saved_listing_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let saved = self.saved.read().await;
        let Some(entries) = saved.get(user_id) else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<(&String, &DateTime<Utc>)> = entries.iter().collect();
        entries.sort_by(|(a_id, a_at), (b_id, b_at)| b_at.cmp(a_at).then_with(|| a_id.cmp(b_id)));

        Ok(entries.into_iter().map(|(id, _)| id.clone()).collect())
    }

    async fn toggle_saved(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        let mut guard = self.saved.write().await;
        let entries = guard.entry(user_id.to_string()).or_default();

        let saved = entries.remove(listing_id).is_none();
        if saved {
            entries.insert(listing_id.to_string(), Utc::now());
        } else if entries.is_empty() {
            guard.remove(user_id);
        }

        Ok(saved)
    }
}
