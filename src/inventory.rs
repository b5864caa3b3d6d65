//! Inventory management and saved-cars list.
//!
//! Callers are trusted: admin authorization and user identity are checked
//! before these methods are reached.


use crate::listing::{Listing, ListingStatus, NewListing};
use crate::storage::{InventoryStore, StorageError};
use chrono::{Datelike, Utc};
use futures_util::StreamExt;
use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

const OLDEST_MODEL_YEAR: i32 = 1900;

#[derive(Debug)]
pub enum InventoryError {
    Invalid(String),
    NotFound(String),
    Storage(StorageError),
}

impl std::fmt::Display for InventoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(reason) => write!(f, "Invalid listing: {reason}"),
            Self::NotFound(id) => write!(f, "Listing not found: {id}"),
            Self::Storage(e) => write!(f, "Storage error: {e}"),
        }
    }
}

impl std::error::Error for InventoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for InventoryError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;

pub struct InventoryService {
    storage: Arc<dyn InventoryStore>,
}

impl InventoryService {
    pub fn new(storage: Arc<dyn InventoryStore>) -> Self {
        Self { storage }
    }

    pub async fn add_listing(&self, new: NewListing) -> Result<Listing> {
        let listing = build_listing(new)?;
        self.storage.put_listing(&listing).await?;
        info!(
            "Added listing {} ({} {} {})",
            listing.id, listing.year, listing.make, listing.model
        );
        Ok(listing)
    }

    /// Validates every listing before writing any of them.
    pub async fn import(&self, batch: Vec<NewListing>) -> Result<Vec<Listing>> {
        let listings = batch
            .into_iter()
            .map(build_listing)
            .collect::<Result<Vec<_>>>()?;

        self.storage.put_batch(&listings).await?;
        info!("Imported {} listings", listings.len());
        Ok(listings)
    }

    pub async fn update_listing(
        &self,
        id: &str,
        status: Option<ListingStatus>,
        featured: Option<bool>,
    ) -> Result<Listing> {
        let mut listing = self
            .storage
            .get_listing(id)
            .await?
            .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;

        if let Some(status) = status {
            listing.status = status;
        }
        if let Some(featured) = featured {
            listing.featured = featured;
        }
        listing.updated_at = Utc::now();

        self.storage.put_listing(&listing).await?;
        Ok(listing)
    }

    pub async fn delete_listing(&self, id: &str) -> Result<bool> {
        let deleted = self.storage.delete_listing(id).await?;
        if deleted {
            info!("Deleted listing {id}");
        }
        Ok(deleted)
    }

    /// Every listing regardless of status, newest first, optionally narrowed
    /// by a case-insensitive match on make, model or color.
    pub async fn admin_listings(&self, search: Option<&str>) -> Result<Vec<Listing>> {
        let term = search
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut stream = self.storage.scan_listings().await?;
        let mut listings = Vec::new();
        while let Some(listing) = stream.next().await {
            let listing = listing?;
            let keep = term.as_deref().is_none_or(|term| {
                [&listing.make, &listing.model, &listing.color]
                    .iter()
                    .any(|field| field.to_lowercase().contains(term))
            });
            if keep {
                listings.push(listing);
            }
        }

        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(listings)
    }

    /// Flips whether `user_id` has saved the listing and returns the new state.
    pub async fn toggle_saved(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        if self.storage.get_listing(listing_id).await?.is_none() {
            return Err(InventoryError::NotFound(listing_id.to_string()));
        }

        Ok(self.storage.toggle_saved(user_id, listing_id).await?)
    }

    /// Saved listings, most recently saved first. Entries whose listing has
    /// since been deleted are skipped.
    pub async fn saved_listings(&self, user_id: &str) -> Result<Vec<Listing>> {
        let mut listings = Vec::new();
        for id in self.storage.saved_listing_ids(user_id).await? {
            match self.storage.get_listing(&id).await? {
                Some(listing) => listings.push(listing),
                None => warn!("Saved listing {id} of user {user_id} no longer exists"),
            }
        }

        Ok(listings)
    }
}

fn build_listing(new: NewListing) -> Result<Listing> {
    let make = new.make.trim().to_string();
    let model = new.model.trim().to_string();
    if make.is_empty() || model.is_empty() {
        return Err(InventoryError::Invalid("make and model are required".to_string()));
    }

    let newest_year = Utc::now().year() + 1;
    if !(OLDEST_MODEL_YEAR..=newest_year).contains(&new.year) {
        return Err(InventoryError::Invalid(format!(
            "year {} outside {OLDEST_MODEL_YEAR}..={newest_year}",
            new.year
        )));
    }

    if new.price.is_sign_negative() {
        return Err(InventoryError::Invalid(format!("negative price {}", new.price)));
    }

    if new.seats == Some(0) {
        return Err(InventoryError::Invalid("seat count must be positive".to_string()));
    }

    let mut images = Vec::with_capacity(new.images.len());
    for url in new.images {
        if url.starts_with("https://") || url.starts_with("http://") {
            images.push(url);
        } else {
            warn!("Skipping invalid image reference {url:?}");
        }
    }
    if images.is_empty() {
        return Err(InventoryError::Invalid("no valid image URLs".to_string()));
    }

    let now = Utc::now();
    Ok(Listing {
        id: Uuid::new_v4().to_string(),
        make,
        model,
        year: new.year,
        price: new.price,
        mileage: new.mileage,
        color: new.color.trim().to_string(),
        fuel_type: new.fuel_type,
        transmission: new.transmission,
        body_type: new.body_type,
        seats: new.seats,
        description: new.description,
        status: new.status,
        featured: new.featured,
        images,
        created_at: now,
        updated_at: now,
    })
}
