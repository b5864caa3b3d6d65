
use crate::query::Facet;
use crate::storage::{InventoryStore, StorageError};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Price range observed across AVAILABLE inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// `[0, 0]` is what an empty inventory reports and carries no information.
    pub fn is_meaningful(&self) -> bool {
        !(self.min.is_zero() && self.max.is_zero())
    }

    /// Bounds an unfiltered search uses: the observed range, or no bound at
    /// all when the inventory reported none.
    pub fn search_bounds(&self) -> (Decimal, Decimal) {
        if self.is_meaningful() {
            (self.min, self.max)
        } else {
            (Decimal::MIN, Decimal::MAX)
        }
    }
}

/// Facet values offered to the filter widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub makes: Vec<String>,
    pub body_types: Vec<String>,
    pub fuel_types: Vec<String>,
    pub transmissions: Vec<String>,
    pub price_range: PriceRange,
}

pub struct FilterOptionAggregator {
    storage: Arc<dyn InventoryStore>,
}

impl FilterOptionAggregator {
    pub fn new(storage: Arc<dyn InventoryStore>) -> Self {
        Self { storage }
    }

    /// Reads every facet and the price bounds concurrently. Storage errors are
    /// returned as-is.
    pub async fn filter_options(&self) -> Result<FilterOptions, StorageError> {
        let storage = &self.storage;
        let (makes, body_types, fuel_types, transmissions, bounds) = tokio::try_join!(
            storage.distinct_values(Facet::Make),
            storage.distinct_values(Facet::BodyType),
            storage.distinct_values(Facet::FuelType),
            storage.distinct_values(Facet::Transmission),
            storage.price_bounds(),
        )?;

        let price_range = bounds
            .map(|(min, max)| PriceRange::new(min, max))
            .unwrap_or_default();

        debug!(
            "filter options: {} makes, price range {}..={}",
            makes.len(),
            price_range.min,
            price_range.max
        );

        Ok(FilterOptions {
            makes: makes.into_iter().collect(),
            body_types: body_types.into_iter().collect(),
            fuel_types: fuel_types.into_iter().collect(),
            transmissions: transmissions.into_iter().collect(),
            price_range,
        })
    }

    pub async fn price_range(&self) -> Result<PriceRange, StorageError> {
        let bounds = self.storage.price_bounds().await?;
        Ok(bounds
            .map(|(min, max)| PriceRange::new(min, max))
            .unwrap_or_default())
    }
}
