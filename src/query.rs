//! Query vocabulary shared by the planner and the storage backends.
//!
//! A [`ListingPredicate`] and a [`SortKey`] are everything a backend needs to
//! select one page of public listings; both carry their own evaluation rules
//! so every backend filters and orders identically.

use crate::listing::Listing;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result ordering. Ties are always broken by listing id ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    /// Creation timestamp, most recent first.
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "priceAsc")]
    PriceAsc,
    #[serde(rename = "priceDesc")]
    PriceDesc,
}

impl SortKey {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "priceAsc",
            Self::PriceDesc => "priceDesc",
        }
    }

    /// Unknown values fall back to [`SortKey::Newest`].
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim() {
            "priceAsc" => Self::PriceAsc,
            "priceDesc" => Self::PriceDesc,
            _ => Self::Newest,
        }
    }

    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
        };

        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A filterable dimension with a distinct-value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Make,
    BodyType,
    FuelType,
    Transmission,
}

impl Facet {
    pub fn value_of(&self, listing: &Listing) -> String {
        match self {
            Self::Make => listing.make.clone(),
            Self::BodyType => listing.body_type.as_str().to_string(),
            Self::FuelType => listing.fuel_type.as_str().to_string(),
            Self::Transmission => listing.transmission.as_str().to_string(),
        }
    }
}

/// Conjunction of filters applied to AVAILABLE listings.
///
/// `None` on a dimension means no filter on it. The text term is stored
/// lowercased so matching does not re-fold it per row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPredicate {
    pub text: Option<String>,
    pub make: Option<String>,
    pub body_type: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub min_price: Decimal,
    pub max_price: Decimal,
    /// Restrict to featured listings (homepage promotion).
    #[serde(default)]
    pub featured_only: bool,
}

impl ListingPredicate {
    /// Predicate with no filters over the given price range.
    pub fn within(min_price: Decimal, max_price: Decimal) -> Self {
        Self {
            min_price,
            max_price,
            ..Self::default()
        }
    }

    /// Predicate that accepts every available listing regardless of price.
    pub fn any_price() -> Self {
        Self::within(Decimal::MIN, Decimal::MAX)
    }

    pub fn is_empty_range(&self) -> bool {
        self.min_price > self.max_price
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if !listing.is_available() {
            return false;
        }

        if self.featured_only && !listing.featured {
            return false;
        }

        if listing.price < self.min_price || listing.price > self.max_price {
            return false;
        }

        if !matches_exact(self.make.as_deref(), &listing.make)
            || !matches_exact(self.body_type.as_deref(), listing.body_type.as_str())
            || !matches_exact(self.fuel_type.as_deref(), listing.fuel_type.as_str())
            || !matches_exact(self.transmission.as_deref(), listing.transmission.as_str())
        {
            return false;
        }

        match &self.text {
            Some(term) => listing.search_text().contains(term.as_str()),
            None => true,
        }
    }
}

fn matches_exact(filter: Option<&str>, value: &str) -> bool {
    filter.is_none_or(|expected| expected == value)
}
