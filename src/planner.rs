pub mod explain;
pub mod params;
pub mod spec;

#[cfg(test)]
mod tests;

use crate::aggregator::PriceRange;
use crate::query::{ListingPredicate, SortKey};
use rust_decimal::Decimal;

pub use params::SearchParams;
pub use spec::{PAGE_SIZE, SearchSpec};

/// Turns raw search parameters into a [`SearchSpec`].
///
/// Planning is total: malformed values degrade to their defaults instead of
/// failing the request.
#[derive(Debug, Default, Clone, Copy)]
pub struct Planner;

impl Planner {
    pub const fn new() -> Self {
        Self
    }

    pub fn plan(&self, params: &SearchParams, corpus: &PriceRange) -> SearchSpec {
        let (floor, ceiling) = corpus.search_bounds();
        let predicate = ListingPredicate {
            text: non_empty(params.get(params::SEARCH)).map(str::to_lowercase),
            make: non_empty(params.get(params::MAKE)).map(str::to_string),
            body_type: non_empty(params.get(params::BODY_TYPE)).map(str::to_string),
            fuel_type: non_empty(params.get(params::FUEL_TYPE)).map(str::to_string),
            transmission: non_empty(params.get(params::TRANSMISSION)).map(str::to_string),
            min_price: parse_price(params.get(params::MIN_PRICE)).unwrap_or(floor),
            max_price: parse_price(params.get(params::MAX_PRICE)).unwrap_or(ceiling),
            featured_only: false,
        };

        SearchSpec {
            predicate,
            sort: SortKey::parse_lenient(params.get(params::SORT_BY).unwrap_or_default()),
            page: parse_page(params.get(params::PAGE)),
            page_size: PAGE_SIZE,
            corpus: *corpus,
        }
    }

    pub fn explain(&self, spec: &SearchSpec) -> String {
        explain::explain_spec(spec, 0)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Non-negative integer, anything else is `None`.
fn parse_price(value: Option<&str>) -> Option<Decimal> {
    value?.trim().parse::<u64>().ok().map(Decimal::from)
}

/// Positive integer saturating at `u32::MAX`; anything else is page 1.
fn parse_page(value: Option<&str>) -> u32 {
    match value.map(|v| v.trim().parse::<i64>()) {
        Some(Ok(page)) if page >= 1 => u32::try_from(page).unwrap_or(u32::MAX),
        _ => 1,
    }
}
