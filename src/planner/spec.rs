use super::params::{
    BODY_TYPE, FUEL_TYPE, MAKE, MAX_PRICE, MIN_PRICE, PAGE, SEARCH, SORT_BY, SearchParams,
    TRANSMISSION,
};
use crate::aggregator::PriceRange;
use crate::query::{ListingPredicate, SortKey};
use serde::Serialize;

/// Results per page. Not client-configurable.
pub const PAGE_SIZE: u32 = 6;

/// Canonical, fully defaulted search. Produced only by [`super::Planner`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSpec {
    pub predicate: ListingPredicate,
    pub sort: SortKey,
    /// 1-based, never clamped to the number of pages.
    pub page: u32,
    pub page_size: u32,
    /// Corpus-wide price bounds this search was planned against.
    pub corpus: PriceRange,
}

impl SearchSpec {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Canonical parameter form. Values equal to their defaults are left out,
    /// so planning the output against the same corpus bounds gives back `self`.
    pub fn to_params(&self) -> SearchParams {
        let p = &self.predicate;
        let (floor, ceiling) = self.corpus.search_bounds();
        let mut params = SearchParams::new();

        let optional = [
            (SEARCH, &p.text),
            (MAKE, &p.make),
            (BODY_TYPE, &p.body_type),
            (FUEL_TYPE, &p.fuel_type),
            (TRANSMISSION, &p.transmission),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                params.insert(key, value.as_str());
            }
        }

        if p.min_price != floor {
            params.insert(MIN_PRICE, p.min_price.normalize().to_string());
        }
        if p.max_price != ceiling {
            params.insert(MAX_PRICE, p.max_price.normalize().to_string());
        }
        if self.sort != SortKey::default() {
            params.insert(SORT_BY, self.sort.as_str());
        }
        if self.page != 1 {
            params.insert(PAGE, self.page.to_string());
        }

        params
    }

    pub fn to_query_string(&self) -> String {
        self.to_params().to_query_string()
    }
}
