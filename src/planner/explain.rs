use super::spec::SearchSpec;
use crate::listing::ListingStatus;
use rust_decimal::Decimal;
use std::fmt::Write;

pub fn explain_spec(spec: &SearchSpec, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    let inner = "  ".repeat(indent + 1);
    let p = &spec.predicate;

    let mut out = format!(
        "{pad}ListingPage: page={} size={} offset={}\n{inner}Sort: {}, id asc\n{inner}Filter: status = {}",
        spec.page,
        spec.page_size,
        spec.offset(),
        spec.sort,
        ListingStatus::Available,
    );

    if p.featured_only {
        let _ = write!(out, "\n{inner}Filter: featured");
    }
    if let Some(text) = &p.text {
        let _ = write!(out, "\n{inner}Filter: text contains {text:?}");
    }

    let exact = [
        ("make", &p.make),
        ("bodyType", &p.body_type),
        ("fuelType", &p.fuel_type),
        ("transmission", &p.transmission),
    ];
    for (field, value) in exact {
        if let Some(value) = value {
            let _ = write!(out, "\n{inner}Filter: {field} = {value:?}");
        }
    }

    if p.min_price != Decimal::MIN || p.max_price != Decimal::MAX {
        let _ = write!(
            out,
            "\n{inner}Filter: price in [{}, {}]",
            p.min_price, p.max_price
        );
        if p.is_empty_range() {
            let _ = write!(out, " (empty)");
        }
    }

    out
}
