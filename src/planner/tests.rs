use super::*;

fn corpus() -> PriceRange {
    PriceRange::new(Decimal::from(8_000), Decimal::from(95_000))
}

fn plan(query: &str) -> SearchSpec {
    Planner::new().plan(&SearchParams::from_query_string(query), &corpus())
}

#[test]
fn test_empty_params_use_defaults() {
    let spec = plan("");

    assert_eq!(spec.page, 1);
    assert_eq!(spec.page_size, PAGE_SIZE);
    assert_eq!(spec.sort, SortKey::Newest);
    assert_eq!(spec.predicate.min_price, Decimal::from(8_000));
    assert_eq!(spec.predicate.max_price, Decimal::from(95_000));
    assert_eq!(spec.predicate.text, None);
    assert_eq!(spec.predicate.make, None);
    assert!(!spec.predicate.featured_only);
    assert_eq!(spec.offset(), 0);
}

#[test]
fn test_invalid_pages_coerce_to_first() {
    for raw in ["page=0", "page=-5", "page=abc", "page=", "page=2.5"] {
        assert_eq!(plan(raw).page, 1, "{raw}");
    }
}

#[test]
fn test_page_parses_and_offsets() {
    let spec = plan("page=3");
    assert_eq!(spec.page, 3);
    assert_eq!(spec.offset(), 12);

    assert_eq!(plan("page=%2B4").page, 4);
    assert_eq!(plan("page=99999999999").page, u32::MAX);
}

#[test]
fn test_unknown_sort_falls_back_to_newest() {
    assert_eq!(plan("sortBy=priceAsc").sort, SortKey::PriceAsc);
    assert_eq!(plan("sortBy=priceDesc").sort, SortKey::PriceDesc);
    assert_eq!(plan("sortBy=cheapest").sort, SortKey::Newest);
    assert_eq!(plan("sortBy=PRICEASC").sort, SortKey::Newest);
}

#[test]
fn test_malformed_prices_fall_back_to_corpus_bounds() {
    let spec = plan("minPrice=cheap&maxPrice=-10");
    assert_eq!(spec.predicate.min_price, Decimal::from(8_000));
    assert_eq!(spec.predicate.max_price, Decimal::from(95_000));

    let spec = plan("minPrice=12000&maxPrice=30000");
    assert_eq!(spec.predicate.min_price, Decimal::from(12_000));
    assert_eq!(spec.predicate.max_price, Decimal::from(30_000));
}

#[test]
fn test_inverted_price_range_is_kept() {
    let spec = plan("minPrice=50000&maxPrice=10000");
    assert!(spec.predicate.is_empty_range());
}

#[test]
fn test_text_and_facets_are_trimmed() {
    let spec = plan("search=+Tesla+Model+&make=Tesla&bodyType=%20&fuelType=Plug-in%20Hybrid");

    assert_eq!(spec.predicate.text.as_deref(), Some("tesla model"));
    assert_eq!(spec.predicate.make.as_deref(), Some("Tesla"));
    assert_eq!(spec.predicate.body_type, None);
    assert_eq!(spec.predicate.fuel_type.as_deref(), Some("Plug-in Hybrid"));
}

#[test]
fn test_unknown_params_are_ignored() {
    assert_eq!(plan("color=red&limit=50"), plan(""));
}

#[test]
fn test_to_params_omits_defaults() {
    assert!(plan("sortBy=newest&page=1").to_params().is_empty());
    assert!(plan("minPrice=8000&maxPrice=95000").to_params().is_empty());
}

#[test]
fn test_replanning_canonical_params_is_identity() {
    let queries = [
        "",
        "search=Tesla&make=Tesla&sortBy=priceDesc&page=2",
        "bodyType=SUV&fuelType=Hybrid&transmission=Automatic",
        "minPrice=10000&maxPrice=20000&page=7",
        "minPrice=50000&maxPrice=10000",
        "page=abc&sortBy=nope&minPrice=x",
        "search=red+pickup%21",
    ];

    for query in queries {
        let spec = plan(query);
        let replanned = Planner::new().plan(&spec.to_params(), &corpus());
        assert_eq!(replanned, spec, "{query}");

        let from_url = plan(&spec.to_query_string());
        assert_eq!(from_url, spec, "{query}");
    }
}

#[test]
fn test_query_string_round_trip_encoding() {
    let params = SearchParams::from_query_string("?search=red%20car&make=Land+Rover&flag");
    assert_eq!(params.get("search"), Some("red car"));
    assert_eq!(params.get("make"), Some("Land Rover"));
    assert_eq!(params.get("flag"), Some(""));

    let encoded = params.to_query_string();
    assert_eq!(encoded, "flag=&make=Land%20Rover&search=red%20car");
    assert_eq!(SearchParams::from_query_string(&encoded), params);
}

#[test]
fn test_explain_lists_every_term() {
    let spec = plan("search=tesla&make=Tesla&minPrice=50000&maxPrice=10000&sortBy=priceAsc&page=2");
    let explanation = Planner::new().explain(&spec);

    assert!(explanation.starts_with("ListingPage: page=2 size=6 offset=6"));
    assert!(explanation.contains("Sort: priceAsc, id asc"));
    assert!(explanation.contains("Filter: status = AVAILABLE"));
    assert!(explanation.contains("Filter: text contains \"tesla\""));
    assert!(explanation.contains("Filter: make = \"Tesla\""));
    assert!(explanation.contains("Filter: price in [50000, 10000] (empty)"));
}

#[test]
fn test_empty_corpus_leaves_price_unbounded() {
    let empty = PriceRange::default();
    let spec = Planner::new().plan(&SearchParams::new(), &empty);

    assert_eq!(spec.predicate.min_price, Decimal::MIN);
    assert_eq!(spec.predicate.max_price, Decimal::MAX);
    assert!(spec.to_params().is_empty());
    assert!(!Planner::new().explain(&spec).contains("price"));

    let narrowed = Planner::new().plan(&SearchParams::new().with("minPrice", "0"), &empty);
    assert_eq!(narrowed.predicate.min_price, Decimal::ZERO);
    assert_eq!(narrowed.predicate.max_price, Decimal::MAX);
    assert_eq!(narrowed.to_query_string(), "minPrice=0");
    assert_eq!(Planner::new().plan(&narrowed.to_params(), &empty), narrowed);
}

#[test]
fn test_params_accept_non_string_values() {
    let params: SearchParams = serde_json::from_value(serde_json::json!({
        "page": 2,
        "minPrice": 15000,
        "maxPrice": 2.5e4,
        "search": "tesla",
        "flag": true,
        "sortBy": null,
        "make": ["Tesla", "BMW"],
    }))
    .unwrap();

    assert_eq!(params.get("page"), Some("2"));
    assert_eq!(params.get("minPrice"), Some("15000"));
    assert_eq!(params.get("flag"), Some("true"));
    assert_eq!(params.get("sortBy"), None);
    assert_eq!(params.get("make"), None);

    let spec = Planner::new().plan(&params, &corpus());
    assert_eq!(spec.page, 2);
    assert_eq!(spec.predicate.min_price, Decimal::from(15_000));
    // "25000.0" is not an integer price.
    assert_eq!(spec.predicate.max_price, Decimal::from(95_000));
}
