mod common;

use carzone::server::{DeleteOutcome, Request};
use carzone::{Listing, ListingPage, ListingStatus};
use common::*;

#[tokio::test]
async fn test_added_car_is_searchable_until_sold() {
    let addr = start_test_server(Vec::new()).await;
    let mut stream = connect_to_server(addr).await;

    let added: Listing = expect_result(
        &mut stream,
        &Request::AddCar {
            car: create_new_listing("Tesla", "Model Y", 42_000),
        },
    )
    .await;
    assert_eq!(added.status, ListingStatus::Available);

    let page: ListingPage = expect_result(&mut stream, &list_cars("make=Tesla")).await;
    assert_eq!(page.items, vec![added.clone()]);

    let sold: Listing = expect_result(
        &mut stream,
        &Request::UpdateCarStatus {
            id: added.id.clone(),
            status: Some(ListingStatus::Sold),
            featured: None,
        },
    )
    .await;
    assert_eq!(sold.status, ListingStatus::Sold);

    let page: ListingPage = expect_result(&mut stream, &list_cars("make=Tesla")).await;
    assert!(page.items.is_empty());

    let detail: Option<Listing> =
        expect_result(&mut stream, &Request::GetCar { id: added.id.clone() }).await;
    assert!(detail.is_none());

    let admin: Vec<Listing> =
        expect_result(&mut stream, &Request::AdminCars { search: None }).await;
    assert_eq!(admin.len(), 1);
    assert_eq!(admin[0].status, ListingStatus::Sold);
}

#[tokio::test]
async fn test_add_car_rejects_invalid_listing() {
    let addr = start_test_server(Vec::new()).await;
    let mut stream = connect_to_server(addr).await;

    let mut car = create_new_listing("Tesla", "Model 3", 35_000);
    car.images = vec!["file:///tmp/photo.png".to_string()];

    let error = expect_error(&mut stream, &Request::AddCar { car }).await;
    assert_eq!(error, "Invalid listing: no valid image URLs");
}

#[tokio::test]
async fn test_update_and_delete_unknown_car() {
    let addr = start_test_server(vec![create_listing("a", "Audi", 10_000, 0)]).await;
    let mut stream = connect_to_server(addr).await;

    let error = expect_error(
        &mut stream,
        &Request::UpdateCarStatus {
            id: "missing".to_string(),
            status: None,
            featured: Some(true),
        },
    )
    .await;
    assert_eq!(error, "Listing not found: missing");

    let outcome: DeleteOutcome =
        expect_result(&mut stream, &Request::DeleteCar { id: "a".to_string() }).await;
    assert!(outcome.deleted);
    let outcome: DeleteOutcome =
        expect_result(&mut stream, &Request::DeleteCar { id: "a".to_string() }).await;
    assert!(!outcome.deleted);
}

#[tokio::test]
async fn test_admin_cars_search() {
    let mut red = create_listing("r", "Mazda", 18_000, 0);
    red.color = "Soul Red".to_string();
    let addr = start_test_server(vec![red, create_listing("w", "Honda", 12_000, 10)]).await;
    let mut stream = connect_to_server(addr).await;

    let found: Vec<Listing> = expect_result(
        &mut stream,
        &Request::AdminCars {
            search: Some("red".to_string()),
        },
    )
    .await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "r");
}
