use crate::listing::{BodyType, FuelType, Listing, ListingStatus, Transmission};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub fn timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
}

/// An available petrol sedan; tests override what they care about.
pub fn listing(id: &str, make: &str, price: i64, created: i64) -> Listing {
    Listing {
        id: id.to_string(),
        make: make.to_string(),
        model: "Base".to_string(),
        year: 2020,
        price: Decimal::from(price),
        mileage: 10_000,
        color: "Black".to_string(),
        fuel_type: FuelType::Petrol,
        transmission: Transmission::Manual,
        body_type: BodyType::Sedan,
        seats: Some(5),
        description: String::new(),
        status: ListingStatus::Available,
        featured: false,
        images: vec![format!("https://cdn.example/cars/{id}/image-0.jpeg")],
        created_at: timestamp(created),
        updated_at: timestamp(created),
    }
}

pub fn with_status(mut listing: Listing, status: ListingStatus) -> Listing {
    listing.status = status;
    listing
}

/// `count` available listings with a spread of makes, prices and timestamps,
/// including deliberate price and timestamp collisions.
pub fn inventory(count: usize) -> Vec<Listing> {
    const MAKES: &[&str] = &["Audi", "BMW", "Ford", "Tesla", "Toyota"];

    (0..count)
        .map(|i| {
            let mut l = listing(
                &format!("car-{i:03}"),
                MAKES[i % MAKES.len()],
                10_000 + (i as i64 % 7) * 2_500,
                (i as i64 % 5) * 60,
            );
            l.body_type = BodyType::ALL[i % BodyType::ALL.len()];
            l.fuel_type = FuelType::ALL[i % FuelType::ALL.len()];
            l
        })
        .collect()
}
