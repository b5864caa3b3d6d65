use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

string_enum! {
    /// Lifecycle state of a listing. Only `Available` is publicly searchable.
    pub enum ListingStatus {
        Available => "AVAILABLE",
        Unavailable => "UNAVAILABLE",
        Sold => "SOLD",
    }
}

string_enum! {
    pub enum FuelType {
        Petrol => "Petrol",
        Diesel => "Diesel",
        Electric => "Electric",
        Hybrid => "Hybrid",
        PlugInHybrid => "Plug-in Hybrid",
    }
}

string_enum! {
    pub enum Transmission {
        Automatic => "Automatic",
        Manual => "Manual",
        SemiAutomatic => "Semi-automatic",
    }
}

string_enum! {
    pub enum BodyType {
        Suv => "SUV",
        Sedan => "Sedan",
        Hatchback => "Hatchback",
        Convertible => "Convertible",
        Coupe => "Coupe",
        Wagon => "Wagon",
        Pickup => "Pickup",
    }
}

impl Default for ListingStatus {
    fn default() -> Self {
        Self::Available
    }
}

/// A single car in the inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub mileage: u32,
    pub color: String,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub body_type: BodyType,
    #[serde(default)]
    pub seats: Option<u8>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default)]
    pub featured: bool,
    /// Image URLs in display order.
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_available(&self) -> bool {
        self.status == ListingStatus::Available
    }

    /// Text the free-text search term is matched against.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.make, self.model, self.description).to_lowercase()
    }
}

/// Listing fields supplied by an admin when adding a car. Identity and
/// timestamps are assigned by the inventory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: Decimal,
    pub mileage: u32,
    pub color: String,
    pub fuel_type: FuelType,
    pub transmission: Transmission,
    pub body_type: BodyType,
    #[serde(default)]
    pub seats: Option<u8>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
}
