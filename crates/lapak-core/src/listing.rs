use chrono::{DateTime, Utc};
use lapak_geo::RawLocation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product listing row as returned by the hosted backend, from the radius
/// search procedure and from the `products` table alike.
///
/// `location` stays raw here: rows travel through the query pipeline
/// undecoded and are only normalized when a marker is built, so one listing
/// with an unreadable location never poisons the rest of the result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRow {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub seller_id: Uuid,
    #[serde(default)]
    pub location: RawLocation,
    /// Seller contact number, optional on older rows.
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
