//! Owner-scoped listing CRUD against the relational REST interface.
//!
//! New positions are written as WKT `POINT(<lon> <lat>)`, longitude first,
//! matching what the geospatial column expects. Mutations always filter on
//! `seller_id` as well as `id`, so a seller can only ever touch their own
//! rows; a mutation that matches nothing resolves to `NotFound`.

use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use lapak_core::ListingRow;
use lapak_geo::Coordinate;

use crate::auth::Session;
use crate::client::BackendClient;
use crate::error::ClientError;

/// An image payload to upload for a listing.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// File extension without the dot, e.g. `"jpg"`.
    pub extension: String,
}

/// Input for creating a listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub contact: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub image: ImageUpload,
}

/// Partial update for a listing; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ListingChanges {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub contact: Option<String>,
    /// New position as (latitude, longitude).
    pub position: Option<(f64, f64)>,
    pub image: Option<ImageUpload>,
}

fn wkt_point(latitude: f64, longitude: f64) -> Result<String, ClientError> {
    if !Coordinate::new(latitude, longitude).is_in_bounds() {
        return Err(ClientError::InvalidListing(format!(
            "position ({latitude}, {longitude}) is not a valid coordinate"
        )));
    }
    Ok(format!("POINT({longitude} {latitude})"))
}

impl BackendClient {
    /// Creates a listing: uploads the image, then inserts the row tagged with
    /// the session's user id.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidListing`] if the position is not a valid
    ///   coordinate or the price is negative; rejected before any request.
    /// - Upload and insert failures as [`ClientError::Api`] /
    ///   [`ClientError::Http`] / [`ClientError::Deserialize`].
    pub async fn create_listing(
        &self,
        session: &Session,
        new: &NewListing,
    ) -> Result<ListingRow, ClientError> {
        let location = wkt_point(new.latitude, new.longitude)?;
        if new.price < Decimal::ZERO {
            return Err(ClientError::InvalidListing(format!(
                "price must be non-negative, got {}",
                new.price
            )));
        }

        let image_url = self.upload_listing_image(session, &new.image).await?;

        let url = self.endpoint("rest/v1/products")?;
        let response = self
            .authed(self.http().post(url), Some(&session.access_token))
            .header("Prefer", "return=representation")
            .json(&json!({
                "name": new.name,
                "price": new.price,
                "description": new.description,
                "image_url": image_url,
                "seller_id": session.user.id,
                "location": location,
                "contact": new.contact,
            }))
            .send()
            .await?;

        let rows: Vec<ListingRow> = Self::expect_json(response, "create_listing").await?;
        rows.into_iter().next().ok_or(ClientError::NotFound)
    }

    /// Fetches one listing by id.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] if no such row exists; transport errors as
    /// usual.
    pub async fn get_listing(&self, id: i64) -> Result<ListingRow, ClientError> {
        let mut url = self.endpoint("rest/v1/products")?;
        url.set_query(Some(&format!("id=eq.{id}&select=*")));

        let response = self.authed(self.http().get(url), None).send().await?;
        let rows: Vec<ListingRow> = Self::expect_json(response, "get_listing").await?;
        rows.into_iter().next().ok_or(ClientError::NotFound)
    }

    /// Lists the signed-in seller's own listings, newest first.
    ///
    /// # Errors
    ///
    /// Transport and deserialization errors as usual.
    pub async fn list_listings_by_seller(
        &self,
        session: &Session,
    ) -> Result<Vec<ListingRow>, ClientError> {
        let mut url = self.endpoint("rest/v1/products")?;
        url.set_query(Some(&format!(
            "seller_id=eq.{}&select=*&order=created_at.desc",
            session.user.id
        )));

        let response = self
            .authed(self.http().get(url), Some(&session.access_token))
            .send()
            .await?;
        Self::expect_json(response, "list_listings_by_seller").await
    }

    /// Updates a listing owned by the session user.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidListing`] on a bad new position or negative
    ///   price.
    /// - [`ClientError::NotFound`] if the row does not exist or belongs to
    ///   someone else.
    pub async fn update_listing(
        &self,
        session: &Session,
        id: i64,
        changes: &ListingChanges,
    ) -> Result<ListingRow, ClientError> {
        let mut patch = Map::new();
        if let Some(name) = &changes.name {
            patch.insert("name".to_owned(), json!(name));
        }
        if let Some(price) = &changes.price {
            if *price < Decimal::ZERO {
                return Err(ClientError::InvalidListing(format!(
                    "price must be non-negative, got {price}"
                )));
            }
            patch.insert("price".to_owned(), json!(price));
        }
        if let Some(description) = &changes.description {
            patch.insert("description".to_owned(), json!(description));
        }
        if let Some(contact) = &changes.contact {
            patch.insert("contact".to_owned(), json!(contact));
        }
        if let Some((latitude, longitude)) = changes.position {
            patch.insert("location".to_owned(), json!(wkt_point(latitude, longitude)?));
        }
        if let Some(image) = &changes.image {
            let image_url = self.upload_listing_image(session, image).await?;
            patch.insert("image_url".to_owned(), json!(image_url));
        }

        let mut url = self.endpoint("rest/v1/products")?;
        url.set_query(Some(&format!(
            "id=eq.{id}&seller_id=eq.{}",
            session.user.id
        )));

        let response = self
            .authed(self.http().patch(url), Some(&session.access_token))
            .header("Prefer", "return=representation")
            .json(&Value::Object(patch))
            .send()
            .await?;

        let rows: Vec<ListingRow> = Self::expect_json(response, "update_listing").await?;
        rows.into_iter().next().ok_or(ClientError::NotFound)
    }

    /// Deletes a listing owned by the session user.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] if the row does not exist or belongs to
    /// someone else; transport errors as usual.
    pub async fn delete_listing(&self, session: &Session, id: i64) -> Result<(), ClientError> {
        let mut url = self.endpoint("rest/v1/products")?;
        url.set_query(Some(&format!(
            "id=eq.{id}&seller_id=eq.{}",
            session.user.id
        )));

        let response = self
            .authed(self.http().delete(url), Some(&session.access_token))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<ListingRow> = Self::expect_json(response, "delete_listing").await?;
        if rows.is_empty() {
            return Err(ClientError::NotFound);
        }
        Ok(())
    }
}
