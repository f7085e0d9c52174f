use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use lapak_core::search::markers_from_rows;
use lapak_core::{ListingRow, Marker, SearchQuery};
use lapak_geo::Coordinate;

use crate::middleware::RequestId;

use super::{map_backend_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RadiusSearchBody {
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct RadiusSearchData {
    /// Result rows exactly as the search procedure returned them.
    products: Vec<ListingRow>,
    /// One marker per row whose location decoded.
    markers: Vec<Marker>,
}

/// `POST /api/v1/products/within-radius`
///
/// Validates the query before any backend call; a backend failure degrades
/// to an empty result set rather than an error response.
pub(super) async fn products_within_radius(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RadiusSearchBody>,
) -> Result<Json<ApiResponse<RadiusSearchData>>, ApiError> {
    let center = Coordinate::new(body.latitude, body.longitude);
    let query = SearchQuery::bounded(center, body.radius_meters, &state.radius)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let data = match state.client.products_within_radius(&query).await {
        Ok(products) => {
            let (markers, dropped) = markers_from_rows(query.center(), &products);
            if dropped > 0 {
                tracing::debug!(dropped, "omitted listings with unreadable locations");
            }
            RadiusSearchData { products, markers }
        }
        Err(error) => {
            tracing::warn!(%error, "radius search failed; presenting empty result set");
            RadiusSearchData {
                products: Vec::new(),
                markers: Vec::new(),
            }
        }
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetailData {
    listing: ListingRow,
    /// Decoded coordinate, or null when the stored location is unreadable;
    /// the listing still renders, just without a map pin.
    position: Option<Coordinate>,
}

/// `GET /api/v1/products/{id}`
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetailData>>, ApiError> {
    let listing = match state.client.get_listing(id).await {
        Ok(listing) => listing,
        Err(lapak_client::ClientError::NotFound) => {
            return Err(ApiError::new(
                req_id.0,
                "not_found",
                format!("no listing with id {id}"),
            ));
        }
        Err(error) => return Err(map_backend_error(req_id.0, &error)),
    };

    let position = match listing.location.decode() {
        Ok(coordinate) => Some(coordinate),
        Err(error) => {
            tracing::debug!(listing_id = id, %error, "listing location did not decode");
            None
        }
    };

    Ok(Json(ApiResponse {
        data: ProductDetailData { listing, position },
        meta: ResponseMeta::new(req_id.0),
    }))
}
