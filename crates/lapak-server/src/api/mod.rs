mod products;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use lapak_client::BackendClient;
use lapak_core::RadiusBounds;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<BackendClient>,
    pub radius: RadiusBounds,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    backend: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_backend_error(
    request_id: String,
    error: &lapak_client::ClientError,
) -> ApiError {
    tracing::error!(%error, "backend call failed");
    ApiError::new(request_id, "internal_error", "backend call failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/products/within-radius",
            post(products::products_within_radius),
        )
        .route("/api/v1/products/{id}", get(products::get_product))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match state.client.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    backend: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: backend unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        backend: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_state(backend_url: &str) -> AppState {
        let client = BackendClient::new(backend_url, "test-anon-key", 5)
            .expect("client construction should not fail");
        AppState {
            client: Arc::new(client),
            radius: RadiusBounds {
                min_m: 100.0,
                max_m: 5000.0,
            },
        }
    }

    fn test_app(backend_url: &str) -> Router {
        let auth = AuthState::from_env(true).expect("auth state");
        build_app(test_state(backend_url), auth, default_rate_limit_state())
    }

    fn radius_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/products/within-radius")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "no such listing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn within_radius_rejects_an_out_of_range_radius() {
        // Backend must not be contacted at all; an unmounted mock server
        // makes any call visible as an internal error instead of a 400.
        let backend = MockServer::start().await;
        let app = test_app(&backend.uri());

        let response = app
            .oneshot(radius_request(json!({
                "latitude": -6.2088,
                "longitude": 106.8456,
                "radius_meters": 50000.0,
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn within_radius_rejects_a_non_finite_center() {
        let backend = MockServer::start().await;
        let app = test_app(&backend.uri());

        // JSON has no NaN; an out-of-range latitude exercises the same path.
        let response = app
            .oneshot(radius_request(json!({
                "latitude": 123.0,
                "longitude": 106.8456,
                "radius_meters": 1000.0,
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn within_radius_returns_rows_and_decoded_markers() {
        let backend = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/products_within_radius"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1,
                    "name": "Speaker bekas",
                    "price": 150000,
                    "seller_id": "7f9c24e5-42e5-44b8-8a0b-6b0a8df9f5a4",
                    "location": "POINT(106.8 -6.2)"
                },
                {
                    "id": 2,
                    "name": "Kursi",
                    "price": 50000,
                    "seller_id": "7f9c24e5-42e5-44b8-8a0b-6b0a8df9f5a4",
                    "location": null
                }
            ])))
            .mount(&backend)
            .await;

        let app = test_app(&backend.uri());
        let response = app
            .oneshot(radius_request(json!({
                "latitude": -6.2088,
                "longitude": 106.8456,
                "radius_meters": 1000.0,
            })))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;

        // Both rows are returned raw; only the decodable one gets a marker.
        assert_eq!(body["data"]["products"].as_array().expect("products").len(), 2);
        let markers = body["data"]["markers"].as_array().expect("markers");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0]["listing_id"], 1);
        assert_eq!(markers[0]["position"]["latitude"], -6.2);
    }

    #[tokio::test]
    async fn within_radius_degrades_to_no_results_on_backend_failure() {
        let backend = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/products_within_radius"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&backend)
            .await;

        let app = test_app(&backend.uri());
        let response = app
            .oneshot(radius_request(json!({
                "latitude": -6.2088,
                "longitude": 106.8456,
                "radius_meters": 1000.0,
            })))
            .await
            .expect("response");

        // The UI sees an empty result set, not a hard error.
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["products"].as_array().expect("products").len(), 0);
        assert_eq!(body["data"]["markers"].as_array().expect("markers").len(), 0);
    }

    #[tokio::test]
    async fn product_detail_includes_a_position_when_the_location_decodes() {
        let backend = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 42,
                "name": "Speaker bekas",
                "price": 150000,
                "seller_id": "7f9c24e5-42e5-44b8-8a0b-6b0a8df9f5a4",
                "location": "0101000020E6100000D95F764F1EB65A40849ECDAACFD518C0"
            }])))
            .mount(&backend)
            .await;

        let app = test_app(&backend.uri());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/products/42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let position = &body["data"]["position"];
        assert!((position["latitude"].as_f64().expect("lat") - (-6.2088)).abs() < 1e-9);
        assert!((position["longitude"].as_f64().expect("lon") - 106.8456).abs() < 1e-9);
    }

    #[tokio::test]
    async fn product_detail_with_an_unreadable_location_has_a_null_position() {
        let backend = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": 42,
                "name": "Speaker bekas",
                "price": 150000,
                "seller_id": "7f9c24e5-42e5-44b8-8a0b-6b0a8df9f5a4",
                "location": "not-a-location"
            }])))
            .mount(&backend)
            .await;

        let app = test_app(&backend.uri());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/products/42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["data"]["position"].is_null());
        assert_eq!(body["data"]["listing"]["id"], 42);
    }

    #[tokio::test]
    async fn product_detail_for_a_missing_row_is_404() {
        let backend = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&backend)
            .await;

        let app = test_app(&backend.uri());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/products/404")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn responses_carry_a_request_id_header() {
        let backend = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&backend)
            .await;

        let app = test_app(&backend.uri());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-from-caller")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-from-caller")
        );
    }
}
