//! The backend HTTP client and the radius search call.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use lapak_core::{AppConfig, ListingRow, SearchQuery};

use crate::error::ClientError;

/// Client for the hosted marketplace backend.
///
/// Owns the HTTP client, base URL, and the anonymous API key every request
/// carries. Use [`BackendClient::new`] for production or point `base_url` at
/// a mock server in tests. Requests run under a bounded timeout; there are no
/// retries and no caching, each call is one request scoped to the calling
/// action.
pub struct BackendClient {
    client: Client,
    base_url: Url,
    anon_key: String,
}

impl BackendClient {
    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, anon_key: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("lapak/0.1 (marketplace)")
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join appends paths instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|_| ClientError::InvalidBaseUrl(base_url.to_string()))?;

        Ok(Self {
            client,
            base_url,
            anon_key: anon_key.to_owned(),
        })
    }

    /// Creates a client from application configuration.
    ///
    /// # Errors
    ///
    /// See [`BackendClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.backend_url,
            &config.anon_key,
            config.request_timeout_secs,
        )
    }

    /// Calls the geospatial search procedure with a validated query and
    /// returns the result rows unmodified, location fields still encoded.
    ///
    /// Returns an empty vec when nothing is in range. No ordering is imposed
    /// beyond what the procedure provides.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::Api`] if the procedure answers with a non-2xx status.
    /// - [`ClientError::Deserialize`] if the response rows do not match the
    ///   expected shape.
    pub async fn products_within_radius(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<ListingRow>, ClientError> {
        let url = self.endpoint("rest/v1/rpc/products_within_radius")?;
        let payload = json!({
            "user_lat": query.center().latitude,
            "user_lon": query.center().longitude,
            "user_radius": query.radius_m(),
        });

        let response = self
            .authed(self.client.post(url), None)
            .json(&payload)
            .send()
            .await?;

        Self::expect_json(response, "products_within_radius").await
    }

    /// Checks the auth collaborator's health endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] or [`ClientError::Api`] when the backend
    /// is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), ClientError> {
        let url = self.endpoint("auth/v1/health")?;
        let response = self.authed(self.client.get(url), None).send().await?;
        Self::check(response).await.map(|_| ())
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|_| ClientError::InvalidBaseUrl(format!("{}{path}", self.base_url)))
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Attaches the `apikey` header and a bearer token: the caller's session
    /// token when present, the anonymous key otherwise.
    pub(crate) fn authed(&self, request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(&self.anon_key);
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    pub(crate) async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            body,
        })
    }

    pub(crate) async fn expect_json<T: DeserializeOwned>(
        response: Response,
        context: &str,
    ) -> Result<T, ClientError> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}
