use thiserror::Error;

/// Errors returned by the backend client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL does not parse.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// A filtered read or owner-scoped mutation matched no row.
    #[error("record not found")]
    NotFound,

    /// Listing input rejected before any request was issued.
    #[error("invalid listing: {0}")]
    InvalidListing(String),
}
