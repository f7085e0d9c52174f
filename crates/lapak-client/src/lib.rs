//! HTTP client for the hosted marketplace backend.
//!
//! Wraps `reqwest` with typed calls against the backend's external
//! collaborators: the geospatial search procedure, the relational REST
//! interface for listings and profiles, the auth/session service, and object
//! storage for listing images. Rows come back with their location fields
//! still raw; decoding happens in the marker pipeline, never in transport.

mod auth;
mod client;
mod error;
mod listings;
mod search;
mod storage;

pub use auth::{AuthUser, Session};
pub use client::BackendClient;
pub use error::ClientError;
pub use listings::{ImageUpload, ListingChanges, NewListing};
pub use search::{MapSearch, SearchSnapshot};
