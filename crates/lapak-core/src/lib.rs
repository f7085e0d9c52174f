//! Domain model and configuration for the lapak marketplace.
//!
//! Holds the shapes shared across the workspace: listing rows as returned by
//! the hosted backend, validated search queries, the per-view search state
//! with its stale-response guard, user profiles, and env-based application
//! configuration.

mod app_config;
mod config;
mod listing;
mod profile;
pub mod search;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use listing::ListingRow;
pub use profile::{Profile, Role};
pub use search::{
    Marker, QueryError, RadiusBounds, SearchOutcome, SearchQuery, SearchSeq, SearchState,
};
