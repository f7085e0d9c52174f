//! The map-view search controller.
//!
//! One `MapSearch` owns the search state for one view. Refreshes are
//! sequenced: the ticket is taken before the request goes out, and the
//! response is applied through the stale guard, so when two refreshes overlap
//! the later-issued one's rows are displayed regardless of arrival order.

use std::sync::Arc;

use tokio::sync::Mutex;

use lapak_core::{Marker, SearchQuery, SearchState};

use crate::client::BackendClient;
use crate::error::ClientError;

/// A copy of the view state after a refresh: the markers to render and the
/// last surfaced failure, if any.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    pub markers: Vec<Marker>,
    pub last_error: Option<String>,
}

/// Per-view radius search controller.
pub struct MapSearch {
    client: Arc<BackendClient>,
    state: Mutex<SearchState>,
}

impl MapSearch {
    #[must_use]
    pub fn new(client: Arc<BackendClient>) -> Self {
        Self {
            client,
            state: Mutex::new(SearchState::new()),
        }
    }

    /// Runs one radius search and applies the result to the view state.
    ///
    /// Transport and remote failures never escape: they degrade to an empty
    /// result set with the failure logged once and recorded in the snapshot.
    /// A response that loses the sequencing race leaves the newer result set
    /// in place.
    pub async fn refresh(&self, query: &SearchQuery) -> SearchSnapshot {
        let seq = {
            let mut state = self.state.lock().await;
            state.begin()
        };

        // The lock is not held across the request: overlapping refreshes
        // proceed concurrently and settle through the sequence guard.
        let result: Result<_, ClientError> = self.client.products_within_radius(query).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(rows) => {
                state.apply_rows(seq, query.center(), &rows);
            }
            Err(error) => {
                tracing::warn!(%error, "radius search failed; presenting empty result set");
                state.apply_failure(seq, &error.to_string());
            }
        }

        SearchSnapshot {
            markers: state.markers().to_vec(),
            last_error: state.last_error().map(ToOwned::to_owned),
        }
    }

    /// The current view state without issuing a request.
    pub async fn snapshot(&self) -> SearchSnapshot {
        let state = self.state.lock().await;
        SearchSnapshot {
            markers: state.markers().to_vec(),
            last_error: state.last_error().map(ToOwned::to_owned),
        }
    }
}
