//! Radius search queries and per-view search state.
//!
//! [`SearchQuery`] is validated at construction so malformed input is
//! rejected before any network call. [`SearchState`] is the explicit,
//! per-view result state: responses are applied through monotonically
//! increasing sequence tickets, so a slow response from an earlier query can
//! never overwrite the result set of a later one.

use lapak_geo::{haversine_distance_meters, Coordinate};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::ListingRow;

/// Radius slider bounds exposed to buyers, in meters.
#[derive(Debug, Clone, Copy)]
pub struct RadiusBounds {
    pub min_m: f64,
    pub max_m: f64,
}

impl RadiusBounds {
    #[must_use]
    pub fn contains(&self, radius_m: f64) -> bool {
        radius_m >= self.min_m && radius_m <= self.max_m
    }
}

/// Why a search query could not be constructed. Distinct from transport and
/// decode failures: validation rejects the request before it is issued.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("search center is not a finite coordinate")]
    NonFiniteCenter,
    #[error("search center is outside the WGS84 coordinate range")]
    CenterOutOfBounds,
    #[error("search radius must be positive, got {0}")]
    NonPositiveRadius(f64),
    #[error("search radius {radius_m}m is outside the allowed range [{min_m}m, {max_m}m]")]
    RadiusOutOfRange {
        radius_m: f64,
        min_m: f64,
        max_m: f64,
    },
}

/// A validated center-plus-radius search. Constructed per request, never
/// persisted.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery {
    center: Coordinate,
    radius_m: f64,
}

impl SearchQuery {
    /// Build a query, checking the center is finite and in range and the
    /// radius is positive.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] describing the first failed check.
    pub fn new(center: Coordinate, radius_m: f64) -> Result<Self, QueryError> {
        if !center.latitude.is_finite() || !center.longitude.is_finite() {
            return Err(QueryError::NonFiniteCenter);
        }
        if !center.is_in_bounds() {
            return Err(QueryError::CenterOutOfBounds);
        }
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(QueryError::NonPositiveRadius(radius_m));
        }
        Ok(Self { center, radius_m })
    }

    /// Like [`SearchQuery::new`], additionally enforcing the configured
    /// slider bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] describing the first failed check.
    pub fn bounded(
        center: Coordinate,
        radius_m: f64,
        bounds: &RadiusBounds,
    ) -> Result<Self, QueryError> {
        let query = Self::new(center, radius_m)?;
        if !bounds.contains(radius_m) {
            return Err(QueryError::RadiusOutOfRange {
                radius_m,
                min_m: bounds.min_m,
                max_m: bounds.max_m,
            });
        }
        Ok(query)
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        self.center
    }

    #[must_use]
    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }
}

/// One map marker: a listing whose location decoded successfully.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub listing_id: i64,
    pub name: String,
    pub price: Decimal,
    pub position: Coordinate,
    /// Great-circle distance from the search center, in meters.
    pub distance_m: f64,
}

/// Build markers from raw result rows, dropping rows whose location does not
/// decode. Each drop is logged at debug level; nothing here fails.
///
/// Returns the markers and the number of dropped rows.
#[must_use]
pub fn markers_from_rows(center: Coordinate, rows: &[ListingRow]) -> (Vec<Marker>, usize) {
    let mut markers = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match row.location.decode() {
            Ok(position) => markers.push(Marker {
                listing_id: row.id,
                name: row.name.clone(),
                price: row.price,
                position,
                distance_m: haversine_distance_meters(&center, &position),
            }),
            Err(error) => {
                dropped += 1;
                tracing::debug!(listing_id = row.id, %error, "listing omitted from map");
            }
        }
    }

    (markers, dropped)
}

/// Sequence ticket for one issued search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchSeq(u64);

/// What applying a response did to the view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response became the displayed result set.
    Applied { placed: usize, dropped: usize },
    /// A newer request had already resolved; this response was discarded.
    Stale,
}

/// Per-view search result state.
///
/// Responses may resolve out of order; only a response whose ticket is newer
/// than the last applied one may change the state.
#[derive(Debug, Default)]
pub struct SearchState {
    next_seq: u64,
    applied_seq: u64,
    markers: Vec<Marker>,
    last_error: Option<String>,
}

impl SearchState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a request about to be sent.
    pub fn begin(&mut self) -> SearchSeq {
        self.next_seq += 1;
        SearchSeq(self.next_seq)
    }

    /// Apply a successful response: decode rows into markers and make them
    /// the displayed set, unless a newer response already landed.
    pub fn apply_rows(
        &mut self,
        seq: SearchSeq,
        center: Coordinate,
        rows: &[ListingRow],
    ) -> SearchOutcome {
        if seq.0 <= self.applied_seq {
            return SearchOutcome::Stale;
        }
        self.applied_seq = seq.0;

        let (markers, dropped) = markers_from_rows(center, rows);
        let placed = markers.len();
        self.markers = markers;
        self.last_error = None;

        SearchOutcome::Applied { placed, dropped }
    }

    /// Apply a failed response: the view shows an empty result set, not a
    /// hard error. Stale failures are discarded like stale successes.
    pub fn apply_failure(&mut self, seq: SearchSeq, error: &str) -> SearchOutcome {
        if seq.0 <= self.applied_seq {
            return SearchOutcome::Stale;
        }
        self.applied_seq = seq.0;

        self.markers.clear();
        self.last_error = Some(error.to_string());

        SearchOutcome::Applied {
            placed: 0,
            dropped: 0,
        }
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
