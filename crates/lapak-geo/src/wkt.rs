//! WKT `POINT` text parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::DecodeError;

static POINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^\s*POINT\s*\(\s*
          ([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s+
          ([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*\)\s*$",
    )
    .expect("valid regex")
});

/// Parse `POINT(<lon> <lat>)` text, whitespace tolerant.
///
/// Returns the pair in storage order (longitude, latitude).
pub(crate) fn parse_point(text: &str) -> Result<(f64, f64), DecodeError> {
    let caps = POINT_RE
        .captures(text)
        .ok_or_else(|| DecodeError::InvalidWkt(text.trim().to_string()))?;

    let lon: f64 = caps[1]
        .parse()
        .map_err(|_| DecodeError::InvalidWkt(text.trim().to_string()))?;
    let lat: f64 = caps[2]
        .parse()
        .map_err(|_| DecodeError::InvalidWkt(text.trim().to_string()))?;

    if !lon.is_finite() || !lat.is_finite() {
        return Err(DecodeError::NonFinite);
    }

    Ok((lon, lat))
}
