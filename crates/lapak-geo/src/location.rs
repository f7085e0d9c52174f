//! Classification and decoding of raw location values.
//!
//! The encoding of the `location` column changed over the application's
//! history, so a row may carry WKT text, hex-encoded binary geometry, or a
//! GeoJSON-shaped object. [`RawLocation`] models that as an explicit tagged
//! union: classification happens once, at deserialization time, and new
//! encodings become new variants rather than more sniffing at call sites.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{wkb, wkt, Coordinate, DecodeError};

/// A GeoJSON-shaped point: `{"type": "Point", "coordinates": [lon, lat, ...]}`
/// or the bare `{"coordinates": [lon, lat, ...]}` form some driver versions
/// return.
///
/// Coordinate elements are kept as raw JSON values because the backend has
/// been observed to return numbers as strings; [`RawLocation::decode`]
/// accepts both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub coordinates: Vec<Value>,
}

/// A listing's location value as stored, before any decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLocation {
    /// GeoJSON-shaped object with a coordinate sequence.
    Geo(GeoPoint),
    /// WKT-style text, e.g. `POINT(106.8456 -6.2088)`.
    Wkt(String),
    /// Hex-encoded binary geometry.
    WkbHex(String),
    /// Null or absent.
    Missing,
    /// Anything else, preserved for logging.
    Unknown(Value),
}

impl Default for RawLocation {
    fn default() -> Self {
        Self::Missing
    }
}

impl RawLocation {
    /// Classify a raw JSON value into a location variant. Total: every value
    /// maps to some variant, malformed ones to [`RawLocation::Unknown`].
    #[must_use]
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Null => Self::Missing,
            Value::Object(map) => {
                let coords = map.get("coordinates").and_then(Value::as_array);
                match coords {
                    Some(array) if array.len() >= 2 => Self::Geo(GeoPoint {
                        kind: map
                            .get("type")
                            .and_then(Value::as_str)
                            .map(ToOwned::to_owned),
                        coordinates: array.clone(),
                    }),
                    _ => Self::Unknown(value.clone()),
                }
            }
            Value::String(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Self::Missing
                } else if trimmed.starts_with("POINT") {
                    Self::Wkt(text.clone())
                } else if looks_like_hex(trimmed) {
                    Self::WkbHex(text.clone())
                } else {
                    Self::Unknown(value.clone())
                }
            }
            _ => Self::Unknown(value.clone()),
        }
    }

    /// Decode into a coordinate, trying the encodings in a fixed order:
    /// structured object, then WKT text, then hex binary.
    ///
    /// Longitude is stored first in every encoding; the returned
    /// [`Coordinate`] presents (latitude, longitude).
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] describing why the value could not be
    /// normalized. This is a normal outcome; callers omit the listing from
    /// the map and continue.
    pub fn decode(&self) -> Result<Coordinate, DecodeError> {
        let (lon, lat) = match self {
            Self::Geo(point) => {
                let lon = point
                    .coordinates
                    .first()
                    .ok_or(DecodeError::UnrecognisedShape)
                    .and_then(coordinate_element)?;
                let lat = point
                    .coordinates
                    .get(1)
                    .ok_or(DecodeError::UnrecognisedShape)
                    .and_then(coordinate_element)?;
                (lon, lat)
            }
            Self::Wkt(text) => wkt::parse_point(text)?,
            Self::WkbHex(text) => wkb::parse_point_hex(text)?,
            Self::Missing => return Err(DecodeError::Missing),
            Self::Unknown(_) => return Err(DecodeError::UnrecognisedShape),
        };

        if !lon.is_finite() || !lat.is_finite() {
            return Err(DecodeError::NonFinite);
        }

        Ok(Coordinate::new(lat, lon))
    }
}

/// Pass-through representation: an already-decoded coordinate round-trips
/// through [`RawLocation::decode`] unchanged.
impl From<Coordinate> for RawLocation {
    fn from(coordinate: Coordinate) -> Self {
        Self::Geo(GeoPoint {
            kind: Some("Point".to_owned()),
            coordinates: vec![
                Value::from(coordinate.longitude),
                Value::from(coordinate.latitude),
            ],
        })
    }
}

impl<'de> Deserialize<'de> for RawLocation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::classify(&value))
    }
}

impl Serialize for RawLocation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Geo(point) => point.serialize(serializer),
            Self::Wkt(text) | Self::WkbHex(text) => serializer.serialize_str(text),
            Self::Missing => serializer.serialize_none(),
            Self::Unknown(value) => value.serialize(serializer),
        }
    }
}

/// Classify and decode a raw JSON value in one step.
///
/// # Errors
///
/// See [`RawLocation::decode`].
pub fn decode_value(value: &Value) -> Result<Coordinate, DecodeError> {
    RawLocation::classify(value).decode()
}

fn coordinate_element(value: &Value) -> Result<f64, DecodeError> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or(DecodeError::NonFinite)
}

fn looks_like_hex(text: &str) -> bool {
    text.len() % 2 == 0 && !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const JAKARTA_WKT: &str = "POINT(106.8456 -6.2088)";
    const JAKARTA_HEX: &str = "0101000020E6100000D95F764F1EB65A40849ECDAACFD518C0";

    fn assert_jakarta(coordinate: Coordinate) {
        assert!(
            (coordinate.latitude - (-6.2088)).abs() < 1e-9,
            "lat was {}",
            coordinate.latitude
        );
        assert!(
            (coordinate.longitude - 106.8456).abs() < 1e-9,
            "lon was {}",
            coordinate.longitude
        );
    }

    #[test]
    fn all_encodings_of_one_point_decode_identically() {
        let variants = [
            json!(JAKARTA_WKT),
            json!(JAKARTA_HEX),
            json!({"type": "Point", "coordinates": [106.8456, -6.2088]}),
            json!({"coordinates": [106.8456, -6.2088]}),
        ];
        for value in &variants {
            assert_jakarta(decode_value(value).expect("should decode"));
        }
    }

    #[test]
    fn axis_order_is_never_swapped() {
        let coordinate = decode_value(&json!("POINT(106.8 -6.2)")).expect("should decode");
        assert!((coordinate.latitude - (-6.2)).abs() < 1e-9);
        assert!((coordinate.longitude - 106.8).abs() < 1e-9);
    }

    #[test]
    fn decode_is_idempotent_for_pass_through_values() {
        let original = Coordinate::new(-6.2088, 106.8456);
        let decoded = RawLocation::from(original).decode().expect("should decode");
        assert!((decoded.latitude - original.latitude).abs() < 1e-9);
        assert!((decoded.longitude - original.longitude).abs() < 1e-9);
    }

    #[test]
    fn malformed_inputs_fail_without_panicking() {
        let cases = [
            json!(null),
            json!(""),
            json!("POINT()"),
            json!("0101000020E61000"),
            json!(42),
            json!(["not", "a", "point"]),
            json!({"coordinates": "nope"}),
            json!({"type": "Point"}),
        ];
        for value in &cases {
            assert!(decode_value(value).is_err(), "expected failure for {value}");
        }
    }

    #[test]
    fn geojson_with_string_numbers_decodes() {
        let value = json!({"type": "Point", "coordinates": ["106.8456", "-6.2088"]});
        assert_jakarta(decode_value(&value).expect("should decode"));
    }

    #[test]
    fn geojson_with_altitude_ignores_extra_elements() {
        let value = json!({"type": "Point", "coordinates": [106.8456, -6.2088, 12.5]});
        assert_jakarta(decode_value(&value).expect("should decode"));
    }

    #[test]
    fn classify_null_as_missing() {
        assert_eq!(RawLocation::classify(&json!(null)), RawLocation::Missing);
        assert_eq!(RawLocation::classify(&json!("  ")), RawLocation::Missing);
    }

    #[test]
    fn classify_keeps_unrecognised_values() {
        let value = json!({"lat": 1.0, "lng": 2.0});
        assert!(matches!(
            RawLocation::classify(&value),
            RawLocation::Unknown(_)
        ));
    }

    #[test]
    fn classify_wkt_prefix_even_when_malformed() {
        // Malformed WKT is still a WKT-shaped value; decode reports the detail.
        let raw = RawLocation::classify(&json!("POINT()"));
        assert!(matches!(raw, RawLocation::Wkt(_)));
        assert!(matches!(raw.decode(), Err(DecodeError::InvalidWkt(_))));
    }

    #[test]
    fn deserializes_inside_a_row_shape() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default)]
            location: RawLocation,
        }

        let with_wkt: Row =
            serde_json::from_value(json!({"location": JAKARTA_WKT})).expect("should deserialize");
        assert_jakarta(with_wkt.location.decode().expect("should decode"));

        let with_null: Row =
            serde_json::from_value(json!({"location": null})).expect("should deserialize");
        assert_eq!(with_null.location, RawLocation::Missing);

        let absent: Row = serde_json::from_value(json!({})).expect("should deserialize");
        assert_eq!(absent.location, RawLocation::Missing);
    }

    #[test]
    fn serializes_back_to_the_stored_shape() {
        let wkt = RawLocation::Wkt(JAKARTA_WKT.to_owned());
        assert_eq!(serde_json::to_value(&wkt).expect("serialize"), json!(JAKARTA_WKT));

        let missing = RawLocation::Missing;
        assert_eq!(serde_json::to_value(&missing).expect("serialize"), json!(null));
    }
}
