use thiserror::Error;

/// Why a raw location value could not be normalized into a coordinate.
///
/// Decode failure is a normal, expected outcome: callers drop the affected
/// listing from the map and keep going. Nothing in this enum is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The location value was null or absent.
    #[error("location value is missing")]
    Missing,

    /// The value matched none of the known encodings.
    #[error("unrecognised location shape")]
    UnrecognisedShape,

    /// The value looked like WKT but did not parse as `POINT(<lon> <lat>)`.
    #[error("invalid WKT point: {0}")]
    InvalidWkt(String),

    /// The value looked like hex geometry but was not valid hex.
    #[error("invalid hex geometry: {0}")]
    InvalidHex(String),

    /// The decoded byte buffer is too short to contain the coordinate payload.
    #[error("geometry buffer truncated: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    /// The geometry header carries a non-point type code.
    #[error("unsupported geometry type code {0:#010x}")]
    UnsupportedGeometry(u32),

    /// A coordinate parsed but was NaN or infinite.
    #[error("coordinate is not a finite number")]
    NonFinite,
}
