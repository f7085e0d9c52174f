//! Hex-encoded binary geometry parsing.
//!
//! The backend returns geography columns as hex-encoded WKB. Historically
//! these buffers were read at hard-coded byte offsets (9 for longitude, 17
//! for latitude), which only holds for the little-endian, SRID-carrying form.
//! This parser reads the header explicitly instead: byte-order flag, geometry
//! type with its extension flag bits, and the optional SRID field, so
//! SRID-less and big-endian buffers decode too and everything else is a typed
//! failure rather than a guess.

use crate::DecodeError;

// Type-code flag bits for extended WKB.
const FLAG_Z: u32 = 0x8000_0000;
const FLAG_M: u32 = 0x4000_0000;
const FLAG_SRID: u32 = 0x2000_0000;

const POINT: u32 = 1;

/// Parse a hex string containing a binary-encoded point.
///
/// Returns the pair in storage order (longitude, latitude).
pub(crate) fn parse_point_hex(text: &str) -> Result<(f64, f64), DecodeError> {
    let bytes = hex::decode(text.trim()).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    parse_point(&bytes)
}

fn parse_point(buf: &[u8]) -> Result<(f64, f64), DecodeError> {
    let mut reader = Reader { buf, pos: 0 };

    // First byte: 1 = little-endian, anything else big-endian.
    let little_endian = reader.take_u8()? == 1;

    let raw_type = reader.take_u32(little_endian)?;
    let mut base_type = raw_type & !(FLAG_Z | FLAG_M | FLAG_SRID);
    // ISO-style variants offset the type code by 1000 per extra dimension.
    if base_type > 1000 {
        base_type %= 1000;
    }
    if base_type != POINT {
        return Err(DecodeError::UnsupportedGeometry(raw_type));
    }

    if raw_type & FLAG_SRID != 0 {
        reader.skip(4)?;
    }

    // Longitude is always stored first, latitude second. Z/M payloads, when
    // present, follow the first two doubles and are ignored.
    let lon = reader.take_f64(little_endian)?;
    let lat = reader.take_f64(little_endian)?;

    if !lon.is_finite() || !lat.is_finite() {
        return Err(DecodeError::NonFinite);
    }

    Ok((lon, lat))
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take(&mut self, n: usize) -> Result<&[u8], DecodeError> {
        let end = self.pos + n;
        let slice = self.buf.get(self.pos..end).ok_or(DecodeError::Truncated {
            needed: end,
            got: self.buf.len(),
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn take_u32(&mut self, little_endian: bool) -> Result<u32, DecodeError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().expect("slice length checked");
        Ok(if little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn take_f64(&mut self, little_endian: bool) -> Result<f64, DecodeError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().expect("slice length checked");
        Ok(if little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }
}
