//! Encode and decode polyline geometry strings.
//!
//! Routing engines ship path geometry as polylines: each coordinate is scaled
//! to an integer, delta-coded against the previous point, zigzag-mapped into
//! unsigned space, and written least-significant-first in 5-bit chunks offset
//! by 63. `precision` selects the scaling exponent; GraphHopper emits
//! precision 5, OSRM offers precision 6 as `polyline6`.
//!
//! Decoding is strict: input that ends mid-value or contains bytes outside
//! the printable alphabet yields a [`PolylineError`] rather than a silently
//! truncated path.
#![forbid(unsafe_code)]

use geo::Coord;
use thiserror::Error;

/// Errors raised while decoding a polyline string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    /// The input ended before a coordinate value was complete.
    #[error("polyline input ended mid-value at byte {position}")]
    UnexpectedEnd {
        /// Byte offset at which more input was required.
        position: usize,
    },
    /// A byte fell outside the polyline alphabet (`?`..=`~`).
    #[error("invalid polyline character {character:?} at byte {position}")]
    InvalidCharacter {
        /// The offending character.
        character: char,
        /// Byte offset of the offending character.
        position: usize,
    },
    /// A single value ran past the representable delta range.
    #[error("polyline value overflowed at byte {position}")]
    ValueOverflow {
        /// Byte offset of the chunk that overflowed.
        position: usize,
    },
}

/// Every encoded byte is offset by 63 to land in the printable range.
const CHUNK_OFFSET: u8 = 63;
/// Highest byte the alphabet produces (`0x3f` payload plus the offset).
const CHUNK_MAX: u8 = 126;
/// Bit 6 marks a chunk as continued.
const CONTINUATION_BIT: u64 = 0x20;
/// Low five bits of each chunk carry payload.
const PAYLOAD_MASK: u64 = 0x1f;
/// Largest shift that keeps the next payload chunk inside 63 bits.
const MAX_SHIFT: u32 = 58;

/// Decode a polyline into planar coordinates.
///
/// `precision` is the number of decimal digits the encoder preserved: 5 for
/// the classic encoding, 6 for OSRM's `polyline6`. Coordinates are returned
/// with `x` = longitude and `y` = latitude.
///
/// # Errors
///
/// Returns [`PolylineError`] when the input ends mid-value, contains a byte
/// outside the polyline alphabet, or carries a value that overflows the
/// delta range.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use waypost_core::polyline;
///
/// let path = polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@", 5)?;
/// assert_eq!(
///     path,
///     vec![
///         Coord { x: -120.2, y: 38.5 },
///         Coord { x: -120.95, y: 40.7 },
///         Coord { x: -126.453, y: 43.252 },
///     ],
/// );
/// # Ok::<(), polyline::PolylineError>(())
/// ```
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coord<f64>>, PolylineError> {
    decode_values(encoded, precision, Layout::Planar)
}

/// Decode a polyline whose points carry a third elevation component.
///
/// GraphHopper interleaves elevation when `elevation=true`; the third value
/// of each triple is validated and discarded, returning planar coordinates.
///
/// # Errors
///
/// Returns [`PolylineError`] under the same conditions as [`decode`]; a
/// point whose elevation component is missing counts as truncated input.
pub fn decode_elevation(encoded: &str, precision: u32) -> Result<Vec<Coord<f64>>, PolylineError> {
    decode_values(encoded, precision, Layout::WithElevation)
}

/// Encode coordinates into a polyline string.
///
/// The inverse of [`decode`] for finite WGS84 coordinates: values are scaled
/// by `10^precision`, rounded to the nearest integer, and delta-coded.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use waypost_core::polyline;
///
/// let encoded = polyline::encode(
///     &[
///         Coord { x: -120.2, y: 38.5 },
///         Coord { x: -120.95, y: 40.7 },
///         Coord { x: -126.453, y: 43.252 },
///     ],
///     5,
/// );
/// assert_eq!(encoded, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// ```
#[must_use]
pub fn encode(coordinates: &[Coord<f64>], precision: u32) -> String {
    let scale = scale_for(precision);
    let mut output = String::new();
    let mut previous_latitude = 0_i64;
    let mut previous_longitude = 0_i64;
    for coordinate in coordinates {
        let latitude = to_scaled(coordinate.y, scale);
        let longitude = to_scaled(coordinate.x, scale);
        // Deltas wrap rather than panic when callers pass non-finite
        // coordinates; such input saturates the scaling cast.
        write_value(latitude.wrapping_sub(previous_latitude), &mut output);
        write_value(longitude.wrapping_sub(previous_longitude), &mut output);
        previous_latitude = latitude;
        previous_longitude = longitude;
    }
    output
}

/// Component layout of each encoded point.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Layout {
    Planar,
    WithElevation,
}

fn decode_values(
    encoded: &str,
    precision: u32,
    layout: Layout,
) -> Result<Vec<Coord<f64>>, PolylineError> {
    let scale = scale_for(precision);
    let mut reader = ChunkReader::new(encoded);
    let mut coordinates = Vec::new();
    let mut latitude = 0_i64;
    let mut longitude = 0_i64;
    while let Some(latitude_delta) = reader.next_value()? {
        latitude = latitude.wrapping_add(latitude_delta);
        longitude = longitude.wrapping_add(reader.require_value()?);
        if layout == Layout::WithElevation {
            // The elevation component must be present but is not surfaced.
            reader.require_value()?;
        }
        coordinates.push(Coord {
            x: to_degrees(longitude, scale),
            y: to_degrees(latitude, scale),
        });
    }
    Ok(coordinates)
}

/// Streaming reader over the 5-bit chunk alphabet.
struct ChunkReader<'a> {
    bytes: std::iter::Enumerate<std::str::Bytes<'a>>,
    len: usize,
}

impl<'a> ChunkReader<'a> {
    fn new(encoded: &'a str) -> Self {
        Self {
            bytes: encoded.bytes().enumerate(),
            len: encoded.len(),
        }
    }

    /// Read the next zigzag-decoded value, or `None` at a clean boundary.
    fn next_value(&mut self) -> Result<Option<i64>, PolylineError> {
        match self.bytes.next() {
            None => Ok(None),
            Some(first) => self.value_from(first).map(Some),
        }
    }

    /// Read a value that must be present, treating end of input as an error.
    fn require_value(&mut self) -> Result<i64, PolylineError> {
        let first = self
            .bytes
            .next()
            .ok_or(PolylineError::UnexpectedEnd { position: self.len })?;
        self.value_from(first)
    }

    fn value_from(&mut self, first: (usize, u8)) -> Result<i64, PolylineError> {
        let mut accumulator = 0_u64;
        let mut shift = 0_u32;
        let mut current = first;
        loop {
            let (position, byte) = current;
            if !(CHUNK_OFFSET..=CHUNK_MAX).contains(&byte) {
                return Err(PolylineError::InvalidCharacter {
                    character: char::from(byte),
                    position,
                });
            }
            if shift > MAX_SHIFT {
                return Err(PolylineError::ValueOverflow { position });
            }
            let chunk = u64::from(byte - CHUNK_OFFSET);
            accumulator |= (chunk & PAYLOAD_MASK) << shift;
            shift += 5;
            if chunk & CONTINUATION_BIT == 0 {
                break;
            }
            current = self
                .bytes
                .next()
                .ok_or(PolylineError::UnexpectedEnd { position: self.len })?;
        }
        // The shift guard keeps `accumulator` below 2^63, so the halved
        // magnitude always fits an i64.
        let half = i64::try_from(accumulator >> 1)
            .map_err(|_| PolylineError::ValueOverflow { position: self.len })?;
        if accumulator & 1 == 0 {
            Ok(half)
        } else {
            Ok(!half)
        }
    }
}

fn write_value(value: i64, output: &mut String) {
    // Zigzag-map into unsigned space so small magnitudes stay short.
    let zigzag = if value < 0 {
        !value.wrapping_shl(1)
    } else {
        value.wrapping_shl(1)
    };
    let mut remaining = zigzag.cast_unsigned();
    loop {
        let mut piece = low_five_bits(remaining);
        remaining >>= 5;
        if remaining != 0 {
            piece |= 0x20;
        }
        output.push(char::from(piece + CHUNK_OFFSET));
        if remaining == 0 {
            break;
        }
    }
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "coordinate precisions are single-digit exponents"
)]
fn scale_for(precision: u32) -> f64 {
    10.0_f64.powi(precision as i32)
}

#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "scaled coordinate integers stay far below the f64 mantissa limit"
)]
fn to_degrees(value: i64, scale: f64) -> f64 {
    value as f64 / scale
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::float_arithmetic,
    reason = "rounding a scaled coordinate to its integer representation"
)]
fn to_scaled(value: f64, scale: f64) -> i64 {
    (value * scale).round() as i64
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the payload mask keeps the value inside five bits"
)]
const fn low_five_bits(value: u64) -> u8 {
    (value & PAYLOAD_MASK) as u8
}
