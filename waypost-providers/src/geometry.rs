//! Response geometry handling shared by providers.
//!
//! Engines return path geometry either as an encoded polyline string or as
//! GeoJSON-style coordinate arrays. Which form arrives is negotiated by the
//! request (`points_encoded`, `geometries`), so decoding is driven by a
//! [`GeometryEncoding`] derived from the request rather than sniffed from
//! the payload; a response that contradicts the negotiated form is an
//! error, not a guess.

use geo::Coord;
use serde::Deserialize;
use waypost_core::polyline;

use crate::error::ProviderError;

/// Geometry as it appears in a provider response.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GeometryPayload {
    /// Polyline-encoded geometry.
    Encoded(String),
    /// GeoJSON-style geometry with positions in `[lng, lat(, ele)]` order.
    Coordinates {
        /// Positions in GeoJSON axis order.
        coordinates: Vec<Vec<f64>>,
    },
}

/// The geometry encoding a request negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryEncoding {
    /// Geometry arrives polyline-encoded.
    Polyline {
        /// Decimal digits preserved by the encoder.
        precision: u32,
        /// Whether a third elevation component is interleaved.
        elevation: bool,
    },
    /// Geometry arrives as native coordinate arrays.
    GeoJson,
}

/// Decode response geometry according to the negotiated encoding.
///
/// Elevation is dropped either way: polyline triples consume and discard
/// the third value, GeoJSON positions ignore components past the second.
///
/// # Errors
///
/// Returns [`ProviderError::UnexpectedGeometry`] when the payload form
/// contradicts the negotiated encoding, and decode errors when the payload
/// itself is malformed.
pub fn decode_geometry(
    payload: &GeometryPayload,
    encoding: GeometryEncoding,
) -> Result<Vec<Coord<f64>>, ProviderError> {
    match (payload, encoding) {
        (
            GeometryPayload::Encoded(text),
            GeometryEncoding::Polyline {
                precision,
                elevation,
            },
        ) => {
            let decoded = if elevation {
                polyline::decode_elevation(text, precision)?
            } else {
                polyline::decode(text, precision)?
            };
            Ok(decoded)
        }
        (GeometryPayload::Coordinates { coordinates }, GeometryEncoding::GeoJson) => coordinates
            .iter()
            .map(|position| position_coord(position))
            .collect(),
        (GeometryPayload::Encoded(_), GeometryEncoding::GeoJson) => {
            Err(ProviderError::UnexpectedGeometry { expected: "GeoJSON" })
        }
        (GeometryPayload::Coordinates { .. }, GeometryEncoding::Polyline { .. }) => {
            Err(ProviderError::UnexpectedGeometry {
                expected: "polyline",
            })
        }
    }
}

/// Read one GeoJSON position, dropping any elevation component.
pub(crate) fn position_coord(position: &[f64]) -> Result<Coord<f64>, ProviderError> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(ProviderError::Decode {
            message: "geometry position needs longitude and latitude".to_string(),
        }),
    }
}
