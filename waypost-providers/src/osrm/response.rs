//! OSRM API response types and their mapping into core entities.
//!
//! Every OSRM response carries a `code` member; anything other than
//! `"Ok"` is an in-band service error and is surfaced before any mapping
//! happens.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#responses>

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use waypost_core::{Matrix, Route, Routes};

use crate::cells::{distance_rows, duration_rows};
use crate::error::ProviderError;
use crate::geometry::{GeometryEncoding, GeometryPayload, decode_geometry};

/// Status members shared by every OSRM response.
///
/// Common `code` values:
/// - `"Ok"` - Request was successful
/// - `"InvalidQuery"` - Invalid query parameters
/// - `"InvalidOptions"` - Invalid option combination
/// - `"NoRoute"` - No route between the supplied coordinates
/// - `"NoTable"` - Table computation failed
#[derive(Debug, Deserialize)]
struct ServiceStatus {
    code: String,
    message: Option<String>,
}

impl ServiceStatus {
    fn is_ok(&self) -> bool {
        self.code == "Ok"
    }
}

/// One entry of the `routes` array.
#[derive(Debug, Deserialize)]
struct RoutePayload {
    /// Absent when the request set `overview` to `false`.
    geometry: Option<GeometryPayload>,
    /// Travel time in seconds.
    duration: f64,
    /// Travel distance in metres.
    distance: f64,
}

/// Table service result arrays.
///
/// `durations[i][j]` is the travel time from the i-th source to the j-th
/// destination. Cells are `None` when no route exists between a pair.
#[derive(Debug, Deserialize)]
struct TablePayload {
    durations: Option<Vec<Vec<Option<f64>>>>,
    distances: Option<Vec<Vec<Option<f64>>>>,
}

/// Map a route service body into its best route.
pub(super) fn single_route(
    body: &Value,
    encoding: GeometryEncoding,
) -> Result<Route, ProviderError> {
    routes(body, encoding)?
        .into_inner()
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse { expected: "routes" })
}

/// Map a route service body into the full route set.
pub(super) fn routes(body: &Value, encoding: GeometryEncoding) -> Result<Routes, ProviderError> {
    ensure_ok(body)?;
    let entries = body
        .get("routes")
        .and_then(Value::as_array)
        .ok_or_else(|| decode_error("response missing a routes array"))?;
    if entries.is_empty() {
        return Err(ProviderError::EmptyResponse { expected: "routes" });
    }
    let mapped = entries
        .iter()
        .map(|fragment| route(fragment, encoding))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Routes::new(mapped, body.clone()))
}

fn route(fragment: &Value, encoding: GeometryEncoding) -> Result<Route, ProviderError> {
    let payload: RoutePayload = serde_json::from_value(fragment.clone())
        .map_err(|err| decode_error(format!("malformed route entry: {err}")))?;
    let geometry = match &payload.geometry {
        Some(geometry) => decode_geometry(geometry, encoding)?,
        None => Vec::new(),
    };
    Ok(Route::new(
        geometry,
        Duration::from_secs(whole(payload.duration)),
        whole(payload.distance),
        fragment.clone(),
    ))
}

/// Map a table service body, preserving unroutable cells as `None`.
pub(super) fn matrix(body: &Value) -> Result<Matrix, ProviderError> {
    ensure_ok(body)?;
    let payload: TablePayload = serde_json::from_value(body.clone())
        .map_err(|err| decode_error(format!("malformed table response: {err}")))?;
    let durations = payload.durations.map(duration_rows).unwrap_or_default();
    let distances = payload.distances.map(distance_rows).unwrap_or_default();
    Ok(Matrix::new(durations, distances, body.clone()))
}

fn ensure_ok(body: &Value) -> Result<(), ProviderError> {
    let status: ServiceStatus = serde_json::from_value(body.clone())
        .map_err(|err| decode_error(format!("response missing a status code: {err}")))?;
    if status.is_ok() {
        Ok(())
    } else {
        Err(ProviderError::Service {
            code: status.code,
            message: status.message.unwrap_or_default(),
        })
    }
}

fn decode_error(message: impl Into<String>) -> ProviderError {
    ProviderError::Decode {
        message: message.into(),
    }
}

/// Truncate a reading to whole units, clamping invalid values to zero.
fn whole(value: f64) -> u64 {
    value as u64
}
