//! Directions results.
//!
//! A directions request yields either a single [`Route`] or an ordered
//! [`Routes`] collection of alternatives, depending on which client entry
//! point the caller chose. Both are immutable snapshots of a parsed
//! response and keep the provider's raw payload alongside the typed view.
#![forbid(unsafe_code)]

use std::time::Duration;

use geo::Coord;
use serde_json::Value;

/// A single routed path between the requested points.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use geo::Coord;
/// use serde_json::json;
/// use waypost_core::Route;
///
/// let route = Route::new(
///     vec![Coord { x: 8.34, y: 48.23 }, Coord { x: 8.35, y: 48.24 }],
///     Duration::from_secs(311),
///     2415,
///     json!({"time": 311_000}),
/// );
/// assert_eq!(route.duration().as_secs(), 311);
/// assert_eq!(route.distance(), 2415);
/// assert_eq!(route.geometry().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    geometry: Vec<Coord<f64>>,
    duration: Duration,
    distance: u64,
    raw: Value,
}

impl Route {
    /// Construct a route from a parsed response fragment.
    #[expect(
        clippy::missing_const_for_fn,
        reason = "routes are assembled at runtime from parsed responses"
    )]
    #[must_use]
    pub fn new(geometry: Vec<Coord<f64>>, duration: Duration, distance: u64, raw: Value) -> Self {
        Self {
            geometry,
            duration,
            distance,
            raw,
        }
    }

    /// The path geometry with `x` = longitude and `y` = latitude.
    #[must_use]
    pub fn geometry(&self) -> &[Coord<f64>] {
        &self.geometry
    }

    /// Travel time in whole seconds.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Travel distance in whole metres.
    #[must_use]
    pub const fn distance(&self) -> u64 {
        self.distance
    }

    /// The provider's unmodified payload for this route.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Alternative routes in the provider's preference order.
///
/// The first entry is the provider's recommended route. `raw` holds the
/// full response body, so detail dropped by the typed view stays reachable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Routes {
    routes: Vec<Route>,
    raw: Value,
}

impl Routes {
    /// Construct a collection from parsed routes and the full response.
    #[expect(
        clippy::missing_const_for_fn,
        reason = "collections are assembled at runtime from parsed responses"
    )]
    #[must_use]
    pub fn new(routes: Vec<Route>, raw: Value) -> Self {
        Self { routes, raw }
    }

    /// The routes in provider preference order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Return the route at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    /// Number of alternatives.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.routes.len()
    }

    /// Report whether the collection holds no routes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The provider's unmodified response body.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consume the collection and return the routes.
    #[must_use]
    pub fn into_inner(self) -> Vec<Route> {
        self.routes
    }
}
