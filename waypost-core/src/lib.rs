//! Domain types for routing web-API clients.
//!
//! `waypost-core` holds everything pure: the polyline codec, request
//! parameter normalization, and the immutable result entities shared by the
//! provider clients. Nothing here performs I/O; transports and provider
//! wire formats live in `waypost-providers`.
//!
//! Coordinates are WGS84 [`geo::Coord`] values with `x` = longitude and
//! `y` = latitude throughout.
//!
//! # Examples
//!
//! ```
//! use waypost_core::polyline;
//!
//! let path = polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@", 5)?;
//! assert_eq!(path.len(), 3);
//! # Ok::<(), polyline::PolylineError>(())
//! ```
#![forbid(unsafe_code)]

pub mod isochrone;
pub mod matrix;
pub mod params;
pub mod polyline;
pub mod route;

pub use isochrone::{IntervalType, Isochrone, IsochroneLimit, Isochrones};
pub use matrix::{DistancesMatrix, DurationsMatrix, Matrix};
pub use params::{MatrixSelection, PointRole, QueryPairs, SelectedPoint, SelectionError};
pub use polyline::PolylineError;
pub use route::{Route, Routes};
