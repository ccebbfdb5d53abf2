//! Facade crate for the Waypost routing clients.
//!
//! This crate re-exports the domain types from `waypost-core` and exposes
//! the provider clients from `waypost-providers` behind feature flags, so
//! an application can depend on one crate and pick its engines.
//!
//! ```no_run
//! use geo::Coord;
//! use waypost::graphhopper::{DirectionsOptions, GraphHopper};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GraphHopper::new("my-api-key")?;
//! let route = client.directions(
//!     &[
//!         Coord { x: 8.680916, y: 49.415776 },
//!         Coord { x: 8.688641, y: 49.420577 },
//!     ],
//!     "car",
//!     &DirectionsOptions::default(),
//! )?;
//! println!("{} m in {} s", route.distance(), route.duration().as_secs());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub use waypost_core::{
    DistancesMatrix, DurationsMatrix, IntervalType, Isochrone, IsochroneLimit, Isochrones, Matrix,
    MatrixSelection, PointRole, PolylineError, QueryPairs, Route, Routes, SelectedPoint,
    SelectionError, params, polyline,
};

#[cfg(any(feature = "graphhopper", feature = "osrm"))]
pub use waypost_providers::{
    ApiRequest, ProviderError, RequestMethod, Transport, TransportError, transport,
};

#[cfg(feature = "graphhopper")]
pub use waypost_providers::graphhopper::{self, GraphHopper};

#[cfg(feature = "osrm")]
pub use waypost_providers::osrm::{self, Osrm};
