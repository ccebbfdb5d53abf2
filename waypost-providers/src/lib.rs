//! Provider clients for routing web APIs.
//!
//! Each provider module pairs a typed client with the request and response
//! conventions of one routing engine. Clients are generic over the
//! [`Transport`] seam: production code dispatches through
//! [`transport::HttpTransport`], while tests substitute a recording double
//! and assert on the exact requests a call produces.
//!
//! The domain types live in `waypost-core`; this crate owns everything that
//! touches a wire format.
#![forbid(unsafe_code)]

#[cfg(any(feature = "graphhopper", feature = "osrm"))]
mod cells;
pub mod error;
pub mod geometry;
pub mod transport;

#[cfg(feature = "graphhopper")]
pub mod graphhopper;
#[cfg(feature = "osrm")]
pub mod osrm;

pub use error::ProviderError;
pub use transport::{ApiRequest, RequestMethod, Transport, TransportError};

#[cfg(feature = "graphhopper")]
pub use graphhopper::GraphHopper;
#[cfg(feature = "osrm")]
pub use osrm::Osrm;
