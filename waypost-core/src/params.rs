//! Request parameter normalization shared by every provider.
//!
//! Providers assemble query strings and JSON bodies from typed options. The
//! helpers here pin the transport-independent rules: booleans render
//! lowercase, list values repeat their key in caller order, absent options
//! are omitted entirely, and unrecognized extras are forwarded untouched.
//!
//! Matrix requests additionally restrict which points act as sources and
//! destinations. [`resolve_matrix_selection`] validates the requested
//! indices against the point list up front and returns an explicit
//! [`MatrixSelection`] mode for providers to render, so selection handling
//! never leaks into per-parameter conditionals.
#![forbid(unsafe_code)]

use std::fmt;

use geo::Coord;
use serde_json::{Map, Value};
use thiserror::Error;

/// An ordered collection of query-string pairs.
///
/// Pairs preserve insertion order; rendering (percent-encoding) is left to
/// the URL layer.
///
/// # Examples
///
/// ```
/// use waypost_core::params::QueryPairs;
///
/// let mut pairs = QueryPairs::new();
/// pairs.push("profile", "car");
/// pairs.push_bool("debug", false);
/// pairs.push_some("buckets", None::<String>);
///
/// let rendered: Vec<_> = pairs.iter().collect();
/// assert_eq!(rendered, vec![("profile", "car"), ("debug", "false")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs {
    pairs: Vec<(String, String)>,
}

impl QueryPairs {
    /// Construct an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key/value pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Append a boolean rendered lowercase.
    pub fn push_bool(&mut self, key: impl Into<String>, value: bool) {
        self.push(key, if value { "true" } else { "false" });
    }

    /// Append the value when present; absent options leave no trace.
    pub fn push_some(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(present) = value {
            self.push(key, present);
        }
    }

    /// Append one pair per value, preserving caller order.
    pub fn push_repeated<I>(&mut self, key: &str, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        for value in values {
            self.push(key, value);
        }
    }

    /// Append provider-specific extras without interpretation.
    ///
    /// Scalar values render as their query text (strings unquoted, booleans
    /// lowercase, numbers as written); array values repeat the key once per
    /// element. Anything else is forwarded as compact JSON.
    pub fn extend_extras(&mut self, extras: &Map<String, Value>) {
        for (key, value) in extras {
            match value {
                Value::Array(items) => {
                    for item in items {
                        self.push(key.clone(), scalar_text(item));
                    }
                }
                other => self.push(key.clone(), scalar_text(other)),
            }
        }
    }

    /// Iterate over the pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Borrow the pairs in insertion order.
    #[must_use]
    pub const fn pairs(&self) -> &[(String, String)] {
        self.pairs.as_slice()
    }

    /// Return the number of pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Report whether any pairs are present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Consume the collection and return the underlying pairs.
    #[must_use]
    pub fn into_inner(self) -> Vec<(String, String)> {
        self.pairs
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Render a coordinate as `latitude,longitude` for query-string transport.
#[must_use]
pub fn format_lat_lon(coord: Coord<f64>) -> String {
    format!("{},{}", coord.y, coord.x)
}

/// Render a coordinate as a `[longitude, latitude]` JSON position.
#[must_use]
pub fn lon_lat_array(coord: Coord<f64>) -> Value {
    Value::Array(vec![Value::from(coord.x), Value::from(coord.y)])
}

/// The side of a matrix a point index was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRole {
    /// The index selects a row origin.
    Source,
    /// The index selects a column target.
    Destination,
}

impl fmt::Display for PointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

/// Errors raised while resolving matrix sources and destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// An index referred to a point outside the supplied list.
    #[error("{role} index {index} is out of range for {count} points")]
    OutOfRange {
        /// Which side of the matrix the index was requested for.
        role: PointRole,
        /// The offending index.
        index: usize,
        /// Number of points in the request.
        count: usize,
    },
}

/// A point chosen for one side of a matrix, with its original position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedPoint {
    index: usize,
    coord: Coord<f64>,
}

impl SelectedPoint {
    /// Pair an index with its coordinate.
    #[must_use]
    pub const fn new(index: usize, coord: Coord<f64>) -> Self {
        Self { index, coord }
    }

    /// Position of the point in the request's point list.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The point's coordinate.
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        self.coord
    }
}

/// How a matrix request covers its point list.
///
/// `Full` is the unrestricted mode: every point is both a source and a
/// destination, and providers render the plain point list. `Restricted`
/// carries the resolved points for each side. An explicit selection that
/// names every point in natural order normalizes to `Full`, so it produces
/// a request identical to the unrestricted one.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixSelection {
    /// Every point serves as both source and destination.
    Full,
    /// Specific points serve each side.
    Restricted {
        /// Resolved row origins, in request order.
        sources: Vec<SelectedPoint>,
        /// Resolved column targets, in request order.
        destinations: Vec<SelectedPoint>,
    },
}

impl MatrixSelection {
    /// Report whether the selection is the unrestricted mode.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Validate matrix indices and resolve them into a [`MatrixSelection`].
///
/// A side given as `None` resolves to every point. Validation happens here,
/// before any request is dispatched; every index must refer into `points`.
///
/// # Errors
///
/// Returns [`SelectionError::OutOfRange`] naming the side and index when a
/// requested index has no corresponding point.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use waypost_core::params::{MatrixSelection, resolve_matrix_selection};
///
/// let points = [
///     Coord { x: 13.38886, y: 52.51703 },
///     Coord { x: 13.39763, y: 52.52927 },
/// ];
/// let selection = resolve_matrix_selection(&points, Some(&[1]), None)?;
/// assert!(matches!(selection, MatrixSelection::Restricted { .. }));
///
/// // Naming every point in order is the same as not restricting at all.
/// let full = resolve_matrix_selection(&points, Some(&[0, 1]), Some(&[0, 1]))?;
/// assert!(full.is_full());
/// # Ok::<(), waypost_core::params::SelectionError>(())
/// ```
pub fn resolve_matrix_selection(
    points: &[Coord<f64>],
    sources: Option<&[usize]>,
    destinations: Option<&[usize]>,
) -> Result<MatrixSelection, SelectionError> {
    let resolved_sources = resolve_side(points, sources, PointRole::Source)?;
    let resolved_destinations = resolve_side(points, destinations, PointRole::Destination)?;
    if covers_in_order(&resolved_sources, points.len())
        && covers_in_order(&resolved_destinations, points.len())
    {
        return Ok(MatrixSelection::Full);
    }
    Ok(MatrixSelection::Restricted {
        sources: resolved_sources,
        destinations: resolved_destinations,
    })
}

fn resolve_side(
    points: &[Coord<f64>],
    indices: Option<&[usize]>,
    role: PointRole,
) -> Result<Vec<SelectedPoint>, SelectionError> {
    match indices {
        None => Ok(points
            .iter()
            .enumerate()
            .map(|(index, coord)| SelectedPoint::new(index, *coord))
            .collect()),
        Some(list) => list
            .iter()
            .map(|&index| {
                points
                    .get(index)
                    .map(|coord| SelectedPoint::new(index, *coord))
                    .ok_or(SelectionError::OutOfRange {
                        role,
                        index,
                        count: points.len(),
                    })
            })
            .collect(),
    }
}

fn covers_in_order(selection: &[SelectedPoint], count: usize) -> bool {
    selection.len() == count
        && selection
            .iter()
            .enumerate()
            .all(|(position, point)| point.index() == position)
}
