//! Travel time and distance matrix results.
//!
//! A matrix request yields row-major cell arrays: one row per source, one
//! column per destination. Cells the engine could not route are `None` and
//! stay `None`; they are never coerced to zero or raised as errors.
#![forbid(unsafe_code)]

use std::time::Duration;

use serde_json::Value;

/// Row-major travel times; `None` marks an unroutable pair.
pub type DurationsMatrix = Vec<Vec<Option<Duration>>>;

/// Row-major travel distances in metres; `None` marks an unroutable pair.
pub type DistancesMatrix = Vec<Vec<Option<u64>>>;

/// Travel time and distance tables for the selected sources and
/// destinations.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use serde_json::json;
/// use waypost_core::Matrix;
///
/// let matrix = Matrix::new(
///     vec![vec![Some(Duration::from_secs(1496)), None]],
///     Vec::new(),
///     json!({"times": [[1496, null]]}),
/// );
/// assert_eq!(matrix.durations().len(), 1);
/// assert!(matrix.distances().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    durations: DurationsMatrix,
    distances: DistancesMatrix,
    raw: Value,
}

impl Matrix {
    /// Construct a matrix from parsed cell arrays and the full response.
    #[expect(
        clippy::missing_const_for_fn,
        reason = "matrices are assembled at runtime from parsed responses"
    )]
    #[must_use]
    pub fn new(durations: DurationsMatrix, distances: DistancesMatrix, raw: Value) -> Self {
        Self {
            durations,
            distances,
            raw,
        }
    }

    /// Travel times by `[source][destination]`.
    ///
    /// Empty when the request did not ask the provider for times.
    #[must_use]
    pub const fn durations(&self) -> &DurationsMatrix {
        &self.durations
    }

    /// Travel distances by `[source][destination]`.
    ///
    /// Empty when the request did not ask the provider for distances.
    #[must_use]
    pub const fn distances(&self) -> &DistancesMatrix {
        &self.distances
    }

    /// The provider's unmodified response body.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unroutable_cells_stay_none() {
        let matrix = Matrix::new(
            vec![
                vec![Some(Duration::from_secs(0)), None],
                vec![None, Some(Duration::from_secs(1496))],
            ],
            vec![vec![Some(0), None], vec![None, Some(12480)]],
            json!({}),
        );
        let second_row = matrix.durations().get(1).expect("two rows");
        assert_eq!(second_row.first().copied(), Some(None));
        assert_eq!(second_row.get(1).copied(), Some(Some(Duration::from_secs(1496))));
    }

    #[test]
    fn absent_arrays_map_to_empty_tables() {
        let matrix = Matrix::new(Vec::new(), Vec::new(), json!({"times": null}));
        assert!(matrix.durations().is_empty());
        assert!(matrix.distances().is_empty());
    }
}
