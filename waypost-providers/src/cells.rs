//! Matrix cell mapping shared by the provider response modules.
//!
//! Engines mark unroutable pairs with `null`; a handful of deployments
//! have been seen emitting negative or non-finite sentinels instead.
//! Both forms map to `None` so callers only ever see usable readings.

use std::time::Duration;

use waypost_core::{DistancesMatrix, DurationsMatrix};

/// Map second readings into whole-second durations.
pub(crate) fn duration_rows(rows: Vec<Vec<Option<f64>>>) -> DurationsMatrix {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| {
                    cell.filter(|&seconds| seconds >= 0.0 && seconds.is_finite())
                        .map(|seconds| Duration::from_secs(seconds as u64))
                })
                .collect()
        })
        .collect()
}

/// Map metre readings into whole metres.
pub(crate) fn distance_rows(rows: Vec<Vec<Option<f64>>>) -> DistancesMatrix {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| {
                    cell.filter(|&metres| metres >= 0.0 && metres.is_finite())
                        .map(|metres| metres as u64)
                })
                .collect()
        })
        .collect()
}
