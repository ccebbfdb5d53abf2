//! Reachability polygon results.
//!
//! An isochrone request asks how far one can travel from a center point
//! within a limit, expressed either as time or as distance. Providers answer
//! with one polygon per bucket; [`Isochrones`] keeps them ordered by
//! increasing interval.
#![forbid(unsafe_code)]

use std::time::Duration;

use geo::Coord;
use serde_json::Value;

/// The metric an isochrone interval is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntervalType {
    /// Intervals are travel time in seconds.
    Time,
    /// Intervals are travel distance in metres.
    Distance,
}

impl std::fmt::Display for IntervalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Time => f.write_str("time"),
            Self::Distance => f.write_str("distance"),
        }
    }
}

/// The reach limit of an isochrone request.
///
/// The limit fixes the interval metric of every isochrone mapped from the
/// response; providers never infer the metric from the payload.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use waypost_core::{IntervalType, IsochroneLimit};
///
/// let limit = IsochroneLimit::Time(Duration::from_secs(1000));
/// assert_eq!(limit.interval_type(), IntervalType::Time);
/// assert_eq!(limit.magnitude(), 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IsochroneLimit {
    /// Reach everything within a travel time.
    Time(Duration),
    /// Reach everything within a travel distance in metres.
    Distance(u64),
}

impl IsochroneLimit {
    /// The interval metric this limit implies.
    #[must_use]
    pub const fn interval_type(&self) -> IntervalType {
        match self {
            Self::Time(_) => IntervalType::Time,
            Self::Distance(_) => IntervalType::Distance,
        }
    }

    /// The limit's magnitude in its own unit (seconds or metres).
    #[must_use]
    pub const fn magnitude(&self) -> u64 {
        match self {
            Self::Time(duration) => duration.as_secs(),
            Self::Distance(metres) => *metres,
        }
    }
}

/// One reachability ring around the requested center.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Isochrone {
    geometry: Vec<Coord<f64>>,
    interval: u64,
    interval_type: IntervalType,
    center: Coord<f64>,
}

impl Isochrone {
    /// Construct an isochrone from a parsed response polygon.
    #[expect(
        clippy::missing_const_for_fn,
        reason = "isochrones are assembled at runtime from parsed responses"
    )]
    #[must_use]
    pub fn new(
        geometry: Vec<Coord<f64>>,
        interval: u64,
        interval_type: IntervalType,
        center: Coord<f64>,
    ) -> Self {
        Self {
            geometry,
            interval,
            interval_type,
            center,
        }
    }

    /// The polygon's outer ring, as the provider emitted it.
    ///
    /// Rings arrive closed from GraphHopper; no closing or deduplication is
    /// applied here.
    #[must_use]
    pub fn geometry(&self) -> &[Coord<f64>] {
        &self.geometry
    }

    /// The interval this ring corresponds to, in seconds or metres.
    #[must_use]
    pub const fn interval(&self) -> u64 {
        self.interval
    }

    /// The metric [`Self::interval`] is measured in.
    #[must_use]
    pub const fn interval_type(&self) -> IntervalType {
        self.interval_type
    }

    /// The center the request was made for.
    #[must_use]
    pub const fn center(&self) -> Coord<f64> {
        self.center
    }
}

/// Isochrones ordered by increasing interval.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Isochrones {
    isochrones: Vec<Isochrone>,
    raw: Value,
}

impl Isochrones {
    /// Construct a collection from parsed isochrones and the full response.
    #[expect(
        clippy::missing_const_for_fn,
        reason = "collections are assembled at runtime from parsed responses"
    )]
    #[must_use]
    pub fn new(isochrones: Vec<Isochrone>, raw: Value) -> Self {
        Self { isochrones, raw }
    }

    /// The isochrones ordered by increasing interval.
    #[must_use]
    pub fn isochrones(&self) -> &[Isochrone] {
        &self.isochrones
    }

    /// Return the isochrone at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Isochrone> {
        self.isochrones.get(index)
    }

    /// Number of isochrones.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.isochrones.len()
    }

    /// Report whether the collection holds no isochrones.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.isochrones.is_empty()
    }

    /// The provider's unmodified response body.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consume the collection and return the isochrones.
    #[must_use]
    pub fn into_inner(self) -> Vec<Isochrone> {
        self.isochrones
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn limit_fixes_the_interval_metric() {
        assert_eq!(
            IsochroneLimit::Time(Duration::from_secs(60)).interval_type(),
            IntervalType::Time,
        );
        assert_eq!(
            IsochroneLimit::Distance(5000).interval_type(),
            IntervalType::Distance,
        );
        assert_eq!(IsochroneLimit::Distance(5000).magnitude(), 5000);
    }

    #[test]
    fn collection_preserves_interval_order() {
        let center = Coord { x: 8.34, y: 48.23 };
        let rings = vec![
            Isochrone::new(Vec::new(), 333, IntervalType::Time, center),
            Isochrone::new(Vec::new(), 666, IntervalType::Time, center),
            Isochrone::new(Vec::new(), 1000, IntervalType::Time, center),
        ];
        let isochrones = Isochrones::new(rings, json!({"polygons": []}));
        let intervals: Vec<_> = isochrones
            .isochrones()
            .iter()
            .map(Isochrone::interval)
            .collect();
        assert_eq!(intervals, vec![333, 666, 1000]);
        assert_eq!(isochrones.len(), 3);
    }
}
