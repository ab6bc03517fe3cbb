//! Chart model and time-series algebra used to assemble dashboards.
//!
//! A [`Dashboard`] holds named chart groups; each chart references
//! [`TimeSeries`] data without copying it. [`Aggregate`] and [`top`] provide
//! the NaN-aware combination and ranking used while building charts.

mod timeseries;
mod widgets;

pub use timeseries::{top, Aggregate, Duration, Reducer, Time, TimeSeries, MAX_POINTS};
pub use widgets::{Chart, ChartGroup, Dashboard, Series, Threshold, SELECTOR};
