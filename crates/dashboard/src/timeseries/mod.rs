use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use tracing::warn;

use std::num::TryFromIntError;
use std::ops::{Add, Sub};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

mod aggregate;

pub use aggregate::{top, Aggregate, Reducer};

/// Upper bound on the number of points `TimeSeries::from_samples` will
/// allocate for one series.
pub const MAX_POINTS: usize = 100_000;

/// A point in time as whole seconds since the unix epoch. `Time(0)` is used
/// as the "never" value by the cache metadata.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(pub i64);

impl Time {
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Self(secs)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Rounds down to a multiple of `step`. A non-positive step leaves the
    /// time untouched.
    pub fn truncate(self, step: Duration) -> Self {
        if step.0 <= 0 {
            return self;
        }

        Self(self.0.div_euclid(step.0) * step.0)
    }

    /// `self - duration`, or `None` if that would overflow.
    pub fn checked_sub(self, duration: Duration) -> Option<Time> {
        self.0.checked_sub(duration.0).map(Time)
    }

    pub fn before(&self, other: Time) -> bool {
        self.0 < other.0
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A span of time in whole seconds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration(pub i64);

impl Duration {
    pub const SECOND: Duration = Duration(1);
    pub const MINUTE: Duration = Duration(60);
    pub const HOUR: Duration = Duration(3600);
    pub const DAY: Duration = Duration(86400);

    pub const fn seconds(n: i64) -> Self {
        Self(n)
    }

    pub const fn minutes(n: i64) -> Self {
        Self(n * 60)
    }

    pub const fn hours(n: i64) -> Self {
        Self(n * 3600)
    }

    pub const fn days(n: i64) -> Self {
        Self(n * 86400)
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

impl TryFrom<std::time::Duration> for Duration {
    type Error = TryFromIntError;

    fn try_from(value: std::time::Duration) -> Result<Self, Self::Error> {
        i64::try_from(value.as_secs()).map(Self)
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl Add<Duration> for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Duration {
        Duration(self.0 + other.0)
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, other: Duration) -> Time {
        Time(self.0 + other.0)
    }
}

impl Sub<Duration> for Time {
    type Output = Time;

    fn sub(self, other: Duration) -> Time {
        Time(self.0 - other.0)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, other: Time) -> Duration {
        Duration(self.0 - other.0)
    }
}

/// Samples at a uniform step starting at `from`. Missing samples are NaN.
///
/// The sample buffer is shared, so cloning a series (for example to place it
/// on a chart) never copies the data.
#[derive(Clone, Debug, Default)]
pub struct TimeSeries {
    from: Time,
    step: Duration,
    values: Arc<[f64]>,
}

impl TimeSeries {
    pub fn new(from: Time, step: Duration, values: Vec<f64>) -> Self {
        Self {
            from,
            step,
            values: values.into(),
        }
    }

    /// Places raw `(time, value)` samples onto the grid `from..=to` at
    /// `step`. Each sample lands in the bucket its time truncates to; the
    /// last sample in a bucket wins and empty buckets stay missing. A grid
    /// of more than [`MAX_POINTS`] points is refused and yields an empty
    /// series.
    pub fn from_samples<I>(from: Time, to: Time, step: Duration, samples: I) -> Self
    where
        I: IntoIterator<Item = (Time, f64)>,
    {
        if step.0 <= 0 || to < from {
            return Self::new(from, step, Vec::new());
        }

        let len = match to.0.checked_sub(from.0).map(|span| span / step.0) {
            Some(span) if span < MAX_POINTS as i64 => span as usize + 1,
            _ => {
                warn!("refusing to build a series from {from} to {to} with step {step}");
                return Self::new(from, step, Vec::new());
            }
        };
        let mut values = vec![f64::NAN; len];

        for (time, value) in samples {
            let bucket = time.truncate(step);
            if bucket < from || bucket > to {
                continue;
            }

            values[((bucket - from).0 / step.0) as usize] = value;
        }

        Self::new(from, step, values)
    }

    pub fn from(&self) -> Time {
        self.from
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// True when there are no samples or every sample is missing.
    pub fn is_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (Time(self.from.0 + i as i64 * self.step.0), *v))
    }

    /// Folds the whole series to one scalar. NaN when nothing is present.
    pub fn reduce(&self, reducer: Reducer) -> f64 {
        self.values
            .iter()
            .fold(f64::NAN, |acc, v| reducer.combine(acc, *v))
    }
}

// serialized as `[[unix_seconds, value|null], ...]`
impl Serialize for TimeSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;

        for (time, value) in self.iter() {
            let value = if value.is_nan() { None } else { Some(value) };
            seq.serialize_element(&(time.0, value))?;
        }

        seq.end()
    }
}
