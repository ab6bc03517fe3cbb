use super::*;

use chrono::{DateTime, Utc};
use serde::Deserialize;

const DEFAULT_RANGE: dashboard::Duration = dashboard::Duration::HOUR;

// longest range a dashboard may be requested for
const MAX_RANGE: dashboard::Duration = dashboard::Duration::days(30);

const EPOCH: Time = Time(0);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeRange {
    pub from: Time,
    pub to: Time,
}

/// Query parameters selecting the time range of a dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    /// Start of the range, defaults to one hour before `to`
    pub from: Option<String>,
    /// End of the range, defaults to now
    pub to: Option<String>,
}

impl RangeParams {
    pub fn resolve(&self, now: Time) -> Result<TimeRange, Error> {
        let to = match &self.to {
            Some(to) => parse_time(now, to)?,
            None => now,
        };

        let from = match &self.from {
            Some(from) => parse_time(now, from)?,
            None => to
                .checked_sub(DEFAULT_RANGE)
                .filter(|from| !from.before(EPOCH))
                .unwrap_or(EPOCH),
        };

        if from > to {
            return Err(Error::InvalidInput(
                "from must not be after to".to_string(),
            ));
        }

        // both ends are at or after the epoch, so this cannot overflow
        if to - from > MAX_RANGE {
            return Err(Error::InvalidInput(format!(
                "range is longer than the maximum of {} days",
                MAX_RANGE.as_secs() / dashboard::Duration::DAY.as_secs()
            )));
        }

        Ok(TimeRange { from, to })
    }
}

/// Parses `now`, `now-<duration>` (e.g. `now-2h`), unix seconds or an
/// RFC 3339 datetime. Times before the unix epoch are rejected.
fn parse_time(now: Time, s: &str) -> Result<Time, Error> {
    let s = s.trim();

    if s == "now" {
        return Ok(now);
    }

    if let Some(offset) = s.strip_prefix("now-") {
        let duration: humantime::Duration = offset
            .parse()
            .map_err(|e| Error::InvalidInput(format!("invalid duration '{offset}': {e}")))?;

        return dashboard::Duration::try_from(*duration)
            .ok()
            .and_then(|duration| now.checked_sub(duration))
            .filter(|time| !time.before(EPOCH))
            .ok_or_else(|| Error::InvalidInput(format!("duration too large: '{offset}'")));
    }

    if let Ok(secs) = s.parse::<u64>() {
        return i64::try_from(secs)
            .map(Time)
            .map_err(|_| Error::InvalidInput(format!("timestamp out of range: '{s}'")));
    }

    let dt: DateTime<Utc> = s.parse().map_err(|_| {
        Error::InvalidInput(format!(
            "invalid time '{s}': expected now, now-<duration>, unix seconds or RFC 3339"
        ))
    })?;

    let time = Time(dt.timestamp());

    if time.before(EPOCH) {
        return Err(Error::InvalidInput(format!(
            "invalid time '{s}': before the unix epoch"
        )));
    }

    Ok(time)
}
