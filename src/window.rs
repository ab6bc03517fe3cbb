use dashboard::{Duration, Time};

/// The range and resolution a snapshot is loaded for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Window {
    pub from: Time,
    pub to: Time,
    pub step: Duration,
}

impl Window {
    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Available(Window),
    /// The cache has not produced data for the requested range yet.
    NotAvailableYet { last_update: Time },
}

// minimum step for windows longer than the given duration, largest first
const STEP_TABLE: &[(Duration, Duration)] = &[
    (Duration::days(5), Duration::minutes(60)),
    (Duration::days(1), Duration::minutes(15)),
    (Duration::hours(12), Duration::minutes(10)),
    (Duration::hours(6), Duration::minutes(5)),
    (Duration::hours(4), Duration::minutes(1)),
];

/// Reconciles a requested range with how far the metrics cache has been
/// filled.
///
/// Both ends are aligned to `step`. If the cache has never been updated, or
/// was last updated before the start of the range, nothing can be shown yet.
/// Otherwise a range reaching past the last complete step is shifted back so
/// that it ends there, keeping its duration. Long ranges get a coarser step.
pub fn resolve(from: Time, to: Time, step: Duration, last_update: Time) -> Resolution {
    let mut from = from.truncate(step);
    let mut to = to.truncate(step);

    if last_update.is_zero() || last_update.before(from) {
        return Resolution::NotAvailableYet { last_update };
    }

    let duration = to - from;
    let available_to = (last_update - step).truncate(step);

    if available_to.before(to) {
        to = available_to;
        from = to - duration;
    }

    Resolution::Available(Window {
        from,
        to,
        step: increase_step_for_big_durations(duration, step),
    })
}

pub fn increase_step_for_big_durations(duration: Duration, step: Duration) -> Duration {
    STEP_TABLE
        .iter()
        .find(|(longer_than, _)| duration > *longer_than)
        .map(|(_, min_step)| step.max(*min_step))
        .unwrap_or(step)
}
