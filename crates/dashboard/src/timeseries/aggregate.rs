use super::*;

use tracing::warn;

/// How samples from several series, or from one series over time, combine
/// into a single value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    /// Sum of the present samples. Missing only when every sample is missing.
    Sum,
    /// Largest present sample.
    Max,
    /// The first present sample, passed through unchanged.
    Any,
}

impl Reducer {
    pub fn combine(self, acc: f64, sample: f64) -> f64 {
        if sample.is_nan() {
            return acc;
        }

        if acc.is_nan() {
            return sample;
        }

        match self {
            Self::Sum => acc + sample,
            Self::Max => acc.max(sample),
            Self::Any => acc,
        }
    }
}

/// An accumulator over input series. Inputs can be added at any time; the
/// combined series is computed by `get`.
#[derive(Clone, Debug)]
pub struct Aggregate {
    reducer: Reducer,
    inputs: Vec<TimeSeries>,
}

impl Aggregate {
    pub fn new(reducer: Reducer) -> Self {
        Self {
            reducer,
            inputs: Vec::new(),
        }
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn add_input(&mut self, series: TimeSeries) -> &mut Self {
        self.inputs.push(series);
        self
    }

    /// Combines all inputs on the grid of the first one. Samples of later
    /// inputs that fall outside that grid are dropped, and inputs sampled at
    /// a different step are skipped entirely.
    pub fn get(&self) -> TimeSeries {
        let Some(base) = self.inputs.first() else {
            return TimeSeries::default();
        };

        let mut values = base.values().to_vec();

        for input in &self.inputs[1..] {
            if input.step() != base.step() {
                warn!(
                    "skipping aggregate input with step {} (expected {})",
                    input.step(),
                    base.step()
                );
                continue;
            }

            for (time, value) in input.iter() {
                if time < base.from() {
                    continue;
                }

                let idx = ((time - base.from()).0 / base.step().0) as usize;

                if let Some(acc) = values.get_mut(idx) {
                    *acc = self.reducer.combine(*acc, value);
                }
            }
        }

        TimeSeries::new(base.from(), base.step(), values)
    }
}

impl From<Aggregate> for TimeSeries {
    fn from(aggregate: Aggregate) -> Self {
        aggregate.get()
    }
}

impl From<&Aggregate> for TimeSeries {
    fn from(aggregate: &Aggregate) -> Self {
        aggregate.get()
    }
}

/// Ranks aggregates by the scalar `by` produces over their combined series
/// and keeps the best `n`. Higher scores come first, entries with no data
/// come last and equal scores are ordered by name.
pub fn top<K, I>(entries: I, by: Reducer, n: usize) -> Vec<(String, Aggregate)>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Aggregate)>,
{
    let mut ranked: Vec<(f64, String, Aggregate)> = entries
        .into_iter()
        .map(|(name, aggregate)| {
            let score = aggregate.get().reduce(by);
            let score = if score.is_nan() {
                f64::NEG_INFINITY
            } else {
                score
            };
            (score, name.into(), aggregate)
        })
        .collect();

    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    ranked.truncate(n);

    ranked
        .into_iter()
        .map(|(_, name, aggregate)| (name, aggregate))
        .collect()
}
