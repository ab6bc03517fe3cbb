use crate::timeseries::{Aggregate, Reducer, TimeSeries};

use serde::{Serialize, Serializer};

/// Placeholder in a chart group title that is replaced by each chart's key.
pub const SELECTOR: &str = "<selector>";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    name: String,
    chart_groups: Vec<ChartGroup>,
}

impl Dashboard {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            chart_groups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chart_groups(&self) -> &[ChartGroup] {
        &self.chart_groups
    }

    pub fn chart_group(&self, template: &str) -> Option<&ChartGroup> {
        self.chart_groups.iter().find(|g| g.title == template)
    }

    pub fn get_or_create_chart_group(&mut self, template: &str) -> &mut ChartGroup {
        let idx = match self.chart_groups.iter().position(|g| g.title == template) {
            Some(idx) => idx,
            None => {
                self.chart_groups.push(ChartGroup::new(template));
                self.chart_groups.len() - 1
            }
        };

        &mut self.chart_groups[idx]
    }

    pub fn get_or_create_chart_in_group(&mut self, template: &str, key: &str) -> &mut Chart {
        self.get_or_create_chart_group(template)
            .get_or_create_chart(key)
    }

    pub fn chart(&self, template: &str, key: &str) -> Option<&Chart> {
        self.chart_group(template).and_then(|g| g.chart(key))
    }
}

/// Charts sharing a title template, one per key, in the order the keys were
/// first seen.
#[derive(Debug, Serialize)]
pub struct ChartGroup {
    title: String,
    charts: Vec<Chart>,
}

impl ChartGroup {
    fn new(template: &str) -> Self {
        Self {
            title: template.to_string(),
            charts: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn chart(&self, key: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.key == key)
    }

    pub fn get_or_create_chart(&mut self, key: &str) -> &mut Chart {
        let idx = match self.charts.iter().position(|c| c.key == key) {
            Some(idx) => idx,
            None => {
                let title = self.title.replace(SELECTOR, key);
                self.charts.push(Chart::new(key, title));
                self.charts.len() - 1
            }
        };

        &mut self.charts[idx]
    }
}

#[derive(Debug, Serialize)]
pub struct Chart {
    #[serde(skip)]
    key: String,
    title: String,
    featured: bool,
    sorted: bool,
    stacked: bool,
    series: Vec<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<Threshold>,
}

impl Chart {
    fn new(key: &str, title: String) -> Self {
        Self {
            key: key.to_string(),
            title,
            featured: false,
            sorted: false,
            stacked: false,
            series: Vec::new(),
            threshold: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn threshold(&self) -> Option<&Threshold> {
        self.threshold.as_ref()
    }

    pub fn is_featured(&self) -> bool {
        self.featured
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn is_stacked(&self) -> bool {
        self.stacked
    }

    /// Adds a series. A series with the same name has its data replaced in
    /// place, so names stay unique within the chart.
    pub fn add_series<T: Into<String>>(&mut self, name: T, data: TimeSeries) -> &mut Self {
        self.push(Series {
            name: name.into(),
            color: None,
            data,
        })
    }

    pub fn add_series_with_color<T: Into<String>, U: Into<String>>(
        &mut self,
        name: T,
        color: U,
        data: TimeSeries,
    ) -> &mut Self {
        self.push(Series {
            name: name.into(),
            color: Some(color.into()),
            data,
        })
    }

    pub fn add_many<K, S, I>(&mut self, series: I) -> &mut Self
    where
        K: Into<String>,
        S: Into<TimeSeries>,
        I: IntoIterator<Item = (K, S)>,
    {
        for (name, data) in series {
            self.add_series(name, data.into());
        }

        self
    }

    /// Sets the reference line. Calling again with the same name folds the
    /// new series into the existing line with that line's reducer; a
    /// different name replaces the line.
    pub fn set_threshold<T: Into<String>>(
        &mut self,
        name: T,
        data: TimeSeries,
        reducer: Reducer,
    ) -> &mut Self {
        let name = name.into();

        match self.threshold.as_mut() {
            Some(threshold) if threshold.name == name => {
                threshold.aggregate.add_input(data);
            }
            _ => {
                let mut aggregate = Aggregate::new(reducer);
                aggregate.add_input(data);
                self.threshold = Some(Threshold { name, aggregate });
            }
        }

        self
    }

    pub fn sorted(&mut self) -> &mut Self {
        self.sorted = true;
        self
    }

    pub fn stacked(&mut self) -> &mut Self {
        self.stacked = true;
        self
    }

    pub fn featured(&mut self) -> &mut Self {
        self.featured = true;
        self
    }

    fn push(&mut self, series: Series) -> &mut Self {
        match self.series.iter_mut().find(|s| s.name == series.name) {
            Some(existing) => *existing = series,
            None => self.series.push(series),
        }

        self
    }
}

#[derive(Debug, Serialize)]
pub struct Series {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(rename = "points")]
    data: TimeSeries,
}

impl Series {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn data(&self) -> &TimeSeries {
        &self.data
    }
}

#[derive(Debug)]
pub struct Threshold {
    name: String,
    aggregate: Aggregate,
}

impl Threshold {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reducer(&self) -> Reducer {
        self.aggregate.reducer()
    }

    pub fn data(&self) -> TimeSeries {
        self.aggregate.get()
    }
}

impl Serialize for Threshold {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            name: &'a str,
            reducer: Reducer,
            points: TimeSeries,
        }

        Repr {
            name: &self.name,
            reducer: self.reducer(),
            points: self.data(),
        }
        .serialize(serializer)
    }
}
