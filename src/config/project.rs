use super::*;

use dashboard::Duration;

#[derive(Deserialize)]
pub struct Project {
    // display name, defaults to the project id
    #[serde(default)]
    name: Option<String>,

    // how often the metrics cache is refreshed, which is also the base step
    // of every rendered time series
    #[serde(default = "refresh_interval")]
    refresh_interval: String,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: None,
            refresh_interval: refresh_interval(),
        }
    }
}

impl Project {
    pub fn check(&self, id: &str) -> Result<(), String> {
        let interval = parse_duration("refresh_interval", &self.refresh_interval)
            .map_err(|e| format!("project '{id}': {e}"))?;

        if interval.as_secs() == 0 {
            return Err(format!(
                "project '{id}': refresh_interval must be at least one second"
            ));
        }

        Duration::try_from(interval)
            .map_err(|_| format!("project '{id}': refresh_interval is too large"))?;

        Ok(())
    }

    pub fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(id)
    }

    pub fn refresh_interval(&self) -> Duration {
        parse_duration("refresh_interval", &self.refresh_interval)
            .ok()
            .and_then(|interval| Duration::try_from(interval).ok())
            .unwrap_or(Duration::seconds(30))
    }
}
