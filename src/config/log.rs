use super::*;

use tracing_subscriber::filter::LevelFilter;

#[derive(Deserialize, Default)]
pub struct Log {
    #[serde(default)]
    level: Level,
}

impl Log {
    pub fn level(&self) -> LevelFilter {
        match self.level {
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Info => LevelFilter::INFO,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(deny_unknown_fields)]
enum Level {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}
