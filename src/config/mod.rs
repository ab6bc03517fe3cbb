use serde::Deserialize;

use std::collections::BTreeMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

mod general;
mod log;
mod project;

pub use general::General;
pub use log::Log;
pub use project::Project;

fn listen() -> String {
    "0.0.0.0:8080".into()
}

fn snapshots() -> String {
    "/var/lib/vantage/snapshots".into()
}

fn request_timeout() -> String {
    "30s".into()
}

fn refresh_interval() -> String {
    "30s".into()
}

/// Parses a humantime duration such as `30s` or `5m`, naming `field` in the
/// error.
fn parse_duration(field: &str, value: &str) -> Result<std::time::Duration, String> {
    value
        .parse::<humantime::Duration>()
        .map(Into::into)
        .map_err(|e| format!("{field} couldn't be parsed: {e}"))
}

#[derive(Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    general: General,
    #[serde(default)]
    log: Log,
    #[serde(default)]
    projects: BTreeMap<String, Project>,
}

impl Config {
    pub fn load(path: &dyn AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("unable to open config file: {e}"))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Config =
            toml::from_str(content).map_err(|e| format!("failed to parse config file: {e}"))?;

        config.general.check()?;

        for (id, project) in config.projects.iter() {
            project.check(id)?;
        }

        Ok(config)
    }

    pub fn general(&self) -> &General {
        &self.general
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn projects(&self) -> impl Iterator<Item = (&str, &Project)> {
        self.projects.iter().map(|(id, p)| (id.as_str(), p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard::Duration;

    #[test]
    fn parses_a_full_config() {
        let config = Config::parse(
            r#"
            [general]
            listen = "127.0.0.1:9000"
            snapshots = "/tmp/snapshots"
            request_timeout = "5s"

            [log]
            level = "debug"

            [projects.prod]
            name = "Production"
            refresh_interval = "1m"

            [projects.staging]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.general().listen().unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.general().snapshots(), PathBuf::from("/tmp/snapshots"));
        assert_eq!(
            config.general().request_timeout(),
            std::time::Duration::from_secs(5)
        );
        assert_eq!(
            config.log().level(),
            tracing_subscriber::filter::LevelFilter::DEBUG
        );

        let prod = config.project("prod").unwrap();
        assert_eq!(prod.name("prod"), "Production");
        assert_eq!(prod.refresh_interval(), Duration::MINUTE);

        let staging = config.project("staging").unwrap();
        assert_eq!(staging.name("staging"), "staging");
        assert_eq!(staging.refresh_interval(), Duration::seconds(30));

        assert!(config.project("missing").is_none());
        assert_eq!(config.projects().count(), 2);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.general().request_timeout().as_secs(), 30);
        assert_eq!(
            config.log().level(),
            tracing_subscriber::filter::LevelFilter::INFO
        );
        assert_eq!(config.projects().count(), 0);
    }

    #[test]
    fn rejects_bad_refresh_interval() {
        let result = Config::parse(
            r#"
            [projects.prod]
            refresh_interval = "500ms"
            "#,
        );
        assert!(result.is_err());

        let result = Config::parse(
            r#"
            [projects.prod]
            refresh_interval = "soon"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn sample_config_is_valid() {
        let config = Config::load(&concat!(env!("CARGO_MANIFEST_DIR"), "/config/vantage.toml"))
            .unwrap();

        let names: Vec<&str> = config.projects().map(|(id, p)| p.name(id)).collect();
        assert_eq!(names, vec!["Production", "staging"]);
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(Config::parse("[log]\nlevel = \"loud\"\n").is_err());
    }
}
