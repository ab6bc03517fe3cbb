use super::*;

use crate::model::{ApplicationId, Container, Node, WorldBuilder};
use dashboard::TimeSeries;
use serde::Deserialize;
use tracing::debug;

use std::collections::BTreeMap;
use std::path::Path;

const CACHE_FILE: &str = "cache.json";
const SNAPSHOT_FILE: &str = "snapshot.json";

/// Serves cache metadata and snapshots from a directory tree with one
/// sub-directory per project:
///
/// ```text
/// <root>/<project>/cache.json     {"last_update": <unix seconds>}
/// <root>/<project>/snapshot.json  nodes and applications with raw samples
/// ```
///
/// Raw samples are `[unix_seconds, value]` pairs at any resolution; they are
/// placed onto the grid of the requested window when a snapshot is loaded.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, project: &str, file: &str) -> Result<PathBuf, SourceError> {
        if project.is_empty() || project.contains(['/', '\\']) || project.starts_with('.') {
            return Err(SourceError::Invalid(format!("bad project id: {project}")));
        }

        Ok(self.root.join(project).join(file))
    }
}

#[async_trait]
impl CacheMetadata for FileStore {
    async fn last_update(&self, project: &str) -> Result<Time, SourceError> {
        let path = self.path(project, CACHE_FILE)?;

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no cache metadata for {project} yet");
                return Ok(Time(0));
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };

        let cache: RawCache = parse(&path, &content)?;

        Ok(cache.last_update)
    }
}

#[async_trait]
impl SnapshotLoader for FileStore {
    async fn load_snapshot(&self, project: &str, window: Window) -> Result<World, SourceError> {
        let path = self.path(project, SNAPSHOT_FILE)?;

        let content = tokio::fs::read(&path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;

        let snapshot: RawSnapshot = parse(&path, &content)?;

        debug!(
            "loaded snapshot for {project}: {} nodes, {} applications",
            snapshot.nodes.len(),
            snapshot.applications.len()
        );

        snapshot.into_world(window)
    }
}

fn parse<'a, T: Deserialize<'a>>(path: &Path, content: &'a [u8]) -> Result<T, SourceError> {
    serde_json::from_slice(content).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

type Samples = Vec<(Time, Option<f64>)>;

#[derive(Deserialize)]
struct RawCache {
    last_update: Time,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    applications: Vec<RawApplication>,
}

#[derive(Deserialize)]
struct RawNode {
    name: String,
    #[serde(default)]
    cpu_usage_percent: Samples,
    #[serde(default)]
    cpu_usage_by_mode: BTreeMap<String, Samples>,
    #[serde(default)]
    cpu_capacity: Samples,
}

#[derive(Deserialize)]
struct RawApplication {
    id: String,
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Deserialize)]
struct RawInstance {
    name: String,
    #[serde(default)]
    node: Option<String>,
    #[serde(default)]
    containers: Vec<RawContainer>,
}

#[derive(Deserialize)]
struct RawContainer {
    name: String,
    #[serde(default)]
    cpu_usage: Samples,
    #[serde(default)]
    cpu_limit: Samples,
    #[serde(default)]
    cpu_delay: Samples,
    #[serde(default)]
    throttled_time: Samples,
}

impl RawSnapshot {
    fn into_world(self, window: Window) -> Result<World, SourceError> {
        let grid = |samples: Samples| {
            TimeSeries::from_samples(
                window.from,
                window.to,
                window.step,
                samples
                    .into_iter()
                    .map(|(t, v)| (t, v.unwrap_or(f64::NAN))),
            )
        };

        let mut builder = WorldBuilder::new(window.from, window.to, window.step);

        for raw in self.nodes {
            let mut node = Node::new(raw.name);
            node.cpu_usage_percent = grid(raw.cpu_usage_percent);
            node.cpu_capacity = grid(raw.cpu_capacity);
            node.cpu_usage_by_mode = raw
                .cpu_usage_by_mode
                .into_iter()
                .map(|(mode, samples)| (mode, grid(samples)))
                .collect();
            builder.add_node(node);
        }

        for raw in self.applications {
            let id: ApplicationId = raw
                .id
                .parse()
                .map_err(|e| SourceError::Invalid(format!("{e}")))?;

            builder.add_application(id.clone());

            for instance in raw.instances {
                let containers = instance
                    .containers
                    .into_iter()
                    .map(|c| Container {
                        name: c.name,
                        cpu_usage: grid(c.cpu_usage),
                        cpu_limit: grid(c.cpu_limit),
                        cpu_delay: grid(c.cpu_delay),
                        throttled_time: grid(c.throttled_time),
                    })
                    .collect();

                builder.add_instance(&id, instance.name, instance.node.as_deref(), containers);
            }
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard::Duration;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    fn write(dir: &tempfile::TempDir, project: &str, file: &str, content: &str) {
        let path = dir.path().join(project);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn missing_cache_metadata_means_never_updated() {
        let (_dir, store) = store();
        assert_eq!(store.last_update("prod").await.unwrap(), Time(0));
    }

    #[tokio::test]
    async fn reads_cache_metadata() {
        let (dir, store) = store();
        write(&dir, "prod", CACHE_FILE, r#"{"last_update": 1700000000}"#);

        assert_eq!(store.last_update("prod").await.unwrap(), Time(1_700_000_000));
    }

    #[tokio::test]
    async fn malformed_files_are_parse_errors() {
        let (dir, store) = store();
        write(&dir, "prod", CACHE_FILE, "not json");

        assert!(matches!(
            store.last_update("prod").await,
            Err(SourceError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_path_like_project_ids() {
        let (_dir, store) = store();

        for project in ["", "../etc", "a/b", ".hidden"] {
            assert!(matches!(
                store.last_update(project).await,
                Err(SourceError::Invalid(_))
            ));
        }
    }

    #[tokio::test]
    async fn missing_snapshot_is_an_io_error() {
        let (_dir, store) = store();
        let window = Window {
            from: Time(0),
            to: Time(60),
            step: Duration::MINUTE,
        };

        assert!(matches!(
            store.load_snapshot("prod", window).await,
            Err(SourceError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn loads_snapshot_onto_the_window_grid() {
        let (dir, store) = store();
        write(
            &dir,
            "prod",
            SNAPSHOT_FILE,
            r#"{
                "nodes": [{
                    "name": "node-1",
                    "cpu_usage_percent": [[60, 10.0], [75, 20.0], [120, 30.0]],
                    "cpu_usage_by_mode": {"user": [[60, 1.0]], "system": [[180, null]]},
                    "cpu_capacity": [[60, 4.0], [120, 4.0], [180, 4.0]]
                }],
                "applications": [{
                    "id": "default:Deployment:web",
                    "instances": [{
                        "name": "web-1",
                        "node": "node-1",
                        "containers": [{"name": "app", "cpu_usage": [[120, 0.5]]}]
                    }]
                }]
            }"#,
        );

        let window = Window {
            from: Time(60),
            to: Time(180),
            step: Duration::MINUTE,
        };
        let world = store.load_snapshot("prod", window).await.unwrap();

        let node = world.node("node-1").unwrap();
        assert_eq!(node.cpu_usage_percent.len(), 3);
        assert_eq!(node.cpu_usage_percent.values()[0], 20.0);
        assert_eq!(node.cpu_usage_percent.values()[1], 30.0);
        assert!(node.cpu_usage_percent.values()[2].is_nan());
        assert!(node.cpu_usage_by_mode["system"].is_missing());

        let app = world
            .application(&ApplicationId::new("default", "Deployment", "web"))
            .unwrap();
        let instance = world.instances_of(app).next().unwrap();
        assert_eq!(world.node_of(instance).unwrap().name, "node-1");

        let container = &instance.containers()[0];
        assert_eq!(container.cpu_usage.from(), Time(60));
        assert_eq!(container.cpu_usage.values()[1], 0.5);
        assert!(container.cpu_limit.is_missing());
    }

    #[tokio::test]
    async fn invalid_application_id_is_rejected() {
        let (dir, store) = store();
        write(
            &dir,
            "prod",
            SNAPSHOT_FILE,
            r#"{"applications": [{"id": "web"}]}"#,
        );

        let window = Window {
            from: Time(0),
            to: Time(60),
            step: Duration::MINUTE,
        };

        assert!(matches!(
            store.load_snapshot("prod", window).await,
            Err(SourceError::Invalid(_))
        ));
    }
}
