use crate::model::World;
use crate::window::Window;
use async_trait::async_trait;
use dashboard::Time;
use thiserror::Error;

use std::path::PathBuf;

mod file;

pub use file::FileStore;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

/// Reports how far the metrics cache of a project has been filled.
#[async_trait]
pub trait CacheMetadata: Send + Sync {
    /// The time of the last cache update, `Time(0)` if there never was one.
    async fn last_update(&self, project: &str) -> Result<Time, SourceError>;
}

/// Builds the topology snapshot of a project for a resolved window.
#[async_trait]
pub trait SnapshotLoader: Send + Sync {
    async fn load_snapshot(&self, project: &str, window: Window) -> Result<World, SourceError>;
}
