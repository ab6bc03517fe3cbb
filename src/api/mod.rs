use crate::config::Config;
use crate::model::{ApplicationId, World};
use crate::source::{CacheMetadata, SnapshotLoader, SourceError};
use crate::views;
use crate::window::{resolve, Resolution};
use dashboard::{Dashboard, Time};
use serde::Serialize;
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use std::sync::Arc;

pub mod http;
mod params;

pub use params::{RangeParams, TimeRange};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("upstream failure: {0}")]
    Upstream(#[from] SourceError),

    #[error("deadline exceeded while waiting for upstream")]
    DeadlineExceeded,
}

/// Result of loading the world for a request. A cache that has not caught up
/// with the requested range is a normal outcome, not an error.
#[derive(Debug)]
pub enum Loaded {
    NotAvailableYet { last_update: Time },
    Ready { world: World, last_update: Time },
}

/// Response envelope that keeps "no data yet" distinct from data that
/// happens to be empty.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    #[serde(rename = "not_available", rename_all = "camelCase")]
    NotAvailableYet { last_update: Time },
    #[serde(rename_all = "camelCase")]
    Ok { last_update: Time, data: T },
}

/// Entry of the project listing.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
}

pub struct Api {
    config: Arc<Config>,
    cache: Arc<dyn CacheMetadata>,
    loader: Arc<dyn SnapshotLoader>,
}

impl Api {
    pub fn new(
        config: Arc<Config>,
        cache: Arc<dyn CacheMetadata>,
        loader: Arc<dyn SnapshotLoader>,
    ) -> Self {
        Self {
            config,
            cache,
            loader,
        }
    }

    pub fn projects(&self) -> Vec<ProjectSummary> {
        self.config
            .projects()
            .map(|(id, project)| ProjectSummary {
                id: id.to_string(),
                name: project.name(id).to_string(),
            })
            .collect()
    }

    /// Resolves the window for `range` against the project's cache and loads
    /// the snapshot for it. Both collaborator calls are abandoned once
    /// `deadline` passes.
    pub async fn load_world(
        &self,
        project: &str,
        range: TimeRange,
        deadline: Instant,
    ) -> Result<Loaded, Error> {
        let step = self
            .config
            .project(project)
            .ok_or_else(|| Error::NotFound(format!("project {project}")))?
            .refresh_interval();

        let last_update = timeout_at(deadline, self.cache.last_update(project))
            .await
            .map_err(|_| Error::DeadlineExceeded)??;

        let window = match resolve(range.from, range.to, step, last_update) {
            Resolution::Available(window) => window,
            Resolution::NotAvailableYet { last_update } => {
                debug!("{project}: cache last updated at {last_update}, data not available yet");
                return Ok(Loaded::NotAvailableYet { last_update });
            }
        };

        debug!(
            "{project}: loading snapshot from {} to {} ({}) with step {}",
            window.from,
            window.to,
            window.duration(),
            window.step
        );

        let world = timeout_at(deadline, self.loader.load_snapshot(project, window))
            .await
            .map_err(|_| Error::DeadlineExceeded)??;

        debug!(
            "{project}: snapshot has {} applications and {} nodes",
            world.applications().len(),
            world.nodes().len()
        );

        Ok(Loaded::Ready { world, last_update })
    }

    pub async fn application(
        &self,
        project: &str,
        app: &str,
        range: TimeRange,
        deadline: Instant,
    ) -> Result<Outcome<Vec<Dashboard>>, Error> {
        let id: ApplicationId = app
            .parse()
            .map_err(|e| Error::InvalidInput(format!("{e}")))?;

        match self.load_world(project, range, deadline).await? {
            Loaded::NotAvailableYet { last_update } => Ok(Outcome::NotAvailableYet { last_update }),
            Loaded::Ready { world, last_update } => {
                let app = world
                    .application(&id)
                    .ok_or_else(|| Error::NotFound(format!("application {id}")))?;

                Ok(Outcome::Ok {
                    last_update,
                    data: views::application(&world, app),
                })
            }
        }
    }

    pub async fn node(
        &self,
        project: &str,
        node: &str,
        range: TimeRange,
        deadline: Instant,
    ) -> Result<Outcome<Vec<Dashboard>>, Error> {
        match self.load_world(project, range, deadline).await? {
            Loaded::NotAvailableYet { last_update } => Ok(Outcome::NotAvailableYet { last_update }),
            Loaded::Ready { world, last_update } => {
                let node = world
                    .node(node)
                    .ok_or_else(|| Error::NotFound(format!("node {node}")))?;

                Ok(Outcome::Ok {
                    last_update,
                    data: views::node(&world, node),
                })
            }
        }
    }
}
