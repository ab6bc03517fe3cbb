use super::*;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tracing::{error, info, warn};

use std::net::SocketAddr;
use std::time::Duration;

/// Application state for HTTP handlers
pub struct AppState {
    pub api: Api,
    /// Time budget for the collaborator calls of one request
    pub timeout: Duration,
}

/// Start the HTTP server
pub async fn serve(listen: SocketAddr, api: Api, timeout: Duration) -> std::io::Result<()> {
    let state = Arc::new(AppState { api, timeout });

    let listener = TcpListener::bind(listen).await?;

    info!("HTTP endpoint listening on {}", listen);

    axum::serve(listener, app(state)).await
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/projects", get(projects))
        .route("/api/project/{project}/app/{app}", get(application))
        .route("/api/project/{project}/node/{node}", get(node))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(CompressionLayer::new()))
}

async fn root() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        "Vantage {version}\n\n\
         Endpoints:\n\
         - GET /api/projects - Configured projects\n\
         - GET /api/project/{{project}}/app/{{namespace:kind:name}}?from=&to= - Application dashboards\n\
         - GET /api/project/{{project}}/node/{{node}}?from=&to= - Node dashboards\n"
    )
}

async fn projects(State(state): State<Arc<AppState>>) -> Json<Vec<ProjectSummary>> {
    Json(state.api.projects())
}

async fn application(
    State(state): State<Arc<AppState>>,
    Path((project, app)): Path<(String, String)>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Outcome<Vec<Dashboard>>>, Error> {
    let range = params.resolve(Time::now())?;
    let deadline = Instant::now() + state.timeout;

    state
        .api
        .application(&project, &app, range, deadline)
        .await
        .map(Json)
}

async fn node(
    State(state): State<Arc<AppState>>,
    Path((project, node)): Path<(String, String)>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Outcome<Vec<Dashboard>>>, Error> {
    let range = params.resolve(Time::now())?;
    let deadline = Instant::now() + state.timeout;

    state
        .api
        .node(&project, &node, range, deadline)
        .await
        .map(Json)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        };

        if status.is_server_error() {
            error!("{self}");
        } else {
            warn!("{self}");
        }

        (status, self.to_string()).into_response()
    }
}
