use crate::config::AppConfig;
use crate::marker::Marker;
use crate::processing::{MapBuild, RunSummary};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

/// Marker position (`[lon, lat]`) tagged with its index in `AppState::markers`.
type MarkerIndex = GeomWithData<[f64; 2], usize>;

pub struct AppState {
    pub markers: Vec<Marker>,
    pub summary: RunSummary,
    pub tree: RTree<MarkerIndex>,
}

impl AppState {
    pub fn new(build: MapBuild) -> Self {
        let items: Vec<MarkerIndex> = build
            .markers
            .iter()
            .enumerate()
            .map(|(i, m)| GeomWithData::new([m.lon, m.lat], i))
            .collect();
        Self {
            tree: RTree::bulk_load(items),
            markers: build.markers,
            summary: build.summary,
        }
    }

    /// The location group closest to the given point. `None` for
    /// non-finite coordinates, which the R-tree cannot order.
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<&Marker> {
        if !(lat.is_finite() && lon.is_finite()) {
            return None;
        }
        self.tree
            .nearest_neighbor(&[lon, lat])
            .and_then(|item| self.markers.get(item.data))
    }
}

#[derive(Deserialize)]
pub struct QueryParams {
    lat: f64,
    lon: f64,
}

pub fn router(state: Arc<AppState>, config: &AppConfig) -> Router {
    let site = ServeDir::new(config.output.site_dir());

    Router::new()
        .route("/api/markers", get(markers_handler))
        .route("/api/summary", get(summary_handler))
        .route("/api/query", get(query_handler))
        .fallback_service(site)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, build: MapBuild) -> Result<()> {
    info!("Building spatial index for {} markers...", build.markers.len());
    let state = Arc::new(AppState::new(build));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Serving {:?} on http://{}", config.output.site_dir(), addr);

    let app = router(state, &config);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn markers_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Marker>> {
    Json(state.markers.clone())
}

async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<RunSummary> {
    Json(state.summary)
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<Marker>> {
    Json(state.nearest(params.lat, params.lon).cloned())
}
