//! HTTP JSON API над table-engine.
//!
//! Snapshot держится как `Arc<Snapshot>` под `RwLock`: запросы берут
//! клон Arc и считают view без блокировки, refresh подменяет Arc целиком.

mod error;
mod query;

pub use error::ApiError;
pub use query::parse_table_query;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::json;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use fello_api::EntityKind;
use table_engine::{EntityConfig, Snapshot, TableQuery};

// ════════════════════════════════════════════════════════════════
//  Snapshot source
// ════════════════════════════════════════════════════════════════

pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<Snapshot, String>> + Send + 'a>>;

/// Откуда берётся snapshot при старте и на `POST /api/refresh`.
pub trait SnapshotSource: Send + Sync {
    fn name(&self) -> &str;

    fn load(&self) -> SourceFuture<'_>;
}

/// Фиксированный snapshot (тесты, офлайн режим без перечитывания).
pub struct StaticSource(pub Snapshot);

impl SnapshotSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self) -> SourceFuture<'_> {
        let snapshot = self.0.clone();
        Box::pin(async move { Ok(snapshot) })
    }
}

// ════════════════════════════════════════════════════════════════
//  State
// ════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct AppState {
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
    source: Arc<dyn SnapshotSource>,
}

impl AppState {
    pub fn new(snapshot: Snapshot, source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
            source,
        }
    }

    /// Первичная загрузка из источника.
    pub async fn load(source: Arc<dyn SnapshotSource>) -> Result<Self, String> {
        let snapshot = source.load().await?;
        Ok(Self::new(snapshot, source))
    }

    pub async fn current(&self) -> Arc<Snapshot> {
        self.snapshot.read().await.clone()
    }

    /// Перечитать источник и заменить snapshot. При ошибке остаётся старый.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, String> {
        let fresh = Arc::new(self.source.load().await?);
        *self.snapshot.write().await = fresh.clone();
        tracing::info!(source = self.source.name(), "snapshot refreshed");
        Ok(fresh)
    }
}

// ════════════════════════════════════════════════════════════════
//  Server
// ════════════════════════════════════════════════════════════════

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/refresh", post(handle_refresh))
        .route("/api/{entity}/columns", get(handle_columns))
        .route("/api/{entity}/table", get(handle_table))
        .route("/api/{entity}/facets", get(handle_facets))
        .route("/api/{entity}/stats", get(handle_stats))
        .with_state(state)
}

/// Table HTTP API сервер.
pub async fn run(port: u16, state: AppState, shutdown: CancellationToken) -> Result<(), String> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| format!("bind api :{port}: {e}"))?;
    tracing::info!(port, "table API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| format!("axum serve: {e}"))?;

    Ok(())
}

fn entity(raw: &str) -> Result<EntityKind, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::UnknownEntity(raw.to_string()))
}

fn table_query(kind: EntityKind, pairs: Vec<(String, String)>) -> Result<TableQuery, ApiError> {
    let query = parse_table_query(pairs)?;
    query.validate(EntityConfig::for_kind(kind))?;
    Ok(query)
}

// --- GET /api/health ---

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.current().await;
    axum::Json(json!({
        "status": "ok",
        "source": state.source.name(),
        "fellows": snapshot.len(EntityKind::Fellows),
        "finders": snapshot.len(EntityKind::Finders),
        "interactions": snapshot.len(EntityKind::Interactions),
    }))
}

// --- POST /api/refresh ---

async fn handle_refresh(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.refresh().await.map_err(ApiError::Refresh)?;
    Ok(axum::Json(json!({
        "fellows": snapshot.len(EntityKind::Fellows),
        "finders": snapshot.len(EntityKind::Finders),
        "interactions": snapshot.len(EntityKind::Interactions),
    })))
}

// --- GET /api/{entity}/columns ---

async fn handle_columns(Path(raw): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let kind = entity(&raw)?;
    Ok(axum::Json(EntityConfig::for_kind(kind)))
}

// --- GET /api/{entity}/table?col=v&col=v&q=&sort=&order=&page=&page_size= ---

async fn handle_table(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = entity(&raw)?;
    let query = table_query(kind, pairs)?;
    let snapshot = state.current().await;
    Ok(axum::Json(snapshot.view(kind, &query)))
}

// --- GET /api/{entity}/facets?... ---

async fn handle_facets(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = entity(&raw)?;
    let query = table_query(kind, pairs)?;
    let snapshot = state.current().await;
    Ok(axum::Json(snapshot.facets(kind, &query)))
}

// --- GET /api/{entity}/stats ---

async fn handle_stats(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = entity(&raw)?;
    let snapshot = state.current().await;
    Ok(axum::Json(snapshot.stats(kind)))
}
