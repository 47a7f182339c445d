//! HTTP JSON API over a task store.

use axum::{
    Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::board::{BoardView, partition};
use crate::config::ServerConfig;
use crate::error::{ApiError, ErrorCode};
use crate::store::TaskStore;
use crate::types::{ColumnId, NewTask, Task, TaskId, TaskPatch};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    store: Arc<dyn TaskStore>,
}

impl ApiServer {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code {
            ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,
            ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DatabaseError | ErrorCode::StoreUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(self)).into_response()
    }
}

/// Unwrap a JSON body, reporting malformed input as a field error.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::new(ErrorCode::InvalidFieldValue, rejection.body_text()))
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_tasks(State(state): State<ApiServer>) -> Json<Vec<Task>> {
    match state.store().list().await {
        Ok(tasks) => Json(tasks),
        Err(e) => {
            warn!(error = %e, "Failed to list tasks");
            Json(Vec::new())
        }
    }
}

async fn create_task(
    State(state): State<ApiServer>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let input = body(payload)?;
    let task = state.store().create(input).await?;
    info!(task_id = task.id, column = %task.column, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<ApiServer>,
    Path(id): Path<TaskId>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let patch = body(payload)?;
    Ok(Json(state.store().update(id, patch).await?))
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

async fn delete_task(
    State(state): State<ApiServer>,
    Path(id): Path<TaskId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state.store().delete(id).await?;
    info!(task_id = id, "Task deleted");
    Ok(Json(DeleteResponse { deleted: true }))
}

/// Body of `POST /api/tasks/{id}/move`.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub order: u32,
    #[serde(default)]
    pub column: Option<ColumnId>,
}

async fn move_task(
    State(state): State<ApiServer>,
    Path(id): Path<TaskId>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let request = body(payload)?;
    Ok(Json(
        state
            .store()
            .move_task(id, request.order, request.column)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct BoardQuery {
    q: Option<String>,
}

async fn board(State(state): State<ApiServer>, Query(query): Query<BoardQuery>) -> Json<BoardView> {
    let tasks = state.store().list().await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to list tasks");
        Vec::new()
    });
    let view = partition(&tasks);
    Json(match query.q {
        Some(q) => view.filtered(&q),
        None => view,
    })
}

/// Build the router with all routes.
pub fn build_router(state: ApiServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", patch(update_task).delete(delete_task))
        .route("/api/tasks/{id}/move", post(move_task))
        .route("/api/board", get(board))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until Ctrl-C.
pub async fn serve(config: &ServerConfig, store: Arc<dyn TaskStore>) -> anyhow::Result<()> {
    let app = build_router(ApiServer::new(store));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Kanban API listening on http://{}", bound_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;

    Ok(())
}

/// Resolve once `signal` fires. If the handler could not be installed the
/// server keeps running rather than stopping at once.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Kanban API shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C, graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}
