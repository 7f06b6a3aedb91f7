//! Document HTTP Routes
//!
//! Maps the orchestrator operations onto verbs and paths. Every body, success
//! or failure, is a response envelope.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{Envelope, RequestOrchestrator};
use crate::errors::{ErrorKind, StoreError, StoreResult};

// ==================
// Errors
// ==================

/// Store error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        status_for(self.0.kind())
    }
}

/// HTTP status for an error kind: not-found class 404, malformed request 400, otherwise 500
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        kind if kind.is_not_found() => StatusCode::NOT_FOUND,
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.0.kind().code(), error = %self.0, "request failed");
        } else {
            tracing::debug!(code = self.0.kind().code(), error = %self.0, "request rejected");
        }
        (status, Json(Envelope::error(&self.0))).into_response()
    }
}

type ApiResult = Result<Json<Envelope>, ApiError>;

/// Error envelope with an explicit status, for failures no error kind maps to
fn error_response(status: StatusCode, err: StoreError) -> Response {
    tracing::debug!(%status, error = %err, "request rejected");
    (status, Json(Envelope::error(&err))).into_response()
}

// ==================
// Query Parameters
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct IntroduceParams {
    #[serde(default)]
    pub spaceid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

impl QueryParams {
    fn max(&self) -> Result<Option<usize>, StoreError> {
        self.max
            .as_deref()
            .map(|m| {
                m.parse::<usize>().map_err(|_| {
                    StoreError::invalid_request(format!(
                        "Parameter 'max' must be a non-negative integer: '{}'",
                        m
                    ))
                })
            })
            .transpose()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ==================
// Routers
// ==================

/// Create the document routes
pub fn space_routes(orchestrator: Arc<RequestOrchestrator>) -> Router {
    Router::new()
        .route("/_types", enveloped(get(list_types_handler)))
        .route(
            "/:type/_introduce_type",
            enveloped(get(introduce_simple_handler).put(introduce_handler)),
        )
        .route("/:type/count", enveloped(get(count_handler)))
        .route(
            "/:type",
            enveloped(
                get(get_by_query_handler)
                    .post(write_handler)
                    .delete(delete_by_query_handler),
            ),
        )
        .route(
            "/:type/:id",
            enveloped(get(get_by_id_handler).delete(delete_by_id_handler)),
        )
        .with_state(orchestrator)
}

/// Health check route (available at root /health)
pub fn health_routes() -> Router {
    Router::new().route("/health", enveloped(get(health_handler)))
}

/// Answers unsupported methods on a known path with an error envelope
fn enveloped<S>(route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.fallback(method_not_allowed)
}

/// Fallback for paths no route matches
pub async fn route_not_found(method: Method, uri: Uri) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        StoreError::invalid_request(format!("No route for {} {}", method, uri.path())),
    )
}

async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        StoreError::invalid_request(format!(
            "Request method '{}' is not supported for {}",
            method,
            uri.path()
        )),
    )
}

// ==================
// Handlers
// ==================

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

async fn list_types_handler(State(orchestrator): State<Arc<RequestOrchestrator>>) -> Json<Envelope> {
    Json(orchestrator.list_types())
}

async fn introduce_simple_handler(
    State(orchestrator): State<Arc<RequestOrchestrator>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<IntroduceParams>, QueryRejection>,
) -> ApiResult {
    let type_name = path_params(path)?;
    let params = query_params(query)?;
    let envelope = blocking(move || {
        orchestrator.introduce_type_simple(&type_name, params.spaceid.as_deref())
    })
    .await?;
    Ok(Json(envelope))
}

async fn introduce_handler(
    State(orchestrator): State<Arc<RequestOrchestrator>>,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> ApiResult {
    let type_name = path_params(path)?;
    let body = body_text(&body)?;
    if body.trim().is_empty() {
        return Err(StoreError::invalid_request("Request body is empty").into());
    }
    let schema = parse_body(body)?;
    let envelope = blocking(move || orchestrator.introduce_type(&type_name, &schema)).await?;
    Ok(Json(envelope))
}

async fn get_by_query_handler(
    State(orchestrator): State<Arc<RequestOrchestrator>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult {
    let type_name = path_params(path)?;
    let params = query_params(query)?;
    let max = params.max()?;
    Ok(Json(orchestrator.get_by_query(
        &type_name,
        params.query.as_deref(),
        max,
    )?))
}

async fn count_handler(
    State(orchestrator): State<Arc<RequestOrchestrator>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult {
    let type_name = path_params(path)?;
    Ok(Json(orchestrator.count(&type_name)?))
}

async fn get_by_id_handler(
    State(orchestrator): State<Arc<RequestOrchestrator>>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult {
    let (type_name, id) = path_params(path)?;
    Ok(Json(orchestrator.get_by_id(&type_name, &id)?))
}

async fn delete_by_id_handler(
    State(orchestrator): State<Arc<RequestOrchestrator>>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> ApiResult {
    let (type_name, id) = path_params(path)?;
    Ok(Json(orchestrator.delete_by_id(&type_name, &id)?))
}

async fn delete_by_query_handler(
    State(orchestrator): State<Arc<RequestOrchestrator>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult {
    let type_name = path_params(path)?;
    let params = query_params(query)?;
    let max = params.max()?;
    Ok(Json(orchestrator.delete_by_query(
        &type_name,
        params.query.as_deref(),
        max,
    )?))
}

async fn write_handler(
    State(orchestrator): State<Arc<RequestOrchestrator>>,
    path: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> ApiResult {
    let type_name = path_params(path)?;
    let payload = parse_body(body_text(&body)?)?;
    Ok(Json(orchestrator.write(&type_name, &payload)?))
}

// ==================
// Helper Functions
// ==================

fn body_text(body: &[u8]) -> StoreResult<&str> {
    std::str::from_utf8(body)
        .map_err(|e| StoreError::invalid_request(format!("Request body is not valid UTF-8: {}", e)))
}

fn parse_body(body: &str) -> StoreResult<Value> {
    serde_json::from_str(body)
        .map_err(|e| StoreError::invalid_request(format!("Malformed JSON body: {}", e)))
}

fn path_params<T>(path: Result<Path<T>, PathRejection>) -> StoreResult<T> {
    path.map(|Path(params)| params)
        .map_err(|e| StoreError::invalid_request(e.body_text()))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> StoreResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| StoreError::invalid_request(e.body_text()))
}

/// Runs a registration on the blocking pool; a persistent registry writes to disk
async fn blocking<F>(operation: F) -> StoreResult<Envelope>
where
    F: FnOnce() -> StoreResult<Envelope> + Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| StoreError::collaborator("TaskJoin", e.to_string()))?
}
