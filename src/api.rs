//! HTTP routes for resource CRUD and validation.
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `GET /{resource}` | list |
//! | `GET /{resource}/{id}` | get by id |
//! | `POST /{resource}` | create |
//! | `PUT /{resource}/{id}` | update |
//! | `DELETE /{resource}/{id}` | delete |
//! | `POST /validate/{resource}` | validate only |
//!
//! Failures are reported as `{"error": "..."}` with the status given by
//! [`Operation::failure_status`].

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::HandlerError;
use crate::handler::ResourceHandler;
use crate::types::Operation;

/// Shared state for API handlers.
pub type ApiState = Arc<ResourceHandler>;

/// Body of every failed API response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed operation, rendered with the operation's failure status.
#[derive(Debug)]
pub struct ApiError {
    operation: Operation,
    message: String,
}

impl ApiError {
    fn new(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.operation.failure_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

/// Create the resource API routes.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/validate/:resource", post(validate_handler))
        .route("/:resource", get(list_handler).post(create_handler))
        .route(
            "/:resource/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .with_state(state)
}

/// Run a blocking handler operation off the async runtime and map its failure.
async fn run<F>(operation: Operation, resource: &str, f: F) -> ApiResult
where
    F: FnOnce() -> Result<Value, HandlerError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| {
            Err(HandlerError::Internal {
                message: e.to_string(),
            })
        });

    match outcome {
        Ok(value) => Ok(Json(value)),
        Err(e) => {
            tracing::warn!(
                operation = operation.as_str(),
                resource,
                error = %e,
                "request failed"
            );
            Err(ApiError::new(operation, e.to_string()))
        }
    }
}

/// Unwrap a JSON request body, reporting malformed bodies with the operation's status.
///
/// A request without a JSON content type is read as an empty object.
fn body_or_error(
    operation: Operation,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(Value::Object(Map::new())),
        Err(rejection) => Err(ApiError::new(operation, rejection.body_text())),
    }
}

async fn list_handler(State(handler): State<ApiState>, Path(resource): Path<String>) -> ApiResult {
    let name = resource.clone();
    run(Operation::List, &name, move || handler.list(&resource)).await
}

async fn get_handler(
    State(handler): State<ApiState>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult {
    let name = resource.clone();
    run(Operation::GetById, &name, move || {
        handler.get_by_id(&resource, &id)
    })
    .await
}

async fn create_handler(
    State(handler): State<ApiState>,
    Path(resource): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let body = body_or_error(Operation::Create, body)?;
    let name = resource.clone();
    run(Operation::Create, &name, move || {
        handler.create(&resource, body)
    })
    .await
}

async fn update_handler(
    State(handler): State<ApiState>,
    Path((resource, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let body = body_or_error(Operation::Update, body)?;
    let name = resource.clone();
    run(Operation::Update, &name, move || {
        handler.update(&resource, &id, body)
    })
    .await
}

async fn delete_handler(
    State(handler): State<ApiState>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult {
    let name = resource.clone();
    run(Operation::Delete, &name, move || handler.delete(&resource, &id)).await
}

async fn validate_handler(
    State(handler): State<ApiState>,
    Path(resource): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult {
    let body = body_or_error(Operation::Validate, body)?;
    let result = tokio::task::spawn_blocking(move || handler.validate_only(&resource, &body))
        .await
        .map_err(|e| ApiError::new(Operation::Validate, e.to_string()))?;

    serde_json::to_value(result)
        .map(Json)
        .map_err(|e| ApiError::new(Operation::Validate, e.to_string()))
}
