//! Camera range endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use super::super::AppState;
use crate::service::{LookupError, LookupResult};

type ApiResult = Result<Json<LookupResult>, LookupError>;

/// Every range as a single page.
pub async fn list_serial_numbers(State(state): State<AppState>) -> ApiResult {
    state.service.list_all().await.map(Json)
}

/// One range by primary key.
pub async fn get_serial_number(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.service.find_by_id(&id).await.map(Json)
}

/// The range containing a serial number.
pub async fn lookup_serial(State(state): State<AppState>, Path(serial): Path<String>) -> ApiResult {
    state.service.find_by_serial(&serial).await.map(Json)
}

// Mutation routes take the raw body so that a malformed payload is still
// answered with 405 rather than an extractor rejection.

pub async fn create_serial_number(State(state): State<AppState>, body: Bytes) -> ApiResult {
    state.service.create(&payload(&body)).map(Json)
}

pub async fn update_serial_number(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult {
    state.service.update(&id, &payload(&body)).map(Json)
}

pub async fn delete_serial_number(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state.service.delete(&id).map(Json)
}

fn payload(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}
