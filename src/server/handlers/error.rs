//! Error responses in the `{data: null, error: {...}}` shape.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::service::LookupError;

/// Message sent for every backend fault.
const INTERNAL_MESSAGE: &str = "Internal Server Error";

pub fn error_response(status: StatusCode, name: &str, message: &str) -> Response {
    let body = json!({
        "data": null,
        "error": {
            "status": status.as_u16(),
            "name": name,
            "message": message,
        }
    });
    (status, Json(body)).into_response()
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = match &self {
            LookupError::Validation(_) => StatusCode::BAD_REQUEST,
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            LookupError::Connection | LookupError::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.is_fault() {
            return error_response(status, "InternalServerError", INTERNAL_MESSAGE);
        }

        let mut response = error_response(status, self.name(), &self.to_string());
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, header::HeaderValue::from_static("GET"));
        }
        response
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "NotFoundError", "Not Found")
}
