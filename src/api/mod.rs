//! REST API module.
//!
//! Contains all API routes and handlers. Every response uses the
//! `{ success, data }` / `{ success, error }` envelope.

mod accounts;
mod records;
mod search;
mod services;
mod verify;

pub use accounts::*;
pub use records::*;
pub use search::*;
pub use services::*;
pub use verify::*;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::ReportFamily;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// Unwrap a JSON object body, turning extractor rejections into enveloped errors.
fn json_object(
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Map<String, Value>, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Resolve a `{family}` path segment.
fn family_from_slug(slug: &str) -> Result<ReportFamily, AppError> {
    ReportFamily::from_slug(slug)
        .ok_or_else(|| AppError::NotFound(format!("Unknown report family {}", slug)))
}
