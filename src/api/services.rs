//! Service catalogue API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{CreateServiceRequest, ListServicesQuery, Service, UpdateServiceRequest};
use crate::payload;
use crate::AppState;

/// GET /api/services - List services.
pub async fn list_services(
    State(state): State<AppState>,
    Query(params): Query<ListServicesQuery>,
) -> ApiResult<Vec<Service>> {
    success(state.repo.list_services(params.include_inactive).await?)
}

/// GET /api/services/:id - Get a single service.
pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Service> {
    payload::check_id("id", &id)?;

    match state.repo.get_service(&id).await? {
        Some(service) => success(service),
        None => Err(AppError::NotFound(format!("Service {} not found", id))),
    }
}

/// POST /api/services - Create a service.
pub async fn create_service(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<CreateServiceRequest>, JsonRejection>,
) -> ApiResult<Service> {
    caller.require_elevated()?;
    let Json(request) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    if request.name.trim().is_empty() {
        return Err(AppError::validation("name", "Service name is required"));
    }

    success(state.repo.create_service(&request).await?)
}

/// PUT /api/services/:id - Update a service.
pub async fn update_service(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    body: Result<Json<UpdateServiceRequest>, JsonRejection>,
) -> ApiResult<Service> {
    caller.require_elevated()?;
    payload::check_id("id", &id)?;
    let Json(request) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    if request.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::validation("name", "Service name must not be empty"));
    }

    success(state.repo.update_service(&id, &request).await?)
}

/// DELETE /api/services/:id - Deactivate a service.
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Service> {
    caller.require_elevated()?;
    payload::check_id("id", &id)?;

    success(state.repo.deactivate_service(&id).await?)
}
