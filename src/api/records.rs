//! Inspection record API endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde_json::{Map, Value};

use super::{family_from_slug, json_object, success, ApiResult};
use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::{FamilyDescriptor, InspectionRecord, ListRecordsQuery, ReportFamily};
use crate::payload;
use crate::AppState;

/// GET /api/families - Describe report families, form types and their fields.
pub async fn list_families() -> ApiResult<Vec<FamilyDescriptor>> {
    success(ReportFamily::ALL.into_iter().map(FamilyDescriptor::from).collect())
}

/// GET /api/records/:family - List records visible to the caller.
pub async fn list_records(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(family): Path<String>,
    Query(filter): Query<ListRecordsQuery>,
) -> ApiResult<Vec<InspectionRecord>> {
    let family = family_from_slug(&family)?;
    let records = state
        .repo
        .list_records(family, &caller.scope(), &filter)
        .await?;
    success(records)
}

/// GET /api/records/:family/:id - Get a single record.
pub async fn get_record(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((family, id)): Path<(String, String)>,
) -> ApiResult<InspectionRecord> {
    let family = family_from_slug(&family)?;
    payload::check_id("id", &id)?;

    match state.repo.get_record(family, &caller.scope(), &id).await? {
        Some(record) => success(record),
        None => Err(AppError::NotFound(format!("Record {} not found", id))),
    }
}

/// POST /api/records/:family - Create a record and assign its report number.
pub async fn create_record(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(family): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<InspectionRecord> {
    let family = family_from_slug(&family)?;
    let new_record = payload::prepare_create(family, json_object(body)?)?;
    payload::check_service(&state.repo, new_record.service_id.as_deref()).await?;

    let record = state
        .repo
        .create_record(family, caller.id(), &new_record)
        .await?;

    if let Err(e) = state.search.index_record(&record).await {
        tracing::warn!("Failed to index record {}: {}", record.report_no, e);
    }

    success(record)
}

/// PUT /api/records/:family/:id - Merge changes into a record.
pub async fn update_record(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((family, id)): Path<(String, String)>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResult<InspectionRecord> {
    let family = family_from_slug(&family)?;
    payload::check_id("id", &id)?;
    let changes = json_object(body)?;
    let scope = caller.scope();

    let mut record = state
        .repo
        .get_record(family, &scope, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Record {} not found", id)))?;
    let previous_service = record.service_id.clone();

    payload::apply_update(&mut record, changes)?;
    if record.service_id != previous_service {
        payload::check_service(&state.repo, record.service_id.as_deref()).await?;
    }

    let record = state.repo.update_record(&scope, &record).await?;

    if let Err(e) = state.search.index_record(&record).await {
        tracing::warn!("Failed to re-index record {}: {}", record.report_no, e);
    }

    success(record)
}

/// DELETE /api/records/:family/:id - Delete a record.
pub async fn delete_record(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((family, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let family = family_from_slug(&family)?;
    payload::check_id("id", &id)?;

    state
        .repo
        .delete_record(family, &caller.scope(), &id)
        .await?;

    if let Err(e) = state.search.remove_record(&id).await {
        tracing::warn!("Failed to remove record {} from index: {}", id, e);
    }

    success(())
}
