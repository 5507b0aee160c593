//! Public report verification.

use axum::extract::{Path, State};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::VerificationSummary;
use crate::AppState;

/// GET /verify/:token - Confirm that an approved report exists.
pub async fn verify_report(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<VerificationSummary> {
    match state.repo.find_approved_by_token(&token).await? {
        Some(record) => success(VerificationSummary::from(&record)),
        None => Err(AppError::NotFound(
            "No approved report matches this verification token".to_string(),
        )),
    }
}
