//! Account API endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::auth::{self, Caller};
use crate::errors::AppError;
use crate::models::{Account, CreateAccountRequest, IssuedAccount};
use crate::AppState;

/// GET /api/me - The authenticated account.
pub async fn get_me(Extension(caller): Extension<Caller>) -> ApiResult<Account> {
    success(caller.account().clone())
}

/// GET /api/accounts - List all accounts.
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<Account>> {
    caller.require_elevated()?;
    success(state.repo.list_accounts().await?)
}

/// POST /api/accounts - Create an account and return its token once.
pub async fn create_account(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<IssuedAccount> {
    caller.require_elevated()?;
    let Json(request) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let username = request.username.trim();
    if username.is_empty() {
        return Err(AppError::validation("username", "username is required"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AppError::validation(
            "username",
            "username must not contain whitespace",
        ));
    }

    let issued = auth::issue_token();
    let account = state
        .repo
        .create_account(&request, &issued.account_id, &issued.secret_hash)
        .await?;

    tracing::info!(
        "{} created account {} ({})",
        caller.account().username,
        account.username,
        account.role.as_str()
    );

    success(IssuedAccount {
        account,
        token: issued.token,
    })
}
