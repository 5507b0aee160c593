//! Bearer-token authentication.
//!
//! Two kinds of token are accepted, from `Authorization: Bearer …` or the
//! `x-api-key` header:
//! - the configured bootstrap admin token, which authenticates as the built-in
//!   `admin` account;
//! - account tokens of the form `<accountId>.<secret>`, checked against the
//!   stored SHA-256 digest of the secret.
//!
//! All comparisons are constant-time to mitigate timing attacks.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::db::OwnerScope;
use crate::errors::AppError;
use crate::models::{Account, Role};
use crate::AppState;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Username of the account the bootstrap admin token maps to.
pub const BOOTSTRAP_USERNAME: &str = "admin";

/// The authenticated account, attached to every `/api` request.
#[derive(Debug, Clone)]
pub struct Caller(pub Account);

impl Caller {
    pub fn account(&self) -> &Account {
        &self.0
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Record visibility for this caller.
    pub fn scope(&self) -> OwnerScope {
        OwnerScope::for_account(&self.0)
    }

    pub fn require_elevated(&self) -> Result<(), AppError> {
        if self.0.role.is_elevated() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "This operation requires an administrator role".to_string(),
            ))
        }
    }
}

/// Authentication layer: resolves the token to a [`Caller`] or rejects with 401.
pub async fn require_caller(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(&request) else {
        return AppError::Unauthorized("Missing API token".to_string()).into_response();
    };

    match authenticate(&state, &token).await {
        Ok(Some(account)) => {
            tracing::debug!("Authenticated {} ({})", account.username, account.role.as_str());
            request.extensions_mut().insert(Caller(account));
            next.run(request).await
        }
        Ok(None) => AppError::Unauthorized("Invalid API token".to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}

fn extract_token(request: &Request) -> Option<String> {
    let headers = request.headers();
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

async fn authenticate(state: &AppState, token: &str) -> Result<Option<Account>, AppError> {
    if let Some(admin_token) = &state.config.admin_token {
        if constant_time_compare(token, admin_token) {
            return state.repo.get_account_by_username(BOOTSTRAP_USERNAME).await;
        }
    }

    let Some((account_id, secret)) = token.split_once('.') else {
        return Ok(None);
    };
    if uuid::Uuid::parse_str(account_id).is_err() {
        return Ok(None);
    }

    match state.repo.get_account_credentials(account_id).await? {
        Some((account, stored_hash)) if constant_time_compare(&hash_secret(secret), &stored_hash) => {
            Ok(Some(account))
        }
        _ => Ok(None),
    }
}

/// Create the built-in master admin for the configured bootstrap token.
pub async fn ensure_bootstrap_admin(state: &AppState) -> Result<Option<Account>, AppError> {
    let Some(admin_token) = &state.config.admin_token else {
        return Ok(None);
    };
    let account = state
        .repo
        .ensure_account(BOOTSTRAP_USERNAME, Role::MasterAdmin, &hash_secret(admin_token))
        .await?;
    Ok(Some(account))
}

/// Fresh account id and bearer token; only the digest of the secret is stored.
pub struct IssuedToken {
    pub account_id: String,
    pub token: String,
    pub secret_hash: String,
}

pub fn issue_token() -> IssuedToken {
    let account_id = uuid::Uuid::new_v4().to_string();
    let secret = format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );
    IssuedToken {
        token: format!("{}.{}", account_id, secret),
        secret_hash: hash_secret(&secret),
        account_id,
    }
}

/// Hex-encoded SHA-256 digest of a token secret.
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_hash_secret_is_hex_sha256() {
        let digest = hash_secret("secret");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, hash_secret("secret"));
        assert_ne!(digest, hash_secret("Secret"));
    }

    #[test]
    fn test_issued_token_embeds_account_id_and_matches_digest() {
        let issued = issue_token();
        let (account_id, secret) = issued.token.split_once('.').unwrap();
        assert_eq!(account_id, issued.account_id);
        assert_eq!(hash_secret(secret), issued.secret_hash);
        assert_ne!(issue_token().token, issued.token);
    }
}
