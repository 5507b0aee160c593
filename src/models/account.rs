//! Accounts that submit and review records.

use serde::{Deserialize, Serialize};

/// Account role. Elevated roles bypass creator-based row scoping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    MasterAdmin,
    SuperAdmin,
    Inspector,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MasterAdmin => "master_admin",
            Role::SuperAdmin => "super_admin",
            Role::Inspector => "inspector",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "master_admin" => Some(Role::MasterAdmin),
            "super_admin" => Some(Role::SuperAdmin),
            "inspector" => Some(Role::Inspector),
            _ => None,
        }
    }

    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::MasterAdmin | Role::SuperAdmin)
    }
}

/// A registered account. The token digest never leaves the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: String,
}

/// Request body for creating an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Inspector
}

/// Returned once, when an account is created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedAccount {
    pub account: Account,
    /// Bearer token in `<accountId>.<secret>` form.
    pub token: String,
}
