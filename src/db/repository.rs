//! Database repository for accounts and the service catalogue.
//!
//! Record operations live in `records.rs` on the same type.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Account, CreateAccountRequest, CreateServiceRequest, Role, Service, UpdateServiceRequest,
};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== ACCOUNT OPERATIONS ====================

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let rows = sqlx::query(
            "SELECT id, username, display_name, role, created_at FROM accounts ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    /// Get an account by ID together with its stored token digest.
    pub async fn get_account_credentials(
        &self,
        id: &str,
    ) -> Result<Option<(Account, String)>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, display_name, role, created_at, token_hash FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some((account_from_row(&row)?, row.get("token_hash")))),
            None => Ok(None),
        }
    }

    /// Get an account by username.
    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, AppError> {
        let row = sqlx::query(
            "SELECT id, username, display_name, role, created_at FROM accounts WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    /// Create a new account holding the given token digest.
    pub async fn create_account(
        &self,
        request: &CreateAccountRequest,
        id: &str,
        token_hash: &str,
    ) -> Result<Account, AppError> {
        let now = Utc::now().to_rfc3339();
        let username = request.username.trim();
        let display_name = request
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(username);

        sqlx::query(
            "INSERT INTO accounts (id, username, display_name, role, token_hash, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(username)
        .bind(display_name)
        .bind(request.role.as_str())
        .bind(token_hash)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Username {} is already taken", username))
            }
            other => AppError::from(other),
        })?;

        Ok(Account {
            id: id.to_string(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            role: request.role,
            created_at: now,
        })
    }

    /// Create or refresh a built-in account, keeping its id stable.
    pub async fn ensure_account(
        &self,
        username: &str,
        role: Role,
        token_hash: &str,
    ) -> Result<Account, AppError> {
        let now = Utc::now().to_rfc3339();
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            r#"INSERT INTO accounts (id, username, display_name, role, token_hash, created_at)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT(username) DO UPDATE SET role = excluded.role, token_hash = excluded.token_hash"#,
        )
        .bind(&id)
        .bind(username)
        .bind(username)
        .bind(role.as_str())
        .bind(token_hash)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_account_by_username(username)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Account {} vanished after upsert", username)))
    }

    // ==================== SERVICE OPERATIONS ====================

    /// List services, active ones only unless asked otherwise.
    pub async fn list_services(&self, include_inactive: bool) -> Result<Vec<Service>, AppError> {
        let sql = if include_inactive {
            "SELECT id, name, description, is_active, created_at, updated_at FROM services ORDER BY name"
        } else {
            "SELECT id, name, description, is_active, created_at, updated_at FROM services WHERE is_active = 1 ORDER BY name"
        };
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(service_from_row).collect())
    }

    /// Get a service by ID, active or not.
    pub async fn get_service(&self, id: &str) -> Result<Option<Service>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, description, is_active, created_at, updated_at FROM services WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(service_from_row))
    }

    /// Create a new service.
    pub async fn create_service(&self, request: &CreateServiceRequest) -> Result<Service, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO services (id, name, description, is_active, created_at, updated_at) VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Service {
            id,
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a service.
    pub async fn update_service(
        &self,
        id: &str,
        request: &UpdateServiceRequest,
    ) -> Result<Service, AppError> {
        let existing = self
            .get_service(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.name)
            .to_string();
        let description = request.description.clone().or(existing.description);
        let is_active = request.is_active.unwrap_or(existing.is_active);

        sqlx::query(
            "UPDATE services SET name = ?, description = ?, is_active = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&name)
        .bind(&description)
        .bind(is_active as i32)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Service {
            id: id.to_string(),
            name,
            description,
            is_active,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Deactivate a service. Services are never removed.
    pub async fn deactivate_service(&self, id: &str) -> Result<Service, AppError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("UPDATE services SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Service {} not found", id)));
        }

        self.get_service(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))
    }
}

// Helper functions for row conversion

fn account_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Account, AppError> {
    let role_str: String = row.get("role");
    let role = Role::parse(&role_str)
        .ok_or_else(|| AppError::Internal(format!("Unknown role {} in accounts table", role_str)))?;
    Ok(Account {
        id: row.get("id"),
        username: row.get("username"),
        display_name: row.get("display_name"),
        role,
        created_at: row.get("created_at"),
    })
}

fn service_from_row(row: &sqlx::sqlite::SqliteRow) -> Service {
    let is_active: i32 = row.get("is_active");
    Service {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        is_active: is_active != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
