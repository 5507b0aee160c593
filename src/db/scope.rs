//! Row visibility policy shared by every record query.

use sqlx::{QueryBuilder, Sqlite};

use crate::models::Account;

/// Which records a caller may read or mutate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerScope {
    /// Elevated roles: no creator filter.
    Everyone,
    /// Only records created by this account id.
    Creator(String),
}

impl OwnerScope {
    pub fn for_account(account: &Account) -> Self {
        if account.role.is_elevated() {
            OwnerScope::Everyone
        } else {
            OwnerScope::Creator(account.id.clone())
        }
    }

    /// Append `AND created_by = ?` when the scope is restricted.
    ///
    /// The builder must already contain a `WHERE` clause.
    pub fn push_filter(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        if let OwnerScope::Creator(account_id) = self {
            builder.push(" AND created_by = ");
            builder.push_bind(account_id.clone());
        }
    }

    /// Creator id to filter on, if any.
    pub fn creator(&self) -> Option<&str> {
        match self {
            OwnerScope::Everyone => None,
            OwnerScope::Creator(account_id) => Some(account_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn account(id: &str, role: Role) -> Account {
        Account {
            id: id.to_string(),
            username: id.to_string(),
            display_name: id.to_string(),
            role,
            created_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_elevated_roles_see_everyone() {
        assert_eq!(
            OwnerScope::for_account(&account("a", Role::MasterAdmin)),
            OwnerScope::Everyone
        );
        assert_eq!(
            OwnerScope::for_account(&account("b", Role::SuperAdmin)),
            OwnerScope::Everyone
        );
    }

    #[test]
    fn test_inspector_is_scoped_to_own_records() {
        let scope = OwnerScope::for_account(&account("c", Role::Inspector));
        assert_eq!(scope.creator(), Some("c"));
    }

    #[test]
    fn test_push_filter_only_when_restricted() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM t WHERE 1 = 1");
        OwnerScope::Everyone.push_filter(&mut builder);
        assert_eq!(builder.sql(), "SELECT id FROM t WHERE 1 = 1");

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id FROM t WHERE 1 = 1");
        OwnerScope::Creator("x".to_string()).push_filter(&mut builder);
        assert_eq!(builder.sql(), "SELECT id FROM t WHERE 1 = 1 AND created_by = ?");
    }
}
