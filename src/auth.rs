// Authorization helpers
// Sessions are issued elsewhere; callers pass a resolved user id

use crate::database::Database;
use crate::database::sqlite::models::{Role, User};
use crate::database::sqlite::queries::UserQueries;
use crate::{AulaError, Result};

/// Look up the acting user, failing when the id is unknown
#[inline]
pub async fn resolve_user(database: &Database, user_id: i64) -> Result<User> {
    UserQueries::get_by_id(database.pool(), user_id)
        .await?
        .ok_or_else(|| AulaError::NotFound(format!("user {user_id} not found")))
}

/// Admin-only operations call this before doing anything else
#[inline]
pub fn require_admin(user: &User) -> Result<()> {
    if user.role == Role::Admin {
        Ok(())
    } else {
        Err(AulaError::Authorization(format!(
            "user {} is not an administrator",
            user.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: 5,
            name: None,
            email: None,
            role,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn admin_passes_check() {
        assert!(require_admin(&user(Role::Admin)).is_ok());
    }

    #[test]
    fn non_admin_is_rejected() {
        let result = require_admin(&user(Role::User));
        assert!(matches!(result, Err(AulaError::Authorization(_))));
    }
}
