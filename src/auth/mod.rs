//! Authentication: password hashing, bearer sessions and one-time tokens.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::config::AdminCredentials;
use crate::models::{NewUser, Permission, User};
use crate::state::AppState;
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};

pub mod password;
pub mod session;
pub mod tokens;

/// The active user behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    /// Actor recorded on writes.
    pub fn actor(&self) -> Option<Uuid> {
        Some(self.0.id)
    }

    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.0.has_perm(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Missing permission '{}'",
                permission.as_str()
            )))
        }
    }

    pub fn require_superuser(&self) -> AppResult<()> {
        if self.0.is_superuser {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only superusers can perform this action".to_string(),
            ))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::AuthError("Authentication credentials were not provided".to_string()))?;

        let user_id = state.sessions.verify(token.trim())?;
        let user = state
            .store
            .get_user(user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::AuthError("Invalid or expired session".to_string()))?;

        Ok(CurrentUser(user))
    }
}

/// Creates the configured superuser unless the username is already taken.
pub async fn ensure_superuser(store: &dyn Store, admin: &AdminCredentials) -> AppResult<User> {
    if let Some(existing) = store.find_user_by_username(&admin.username).await? {
        if !existing.is_superuser {
            tracing::warn!(username = %existing.username, "Bootstrap username belongs to a regular user");
        }
        return Ok(existing);
    }

    let user = store
        .create_user(NewUser {
            username: admin.username.clone(),
            email: admin.email.clone(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: password::hash_password(&admin.password)?,
            is_active: true,
            is_superuser: true,
        })
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "Created superuser");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_ensure_superuser_is_idempotent() {
        let store = MemoryStore::new();
        let admin = AdminCredentials {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "s3cret-pass".to_string(),
        };

        let first = ensure_superuser(&store, &admin).await.unwrap();
        assert!(first.is_superuser && first.is_active);
        assert!(password::verify_password("s3cret-pass", &first.password_hash));

        let second = ensure_superuser(&store, &admin).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
