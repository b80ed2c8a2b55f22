use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::PermissionGrant;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::success;

/// Replaces the permission set of a user.
pub async fn set_permissions(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(grant): Json<PermissionGrant>,
) -> AppResult<Response> {
    user.require_superuser()?;
    let mut target = state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;

    let mut permissions: Vec<String> = grant
        .permissions
        .iter()
        .map(|p| p.as_str().to_string())
        .collect();
    permissions.sort();
    permissions.dedup();
    target.permissions = permissions;

    let target = state.store.save_user(&target).await?;
    tracing::info!(user_id = %target.id, granted_by = %user.id(), permissions = ?target.permissions, "Permissions updated");
    Ok(success(target, "Permissions updated"))
}
