use axum::extract::{Path, State};
use axum::response::Response;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::EntityKind;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::success;

/// Revision history of one object, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((entity, id)): Path<(String, Uuid)>,
) -> AppResult<Response> {
    user.require_superuser()?;
    let entity = entity
        .parse::<EntityKind>()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    let versions = state.store.list_versions(entity, id).await?;
    Ok(success(versions, "Versions retrieved"))
}
