use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::{NewOrganizer, Organizer, OrganizerProfile, Permission};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};

async fn profile(state: &AppState, organizer: Organizer) -> AppResult<OrganizerProfile> {
    let user = state
        .store
        .get_user(organizer.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", organizer.user_id))?;
    Ok(OrganizerProfile::new(organizer, &user))
}

async fn load(state: &AppState, id: Uuid) -> AppResult<Organizer> {
    state
        .store
        .get_organizer(id)
        .await?
        .ok_or_else(|| AppError::not_found("Organizer", id))
}

pub async fn list_organizers(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    user.require(Permission::ViewOrganizers)?;
    let mut profiles = Vec::new();
    for organizer in state.store.list_organizers().await? {
        profiles.push(profile(&state, organizer).await?);
    }
    Ok(success(profiles, "Organizers retrieved"))
}

pub async fn create_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewOrganizer>,
) -> AppResult<Response> {
    user.require_superuser()?;
    let organizer = state.store.create_organizer(new, user.actor()).await?;
    Ok(created(profile(&state, organizer).await?, "Organizer created"))
}

/// Organizers may always read their own profile.
pub async fn get_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let organizer = load(&state, id).await?;
    if organizer.user_id != user.id() {
        user.require(Permission::ViewOrganizers)?;
    }
    Ok(success(profile(&state, organizer).await?, "Organizer retrieved"))
}

pub async fn my_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    let organizer = state
        .store
        .find_organizer_by_user(user.id())
        .await?
        .ok_or_else(|| AppError::NotFound("You have no organizer profile".to_string()))?;
    Ok(success(
        OrganizerProfile::new(organizer, &user.0),
        "Organizer retrieved",
    ))
}

/// Superusers edit anyone; organizers edit only their own names.
pub async fn update_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(new): Json<NewOrganizer>,
) -> AppResult<Response> {
    let organizer = load(&state, id).await?;
    if !user.0.is_superuser {
        if organizer.user_id != user.id() {
            return Err(AppError::Forbidden(
                "You can only edit your own organizer profile".to_string(),
            ));
        }
        if new.user_id != organizer.user_id || new.account_data_id != organizer.account_data_id {
            return Err(AppError::Forbidden(
                "Only superusers can reassign an organizer's login or bank account".to_string(),
            ));
        }
    }

    let organizer = state.store.update_organizer(id, new, user.actor()).await?;
    Ok(success(profile(&state, organizer).await?, "Organizer updated"))
}

pub async fn delete_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_superuser()?;
    state.store.delete_organizer(id).await?;
    Ok(empty_success("Organizer deleted"))
}
