use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::{Event, NewEvent, NewEventOrganizer, NewSponsorCategory, Permission};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};

async fn load(state: &AppState, id: Uuid) -> AppResult<Event> {
    state
        .store
        .get_event(id)
        .await?
        .ok_or_else(|| AppError::not_found("Event", id))
}

pub async fn list_events(State(state): State<AppState>, _user: CurrentUser) -> AppResult<Response> {
    let events = state.store.list_events().await?;
    Ok(success(events, "Events retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewEvent>,
) -> AppResult<Response> {
    let event = state.store.create_event(new, user.actor()).await?;
    Ok(created(event, "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    Ok(success(load(&state, id).await?, "Event retrieved"))
}

pub async fn update_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(new): Json<NewEvent>,
) -> AppResult<Response> {
    let event = state.store.update_event(id, new, user.actor()).await?;
    Ok(success(event, "Event updated"))
}

/// Removes the event together with its organizers, categories and sponsorings.
pub async fn delete_event(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_superuser()?;
    state.store.delete_event(id).await?;
    Ok(empty_success("Event deleted"))
}

pub async fn list_event_organizers(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require(Permission::ViewEventOrganizers)?;
    load(&state, id).await?;
    let organizers = state.store.list_event_organizers(id).await?;
    Ok(success(organizers, "Event organizers retrieved"))
}

#[derive(Debug, Deserialize)]
pub struct AddOrganizerRequest {
    pub organizer_id: Uuid,
}

pub async fn add_event_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddOrganizerRequest>,
) -> AppResult<Response> {
    user.require_superuser()?;
    let link = state
        .store
        .add_event_organizer(
            NewEventOrganizer {
                event_id: id,
                organizer_id: req.organizer_id,
            },
            user.actor(),
        )
        .await?;
    Ok(created(link, "Organizer added to event"))
}

pub async fn remove_event_organizer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_superuser()?;
    state.store.remove_event_organizer(id).await?;
    Ok(empty_success("Organizer removed from event"))
}

pub async fn list_categories(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    load(&state, id).await?;
    let categories = state.store.list_sponsor_categories(id).await?;
    Ok(success(categories, "Sponsor categories retrieved"))
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub amount: Decimal,
}

pub async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CategoryRequest>,
) -> AppResult<Response> {
    let category = state
        .store
        .create_sponsor_category(
            NewSponsorCategory {
                name: req.name,
                amount: req.amount,
                event_id: id,
            },
            user.actor(),
        )
        .await?;
    Ok(created(category, "Sponsor category created"))
}

pub async fn get_category(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let category = state
        .store
        .get_sponsor_category(id)
        .await?
        .ok_or_else(|| AppError::not_found("Sponsor category", id))?;
    Ok(success(category, "Sponsor category retrieved"))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(new): Json<NewSponsorCategory>,
) -> AppResult<Response> {
    let category = state
        .store
        .update_sponsor_category(id, new, user.actor())
        .await?;
    Ok(success(category, "Sponsor category updated"))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_superuser()?;
    state.store.delete_sponsor_category(id).await?;
    Ok(empty_success("Sponsor category deleted"))
}
