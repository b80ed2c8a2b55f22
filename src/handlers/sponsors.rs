use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::{NewSponsor, NewSponsoring, Permission, SponsorScope, Sponsoring};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    /// Include soft-deleted sponsors.
    #[serde(default)]
    pub all: bool,
}

impl ScopeQuery {
    fn scope(&self) -> SponsorScope {
        if self.all {
            SponsorScope::All
        } else {
            SponsorScope::Active
        }
    }
}

pub async fn list_sponsors(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Response> {
    user.require(Permission::ViewSponsors)?;
    let sponsors = state.store.list_sponsors(query.scope()).await?;
    Ok(success(sponsors, "Sponsors retrieved"))
}

pub async fn create_sponsor(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewSponsor>,
) -> AppResult<Response> {
    let sponsor = state.store.create_sponsor(new, user.actor()).await?;
    Ok(created(sponsor, "Sponsor created"))
}

pub async fn get_sponsor(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Response> {
    user.require(Permission::ViewSponsors)?;
    let sponsor = state
        .store
        .get_sponsor(id, query.scope())
        .await?
        .ok_or_else(|| AppError::not_found("Sponsor", id))?;
    Ok(success(sponsor, "Sponsor retrieved"))
}

pub async fn update_sponsor(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(new): Json<NewSponsor>,
) -> AppResult<Response> {
    let sponsor = state.store.update_sponsor(id, new, user.actor()).await?;
    Ok(success(sponsor, "Sponsor updated"))
}

pub async fn delete_sponsor(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let sponsor = state.store.deactivate_sponsor(id, user.actor()).await?;
    tracing::info!(sponsor_id = %sponsor.id, sponsor = %sponsor.display(), "Sponsor deactivated");
    Ok(empty_success("Sponsor deleted"))
}

#[derive(Debug, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

pub async fn set_sponsor_enabled(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<EnabledRequest>,
) -> AppResult<Response> {
    user.require(Permission::SetSponsorsEnabled)?;
    let sponsor = state
        .store
        .set_sponsor_enabled(id, req.enabled, user.actor())
        .await?;
    Ok(success(sponsor, "Sponsor updated"))
}

#[derive(Debug, Default, Deserialize)]
pub struct SponsoringQuery {
    pub category: Option<Uuid>,
}

/// A sponsoring with its human readable label.
#[derive(Serialize)]
struct SponsoringDetail {
    #[serde(flatten)]
    sponsoring: Sponsoring,
    description: String,
}

pub async fn create_sponsoring(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewSponsoring>,
) -> AppResult<Response> {
    let sponsoring = state.store.create_sponsoring(new, user.actor()).await?;
    Ok(created(sponsoring, "Sponsoring created"))
}

pub async fn list_sponsorings(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SponsoringQuery>,
) -> AppResult<Response> {
    let sponsorings = state.store.list_sponsorings(query.category).await?;
    Ok(success(sponsorings, "Sponsorings retrieved"))
}

pub async fn get_sponsoring(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let sponsoring = state
        .store
        .get_sponsoring(id)
        .await?
        .ok_or_else(|| AppError::not_found("Sponsoring", id))?;

    // The sponsor may have been soft-deleted since.
    let sponsor = state
        .store
        .get_sponsor(sponsoring.sponsor_id, SponsorScope::All)
        .await?
        .ok_or_else(|| AppError::not_found("Sponsor", sponsoring.sponsor_id))?;
    let category = state
        .store
        .get_sponsor_category(sponsoring.sponsor_category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Sponsor category", sponsoring.sponsor_category_id))?;
    let event = state
        .store
        .get_event(category.event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event", category.event_id))?;

    let description = Sponsoring::describe(&sponsor, &category, &event);
    Ok(success(
        SponsoringDetail {
            sponsoring,
            description,
        },
        "Sponsoring retrieved",
    ))
}

#[derive(Debug, Deserialize)]
pub struct CommentsRequest {
    #[serde(default)]
    pub comments: String,
}

pub async fn update_sponsoring(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentsRequest>,
) -> AppResult<Response> {
    let sponsoring = state
        .store
        .update_sponsoring_comments(id, req.comments, user.actor())
        .await?;
    Ok(success(sponsoring, "Sponsoring updated"))
}

/// Invoices of the sponsoring stay, unlinked.
pub async fn delete_sponsoring(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_superuser()?;
    state.store.delete_sponsoring(id).await?;
    Ok(empty_success("Sponsoring deleted"))
}
