use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::{BankAccountData, NewBankAccountData, NewOrganizer};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};

/// Loads the account if `user` may touch it: superusers and owners only.
async fn accessible_account(state: &AppState, user: &CurrentUser, id: Uuid) -> AppResult<BankAccountData> {
    let account = state
        .store
        .get_bank_account(id)
        .await?
        .ok_or_else(|| AppError::not_found("Bank account", id))?;

    if user.0.is_superuser {
        return Ok(account);
    }
    if let Some(organizer) = state.store.find_organizer_by_user(user.id()).await? {
        if state.store.is_bank_account_owner(&account, &organizer).await? {
            return Ok(account);
        }
    }
    Err(AppError::Forbidden(
        "Only the account owners can access this bank account".to_string(),
    ))
}

pub async fn list_bank_accounts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    user.require_superuser()?;
    let accounts = state.store.list_bank_accounts().await?;
    Ok(success(accounts, "Bank accounts retrieved"))
}

/// An organizer without bank data becomes the owner of the account it creates.
pub async fn create_bank_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewBankAccountData>,
) -> AppResult<Response> {
    let account = state.store.create_bank_account(new, user.actor()).await?;

    if let Some(organizer) = state.store.find_organizer_by_user(user.id()).await? {
        if organizer.account_data_id.is_none() {
            state
                .store
                .update_organizer(
                    organizer.id,
                    NewOrganizer {
                        first_name: organizer.first_name,
                        last_name: organizer.last_name,
                        user_id: organizer.user_id,
                        account_data_id: Some(account.id),
                    },
                    user.actor(),
                )
                .await?;
        }
    }

    Ok(created(account, "Bank account created"))
}

pub async fn get_bank_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let account = accessible_account(&state, &user, id).await?;
    Ok(success(account, "Bank account retrieved"))
}

pub async fn update_bank_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(new): Json<NewBankAccountData>,
) -> AppResult<Response> {
    accessible_account(&state, &user, id).await?;
    let account = state.store.update_bank_account(id, new, user.actor()).await?;
    Ok(success(account, "Bank account updated"))
}

pub async fn delete_bank_account(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    // Linked organizers go with the account.
    user.require_superuser()?;
    state.store.delete_bank_account(id).await?;
    Ok(empty_success("Bank account deleted"))
}

pub async fn list_owners(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    accessible_account(&state, &user, id).await?;
    let owners = state.store.bank_account_owners(id).await?;
    Ok(success(owners, "Bank account owners retrieved"))
}
