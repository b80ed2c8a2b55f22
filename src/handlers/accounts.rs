//! Login, password reset, organizer signup and account activation.
//!
//! Outgoing mail is not wired up; reset and activation links are written to
//! the log instead.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::tokens::{decode_uid, TokenPurpose};
use crate::models::{NewUser, OrganizerProfile, User};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};
use crate::validation::{FieldErrors, DEFAULT_MAX_LEN};

const RESET_PATH: &str = "/cuentas";
const ACTIVATION_PATH: &str = "/activate";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginPayload {
    token: String,
    user: User,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Response> {
    let mut user = state
        .store
        .find_user_by_username(&req.username)
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| {
            AppError::AuthError("Please enter a correct username and password.".to_string())
        })?;

    if !user.is_active {
        return Err(AppError::AuthError("This account is inactive.".to_string()));
    }

    user.last_login = Some(Utc::now());
    let user = state.store.save_user(&user).await?;
    let token = state.sessions.issue(&user)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(success(LoginPayload { token, user }, "Login successful"))
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Always answers the same way so the endpoint doesn't reveal which emails exist.
pub async fn password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> AppResult<Response> {
    let mut errors = FieldErrors::new();
    errors.check_email("email", &req.email);
    errors.finish()?;

    let users = state.store.find_users_by_email(&req.email).await?;
    for user in users.iter().filter(|user| user.is_active) {
        let link = state.token_link(RESET_PATH, TokenPurpose::PasswordReset, user);
        tracing::info!(user_id = %user.id, %link, "Password reset link issued");
    }

    Ok(empty_success(
        "If an account exists with the email you entered, you will receive password reset instructions",
    ))
}

pub async fn password_reset_done() -> Response {
    empty_success("We've emailed you instructions for setting your password")
}

#[derive(Serialize)]
struct LinkStatus {
    valid: bool,
}

pub async fn password_reset_check(
    State(state): State<AppState>,
    Path((uidb64, token)): Path<(String, String)>,
) -> AppResult<Response> {
    let valid = reset_user(&state, &uidb64, &token).await?.is_some();
    Ok(success(LinkStatus { valid }, "Password reset link checked"))
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password1: String,
    pub new_password2: String,
}

pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Path((uidb64, token)): Path<(String, String)>,
    Json(req): Json<SetPasswordRequest>,
) -> AppResult<Response> {
    let mut user = reset_user(&state, &uidb64, &token).await?.ok_or_else(|| {
        AppError::ValidationError(
            "The password reset link was invalid, possibly because it has already been used."
                .to_string(),
        )
    })?;

    let mut errors = FieldErrors::new();
    errors.check_new_password("new_password2", &req.new_password1, &req.new_password2);
    errors.finish()?;

    user.password_hash = hash_password(&req.new_password1)?;
    state.store.save_user(&user).await?;

    tracing::info!(user_id = %user.id, "Password reset");
    Ok(empty_success("Password has been set"))
}

pub async fn password_reset_complete() -> Response {
    empty_success("Your password has been set. You may go ahead and log in now.")
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

impl SignupRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_username("username", &self.username);
        errors.check_email("email", &self.email);
        errors.check_required("first_name", &self.first_name, DEFAULT_MAX_LEN);
        errors.check_required("last_name", &self.last_name, DEFAULT_MAX_LEN);
        errors.check_new_password("password2", &self.password1, &self.password2);
        errors.finish()
    }
}

/// Creates an inactive user with its organizer profile and issues the
/// activation link.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<Response> {
    req.validate()?;

    let (user, organizer) = state
        .store
        .register_organizer(NewUser {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password_hash: hash_password(&req.password1)?,
            is_active: false,
            is_superuser: false,
        })
        .await?;

    let link = state.token_link(ACTIVATION_PATH, TokenPurpose::Activation, &user);
    tracing::info!(user_id = %user.id, %link, "Activation link issued");

    Ok(created(
        OrganizerProfile::new(organizer, &user),
        "Please confirm your email address to complete the registration",
    ))
}

pub async fn activate(
    State(state): State<AppState>,
    Path((uidb64, token)): Path<(String, String)>,
) -> AppResult<Response> {
    let mut user = user_for_link(&state, TokenPurpose::Activation, &uidb64, &token)
        .await?
        .ok_or_else(|| AppError::ValidationError("Activation link is invalid!".to_string()))?;

    user.is_active = true;
    let user = state.store.save_user(&user).await?;

    tracing::info!(user_id = %user.id, "Account activated");
    Ok(success(
        user,
        "Thank you for your email confirmation. Now you can login your account.",
    ))
}

/// The user a one-time link was issued for, if the link still holds.
async fn user_for_link(
    state: &AppState,
    purpose: TokenPurpose,
    uidb64: &str,
    token: &str,
) -> AppResult<Option<User>> {
    let Some(user_id) = decode_uid(uidb64) else {
        return Ok(None);
    };
    let user = state.store.get_user(user_id).await?;
    Ok(user.filter(|user| state.tokens(purpose).check_token(user, token)))
}

/// Reset links only hold for active accounts.
async fn reset_user(state: &AppState, uidb64: &str, token: &str) -> AppResult<Option<User>> {
    let user = user_for_link(state, TokenPurpose::PasswordReset, uidb64, token).await?;
    Ok(user.filter(|user| user.is_active))
}
