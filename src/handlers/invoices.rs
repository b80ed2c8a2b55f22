use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::models::{AffectCategory, NewInvoice, NewInvoiceAffect};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use crate::utils::response::{created, empty_success, success};

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceQuery {
    pub sponsoring: Option<Uuid>,
}

pub async fn list_invoices(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<InvoiceQuery>,
) -> AppResult<Response> {
    let invoices = state.store.list_invoices(query.sponsoring).await?;
    Ok(success(invoices, "Invoices retrieved"))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(new): Json<NewInvoice>,
) -> AppResult<Response> {
    let invoice = state.store.create_invoice(new, user.actor()).await?;
    Ok(created(invoice, "Invoice created"))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let invoice = state
        .store
        .get_invoice(id)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice", id))?;
    Ok(success(invoice, "Invoice retrieved"))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(new): Json<NewInvoice>,
) -> AppResult<Response> {
    let invoice = state.store.update_invoice(id, new, user.actor()).await?;
    Ok(success(invoice, "Invoice updated"))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_superuser()?;
    state.store.delete_invoice(id).await?;
    Ok(empty_success("Invoice deleted"))
}

pub async fn list_affects(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let affects = state.store.list_invoice_affects(id).await?;
    Ok(success(affects, "Invoice affects retrieved"))
}

#[derive(Debug, Deserialize)]
pub struct AffectRequest {
    pub amount: Decimal,
    #[serde(default)]
    pub observations: String,
    pub document: String,
    pub category: AffectCategory,
}

pub async fn create_affect(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AffectRequest>,
) -> AppResult<Response> {
    let affect = state
        .store
        .create_invoice_affect(
            NewInvoiceAffect {
                amount: req.amount,
                observations: req.observations,
                invoice_id: id,
                document: req.document,
                category: req.category,
            },
            user.actor(),
        )
        .await?;
    Ok(created(affect, "Invoice affect created"))
}

pub async fn delete_affect(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    user.require_superuser()?;
    state.store.delete_invoice_affect(id).await?;
    Ok(empty_success("Invoice affect deleted"))
}
