use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers, Config};
use crate::handlers::{
    accounts, bank_accounts, events, health_check, invoices, organizers, sponsors, users,
    versions,
};
use crate::state::AppState;

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/cuentas/login/", post(accounts::login))
        .route("/cuentas/cambio-clave/", post(accounts::password_reset))
        .route(
            "/cuentas/cambio-clave/finalizado",
            get(accounts::password_reset_done),
        )
        .route(
            "/cuentas/cambio-clave-completo/",
            get(accounts::password_reset_complete),
        )
        .route(
            "/cuentas/:uidb64/:token/",
            get(accounts::password_reset_check).post(accounts::password_reset_confirm),
        )
        .route("/registrar-organizador/", post(accounts::signup))
        .route("/activate/:uidb64/:token/", get(accounts::activate))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/bank-accounts",
            get(bank_accounts::list_bank_accounts).post(bank_accounts::create_bank_account),
        )
        .route(
            "/bank-accounts/:id",
            get(bank_accounts::get_bank_account)
                .put(bank_accounts::update_bank_account)
                .delete(bank_accounts::delete_bank_account),
        )
        .route("/bank-accounts/:id/owners", get(bank_accounts::list_owners))
        .route(
            "/organizers",
            get(organizers::list_organizers).post(organizers::create_organizer),
        )
        .route("/organizers/me", get(organizers::my_organizer))
        .route(
            "/organizers/:id",
            get(organizers::get_organizer)
                .put(organizers::update_organizer)
                .delete(organizers::delete_organizer),
        )
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/:id/organizers",
            get(events::list_event_organizers).post(events::add_event_organizer),
        )
        .route(
            "/event-organizers/:id",
            delete(events::remove_event_organizer),
        )
        .route(
            "/events/:id/categories",
            get(events::list_categories).post(events::create_category),
        )
        .route(
            "/sponsor-categories/:id",
            get(events::get_category)
                .put(events::update_category)
                .delete(events::delete_category),
        )
        .route(
            "/sponsors",
            get(sponsors::list_sponsors).post(sponsors::create_sponsor),
        )
        .route(
            "/sponsors/:id",
            get(sponsors::get_sponsor)
                .put(sponsors::update_sponsor)
                .delete(sponsors::delete_sponsor),
        )
        .route("/sponsors/:id/enabled", put(sponsors::set_sponsor_enabled))
        .route(
            "/sponsorings",
            get(sponsors::list_sponsorings).post(sponsors::create_sponsoring),
        )
        .route(
            "/sponsorings/:id",
            get(sponsors::get_sponsoring)
                .put(sponsors::update_sponsoring)
                .delete(sponsors::delete_sponsoring),
        )
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route(
            "/invoices/:id/affects",
            get(invoices::list_affects).post(invoices::create_affect),
        )
        .route(
            "/invoice-affects/:id",
            delete(invoices::delete_affect),
        )
        .route("/versions/:entity/:id", get(versions::list_versions))
        .route("/users/:id/permissions", put(users::set_permissions))
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .merge(account_routes())
        .nest("/api", api_routes())
        .with_state(state);

    with_security_headers(router, config.is_production)
        .layer(create_cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http())
}
