use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod accounts;
pub mod bank_accounts;
pub mod events;
pub mod invoices;
pub mod organizers;
pub mod sponsors;
pub mod users;
pub mod versions;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "events-server",
    };

    success(payload, "Health check successful")
}
