use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::choices::choice_enum;

choice_enum! {
    /// Entity tables tracked by the version history.
    EntityKind {
        BankAccount => ("bank_account", "datos cuenta bancaria"),
        Organizer => ("organizer", "organizador"),
        Event => ("event", "evento"),
        EventOrganizer => ("event_organizer", "organizador del evento"),
        SponsorCategory => ("sponsor_category", "categoria de patrocinio"),
        Sponsoring => ("sponsoring", "patrocinio"),
        Sponsor => ("sponsor", "patrocinador"),
        Invoice => ("invoice", "factura"),
        InvoiceAffect => ("invoice_affect", "afectacion de factura"),
    }
}

/// Snapshot of an entity taken on save.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Version {
    pub id: Uuid,
    pub entity: EntityKind,
    pub object_id: Uuid,
    pub revision: i32,
    pub data: Value,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
