use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::version::EntityKind;

/// Creator and timestamps carried by every entity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Audit {
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Audit {
    pub fn new(actor: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            created_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// An entity whose every save is snapshotted into the version history.
pub trait Versioned: Serialize {
    const KIND: EntityKind;

    fn id(&self) -> Uuid;

    fn audit(&self) -> &Audit;
}

macro_rules! versioned {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl Versioned for $ty {
                const KIND: EntityKind = EntityKind::$kind;

                fn id(&self) -> Uuid {
                    self.id
                }

                fn audit(&self) -> &Audit {
                    &self.audit
                }
            }
        )+
    };
}

versioned! {
    crate::models::BankAccountData => BankAccount,
    crate::models::Organizer => Organizer,
    crate::models::Event => Event,
    crate::models::EventOrganizer => EventOrganizer,
    crate::models::SponsorCategory => SponsorCategory,
    crate::models::Sponsoring => Sponsoring,
    crate::models::Sponsor => Sponsor,
    crate::models::Invoice => Invoice,
    crate::models::InvoiceAffect => InvoiceAffect,
}
