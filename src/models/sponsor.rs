use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::audit::Audit;
use crate::models::choices::VatCondition;
use crate::models::event::Event;
use crate::validation::{FieldErrors, CUIT_MAX_LEN, DEFAULT_MAX_LEN, LONG_MAX_LEN};

pub const AMOUNT_MAX_DIGITS: u32 = 18;
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Sponsorship tier of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SponsorCategory {
    pub id: Uuid,
    pub name: String,
    pub amount: Decimal,
    pub event_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl SponsorCategory {
    pub fn create(new: NewSponsorCategory, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            amount: new.amount,
            event_id: new.event_id,
            audit: Audit::new(actor),
        }
    }

    pub fn apply(&mut self, new: NewSponsorCategory) {
        self.name = new.name;
        self.amount = new.amount;
        self.event_id = new.event_id;
        self.audit.touch();
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSponsorCategory {
    pub name: String,
    pub amount: Decimal,
    pub event_id: Uuid,
}

impl NewSponsorCategory {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_required("name", &self.name, DEFAULT_MAX_LEN);
        errors.check_digits("amount", &self.amount, AMOUNT_MAX_DIGITS, AMOUNT_DECIMAL_PLACES);
        errors.finish()
    }
}

/// A sponsoring organization. `active = false` marks it as deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sponsor {
    pub id: Uuid,
    pub enabled: bool,
    pub active: bool,
    pub organization_name: String,
    pub document_number: String,
    pub contact_info: String,
    pub address: String,
    pub vat_condition: VatCondition,
    pub other_vat_condition_text: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl Sponsor {
    pub fn create(new: NewSponsor, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            enabled: false,
            active: true,
            organization_name: new.organization_name,
            document_number: new.document_number,
            contact_info: new.contact_info,
            address: new.address,
            vat_condition: new.vat_condition,
            other_vat_condition_text: new.other_vat_condition_text,
            audit: Audit::new(actor),
        }
    }

    pub fn apply(&mut self, new: NewSponsor) {
        self.organization_name = new.organization_name;
        self.document_number = new.document_number;
        self.contact_info = new.contact_info;
        self.address = new.address;
        self.vat_condition = new.vat_condition;
        self.other_vat_condition_text = new.other_vat_condition_text;
        self.audit.touch();
    }

    pub fn display(&self) -> String {
        format!("{} - {}", self.organization_name, self.document_number)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSponsor {
    pub organization_name: String,
    pub document_number: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub address: String,
    pub vat_condition: VatCondition,
    #[serde(default)]
    pub other_vat_condition_text: String,
}

impl NewSponsor {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_required("organization_name", &self.organization_name, DEFAULT_MAX_LEN);
        errors.check_max_len("document_number", &self.document_number, CUIT_MAX_LEN);
        errors.check_cuit("document_number", &self.document_number);
        errors.check_max_len("address", &self.address, LONG_MAX_LEN);
        errors.check_max_len(
            "other_vat_condition_text",
            &self.other_vat_condition_text,
            DEFAULT_MAX_LEN,
        );
        errors.finish()
    }
}

/// Which sponsors a query sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SponsorScope {
    /// Only `active` sponsors; the default accessor.
    #[default]
    Active,
    /// Every sponsor, soft-deleted ones included.
    All,
}

impl SponsorScope {
    pub fn includes(&self, sponsor: &Sponsor) -> bool {
        match self {
            SponsorScope::Active => sponsor.active,
            SponsorScope::All => true,
        }
    }
}

/// Links a sponsor to a category; invoices hang from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Sponsoring {
    pub id: Uuid,
    pub sponsor_category_id: Uuid,
    pub sponsor_id: Uuid,
    pub comments: String,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl Sponsoring {
    pub fn create(new: NewSponsoring, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sponsor_category_id: new.sponsor_category_id,
            sponsor_id: new.sponsor_id,
            comments: new.comments,
            audit: Audit::new(actor),
        }
    }

    pub fn describe(sponsor: &Sponsor, category: &SponsorCategory, event: &Event) -> String {
        format!(
            "{} - {} ({})",
            sponsor.organization_name, event.name, category.name
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSponsoring {
    pub sponsor_category_id: Uuid,
    pub sponsor_id: Uuid,
    #[serde(default)]
    pub comments: String,
}
