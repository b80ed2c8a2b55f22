use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::audit::Audit;
use crate::models::choices::AffectCategory;
use crate::models::sponsor::{AMOUNT_DECIMAL_PLACES, AMOUNT_MAX_DIGITS};
use crate::validation::{FieldErrors, DEFAULT_MAX_LEN, LONG_MAX_LEN};

pub const INVOICE_UPLOAD_PREFIX: &str = "invoices/documents/";
pub const INVOICE_AFFECT_UPLOAD_PREFIX: &str = "invoice_affects/documents/";

/// Storage path for an uploaded document. A value that already carries
/// `prefix` is taken as-is so clients may send back a stored path.
pub fn upload_path(prefix: &str, file_name: &str) -> String {
    let name = file_name.strip_prefix(prefix).unwrap_or(file_name);
    format!("{}{}", prefix, name)
}

fn document_name<'a>(prefix: &str, document: &'a str) -> &'a str {
    document.strip_prefix(prefix).unwrap_or(document)
}

/// Checks the file name so that the stored path fits the `document` column.
fn check_document(errors: &mut FieldErrors, prefix: &str, document: &str) {
    errors.check_file_name(
        "document",
        document_name(prefix, document),
        DEFAULT_MAX_LEN - prefix.len(),
    );
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub amount: Decimal,
    pub partial_payment: bool,
    pub complete_payment: bool,
    pub close: bool,
    pub observations: String,
    pub document: String,
    pub invoice_ok: bool,
    pub sponsoring_id: Option<Uuid>,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl Invoice {
    pub fn create(new: NewInvoice, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount: new.amount,
            partial_payment: new.partial_payment,
            complete_payment: new.complete_payment,
            close: new.close,
            observations: new.observations,
            document: upload_path(INVOICE_UPLOAD_PREFIX, &new.document),
            invoice_ok: new.invoice_ok,
            sponsoring_id: new.sponsoring_id,
            audit: Audit::new(actor),
        }
    }

    pub fn apply(&mut self, new: NewInvoice) {
        self.amount = new.amount;
        self.partial_payment = new.partial_payment;
        self.complete_payment = new.complete_payment;
        self.close = new.close;
        self.observations = new.observations;
        self.document = upload_path(INVOICE_UPLOAD_PREFIX, &new.document);
        self.invoice_ok = new.invoice_ok;
        self.sponsoring_id = new.sponsoring_id;
        self.audit.touch();
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub amount: Decimal,
    #[serde(default)]
    pub partial_payment: bool,
    #[serde(default)]
    pub complete_payment: bool,
    #[serde(default)]
    pub close: bool,
    #[serde(default)]
    pub observations: String,
    /// File name of the uploaded document.
    pub document: String,
    #[serde(default)]
    pub invoice_ok: bool,
    #[serde(default)]
    pub sponsoring_id: Option<Uuid>,
}

impl NewInvoice {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_digits("amount", &self.amount, AMOUNT_MAX_DIGITS, AMOUNT_DECIMAL_PLACES);
        errors.check_max_len("observations", &self.observations, LONG_MAX_LEN);
        check_document(&mut errors, INVOICE_UPLOAD_PREFIX, &self.document);
        if self.partial_payment && self.complete_payment {
            errors.add(
                "complete_payment",
                "An invoice cannot be partially and completely paid at the same time.",
            );
        }
        errors.finish()
    }
}

/// A payment, withholding or other movement applied to an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InvoiceAffect {
    pub id: Uuid,
    pub amount: Decimal,
    pub observations: String,
    pub invoice_id: Uuid,
    pub document: String,
    pub category: AffectCategory,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl InvoiceAffect {
    pub fn create(new: NewInvoiceAffect, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount: new.amount,
            observations: new.observations,
            invoice_id: new.invoice_id,
            document: upload_path(INVOICE_AFFECT_UPLOAD_PREFIX, &new.document),
            category: new.category,
            audit: Audit::new(actor),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoiceAffect {
    pub amount: Decimal,
    #[serde(default)]
    pub observations: String,
    pub invoice_id: Uuid,
    pub document: String,
    pub category: AffectCategory,
}

impl NewInvoiceAffect {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_digits("amount", &self.amount, AMOUNT_MAX_DIGITS, AMOUNT_DECIMAL_PLACES);
        errors.check_max_len("observations", &self.observations, LONG_MAX_LEN);
        check_document(&mut errors, INVOICE_AFFECT_UPLOAD_PREFIX, &self.document);
        errors.finish()
    }
}
