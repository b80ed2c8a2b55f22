//! Integrity rule names, shared by the SQL schema and the in-memory store so
//! both report the same messages.

use crate::utils::error::AppError;

pub const USERS_USERNAME_KEY: &str = "users_username_key";
pub const ORGANIZERS_USER_KEY: &str = "organizers_user_id_key";
pub const ORGANIZERS_USER_FKEY: &str = "organizers_user_id_fkey";
pub const ORGANIZERS_ACCOUNT_FKEY: &str = "organizers_account_data_id_fkey";
pub const EVENT_ORGANIZERS_KEY: &str = "event_organizers_event_id_organizer_id_key";
pub const EVENT_ORGANIZERS_EVENT_FKEY: &str = "event_organizers_event_id_fkey";
pub const EVENT_ORGANIZERS_ORGANIZER_FKEY: &str = "event_organizers_organizer_id_fkey";
pub const SPONSOR_CATEGORIES_KEY: &str = "sponsor_categories_event_id_name_key";
pub const SPONSOR_CATEGORIES_EVENT_FKEY: &str = "sponsor_categories_event_id_fkey";
pub const SPONSORS_DOCUMENT_NUMBER_KEY: &str = "sponsors_document_number_key";
pub const SPONSORINGS_KEY: &str = "sponsorings_sponsor_category_id_sponsor_id_key";
pub const SPONSORINGS_CATEGORY_FKEY: &str = "sponsorings_sponsor_category_id_fkey";
pub const SPONSORINGS_SPONSOR_FKEY: &str = "sponsorings_sponsor_id_fkey";
pub const INVOICES_SPONSORING_FKEY: &str = "invoices_sponsoring_id_fkey";
pub const INVOICE_AFFECTS_INVOICE_FKEY: &str = "invoice_affects_invoice_id_fkey";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Unique,
    Reference,
    Check,
}

const RULES: &[(&str, Rule, &str)] = &[
    (USERS_USERNAME_KEY, Rule::Unique, "A user with that username already exists."),
    (ORGANIZERS_USER_KEY, Rule::Unique, "This user already has an organizer profile."),
    (ORGANIZERS_USER_FKEY, Rule::Reference, "The selected user does not exist."),
    (ORGANIZERS_ACCOUNT_FKEY, Rule::Reference, "The selected bank account does not exist."),
    (
        EVENT_ORGANIZERS_KEY,
        Rule::Unique,
        "Event organizer with this Event and Organizer already exists.",
    ),
    (EVENT_ORGANIZERS_EVENT_FKEY, Rule::Reference, "The selected event does not exist."),
    (
        EVENT_ORGANIZERS_ORGANIZER_FKEY,
        Rule::Reference,
        "The selected organizer does not exist.",
    ),
    (
        SPONSOR_CATEGORIES_KEY,
        Rule::Unique,
        "Sponsor category with this Event and Name already exists.",
    ),
    (SPONSOR_CATEGORIES_EVENT_FKEY, Rule::Reference, "The selected event does not exist."),
    (SPONSORS_DOCUMENT_NUMBER_KEY, Rule::Unique, "Sponsor with this CUIT already exists."),
    (
        SPONSORINGS_KEY,
        Rule::Unique,
        "Sponsoring with this Sponsor category and Sponsor already exists.",
    ),
    (
        SPONSORINGS_CATEGORY_FKEY,
        Rule::Reference,
        "The selected sponsor category does not exist.",
    ),
    (SPONSORINGS_SPONSOR_FKEY, Rule::Reference, "The selected sponsor does not exist."),
    (INVOICES_SPONSORING_FKEY, Rule::Reference, "The selected sponsoring does not exist."),
    (INVOICE_AFFECTS_INVOICE_FKEY, Rule::Reference, "The selected invoice does not exist."),
    ("bank_accounts_document_number_check", Rule::Check, "El CUIT ingresado no es correcto."),
    ("sponsors_document_number_check", Rule::Check, "El CUIT ingresado no es correcto."),
    ("events_commission_check", Rule::Check, "Commission must be between 0 and 100."),
    (
        "invoices_payment_flags_check",
        Rule::Check,
        "An invoice cannot be partially and completely paid at the same time.",
    ),
];

/// Error for a broken integrity rule. Uniqueness surfaces as a conflict,
/// everything else as invalid input.
pub fn violation(constraint: &str) -> AppError {
    match RULES.iter().find(|(name, _, _)| *name == constraint) {
        Some((_, Rule::Unique, message)) => AppError::Conflict((*message).to_string()),
        Some((_, Rule::Reference | Rule::Check, message)) => {
            AppError::ValidationError((*message).to_string())
        }
        None => AppError::ValidationError(format!("Constraint '{}' was violated", constraint)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_rules_are_conflicts() {
        assert!(matches!(
            violation(SPONSOR_CATEGORIES_KEY),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            violation(SPONSORS_DOCUMENT_NUMBER_KEY),
            AppError::Conflict(_)
        ));
    }

    #[test]
    fn test_reference_rules_are_validation_errors() {
        assert!(matches!(
            violation(INVOICE_AFFECTS_INVOICE_FKEY),
            AppError::ValidationError(_)
        ));
        assert!(matches!(
            violation("some_unknown_check"),
            AppError::ValidationError(_)
        ));
    }
}
