use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::audit::Audit;
use crate::models::choices::EventCategory;
use crate::validation::{FieldErrors, DEFAULT_MAX_LEN};

pub const COMMISSION_MAX_DIGITS: u32 = 5;
pub const COMMISSION_DECIMAL_PLACES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    /// Percentage kept from sponsorships, 0 to 100.
    pub commission: Decimal,
    pub start_date: Option<NaiveDate>,
    pub place: String,
    pub category: Option<EventCategory>,
    pub close: bool,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl Event {
    pub fn create(new: NewEvent, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new.name,
            commission: new.commission,
            start_date: new.start_date,
            place: new.place,
            category: new.category,
            close: new.close,
            audit: Audit::new(actor),
        }
    }

    pub fn apply(&mut self, new: NewEvent) {
        self.name = new.name;
        self.commission = new.commission;
        self.start_date = new.start_date;
        self.place = new.place;
        self.category = new.category;
        self.close = new.close;
        self.audit.touch();
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub commission: Decimal,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub category: Option<EventCategory>,
    #[serde(default)]
    pub close: bool,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check_required("name", &self.name, DEFAULT_MAX_LEN);
        errors.check_digits(
            "commission",
            &self.commission,
            COMMISSION_MAX_DIGITS,
            COMMISSION_DECIMAL_PLACES,
        );
        errors.check_range(
            "commission",
            &self.commission,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        );
        errors.check_max_len("place", &self.place, DEFAULT_MAX_LEN);
        errors.finish()
    }
}

/// An organizer's tenure on an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventOrganizer {
    pub id: Uuid,
    pub event_id: Uuid,
    pub organizer_id: Uuid,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub audit: Audit,
}

impl EventOrganizer {
    pub fn create(new: NewEventOrganizer, actor: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id: new.event_id,
            organizer_id: new.organizer_id,
            audit: Audit::new(actor),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEventOrganizer {
    pub event_id: Uuid,
    pub organizer_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(commission: Decimal) -> NewEvent {
        NewEvent {
            name: "PyCon Argentina".to_string(),
            commission,
            start_date: NaiveDate::from_ymd_opt(2024, 11, 14),
            place: "Córdoba".to_string(),
            category: Some(EventCategory::PyCon),
            close: false,
        }
    }

    #[test]
    fn test_commission_bounds_are_inclusive() {
        assert!(event(dec!(0)).validate().is_ok());
        assert!(event(dec!(10.5)).validate().is_ok());
        assert!(event(dec!(100)).validate().is_ok());
    }

    #[test]
    fn test_commission_outside_range_is_rejected() {
        for value in [dec!(-1), dec!(-0.01), dec!(100.01), dec!(250)] {
            let errors = event(value).validate().unwrap_err();
            assert!(errors.has("commission"), "{} should be rejected", value);
        }
    }

    #[test]
    fn test_commission_precision() {
        let errors = event(dec!(12.345)).validate().unwrap_err();
        assert!(errors.has("commission"));
    }

    #[test]
    fn test_optional_fields_default() {
        let payload: NewEvent =
            serde_json::from_str(r#"{"name": "PyDay La Plata", "commission": "10"}"#).unwrap();
        assert_eq!(payload.place, "");
        assert_eq!(payload.category, None);
        assert!(!payload.close);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_name_is_required() {
        let mut payload = event(dec!(10));
        payload.name = "  ".to_string();
        assert!(payload.validate().unwrap_err().has("name"));
    }
}
