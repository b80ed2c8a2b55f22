//! Field-level validation shared by every entity payload.
//!
//! Checks accumulate into [`FieldErrors`] so a single response can report
//! every offending field at once.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

pub const DEFAULT_MAX_LEN: usize = 255;
pub const LONG_MAX_LEN: usize = 1000;
pub const CUIT_MAX_LEN: usize = 13;
pub const USERNAME_MAX_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;

/// CUIT tax id, formatted `##-########-#`.
pub const CUIT_PATTERN: &str = r"^\d{2}-\d{8}-\d$";

static CUIT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(CUIT_PATTERN).expect("CUIT pattern compiles"));

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

pub fn is_valid_cuit(value: &str) -> bool {
    CUIT_REGEX.is_match(value)
}

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn check_required(&mut self, field: &'static str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        } else {
            self.check_max_len(field, value, max_len);
        }
    }

    pub fn check_max_len(&mut self, field: &'static str, value: &str, max_len: usize) {
        let len = value.chars().count();
        if len > max_len {
            self.add(
                field,
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max_len, len
                ),
            );
        }
    }

    pub fn check_cuit(&mut self, field: &'static str, value: &str) {
        if !is_valid_cuit(value) {
            self.add(field, "El CUIT ingresado no es correcto.");
        }
    }

    /// Mirrors a `NUMERIC(max_digits, decimal_places)` column.
    pub fn check_digits(
        &mut self,
        field: &'static str,
        value: &Decimal,
        max_digits: u32,
        decimal_places: u32,
    ) {
        let normalized = value.normalize();
        if normalized.scale() > decimal_places {
            self.add(
                field,
                format!(
                    "Ensure that there are no more than {} decimal places.",
                    decimal_places
                ),
            );
        }

        let whole = normalized.trunc().abs();
        let whole_digits = if whole.is_zero() {
            0
        } else {
            whole.to_string().len() as u32
        };
        let max_whole = max_digits.saturating_sub(decimal_places);
        if whole_digits > max_whole {
            self.add(
                field,
                format!(
                    "Ensure that there are no more than {} digits before the decimal point.",
                    max_whole
                ),
            );
        }
    }

    pub fn check_range(&mut self, field: &'static str, value: &Decimal, min: Decimal, max: Decimal) {
        if *value < min {
            self.add(
                field,
                format!("Ensure this value is greater than or equal to {}.", min),
            );
        }
        if *value > max {
            self.add(
                field,
                format!("Ensure this value is less than or equal to {}.", max),
            );
        }
    }

    /// A bare file name; the storage prefix is prepended by the caller.
    pub fn check_file_name(&mut self, field: &'static str, value: &str, max_len: usize) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        } else if value.contains(['/', '\\']) || value == "." || value == ".." {
            self.add(field, "Enter a file name without directories.");
        } else {
            self.check_max_len(field, value, max_len);
        }
    }

    pub fn check_username(&mut self, field: &'static str, value: &str) {
        self.check_required(field, value, USERNAME_MAX_LEN);
        if !value.is_empty() && !USERNAME_REGEX.is_match(value) {
            self.add(
                field,
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
    }

    pub fn check_email(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        } else if !EMAIL_REGEX.is_match(value) {
            self.add(field, "Enter a valid email address.");
        } else {
            self.check_max_len(field, value, DEFAULT_MAX_LEN);
        }
    }

    /// Two-field password entry, as used by signup and reset forms.
    pub fn check_new_password(&mut self, field: &'static str, password1: &str, password2: &str) {
        if password1 != password2 {
            self.add(field, "The two password fields didn't match.");
            return;
        }
        if password1.chars().count() < MIN_PASSWORD_LEN {
            self.add(
                field,
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    MIN_PASSWORD_LEN
                ),
            );
        }
        if !password1.is_empty() && password1.chars().all(|c| c.is_ascii_digit()) {
            self.add(field, "This password is entirely numeric.");
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cuit_format() {
        assert!(is_valid_cuit("20-12345678-9"));
        assert!(is_valid_cuit("30-71234567-1"));

        for bad in [
            "",
            "20123456789",
            "20-1234567-9",
            "20-123456789-9",
            "2a-12345678-9",
            "20-12345678-",
            " 20-12345678-9",
            "20-12345678-9 ",
            "20_12345678_9",
        ] {
            assert!(!is_valid_cuit(bad), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_digits_limits() {
        let mut errors = FieldErrors::new();
        errors.check_digits("commission", &dec!(100.00), 5, 2);
        errors.check_digits("amount", &dec!(1234567890123456.99), 18, 2);
        assert!(errors.is_empty(), "{}", errors);

        let mut errors = FieldErrors::new();
        errors.check_digits("commission", &dec!(1.234), 5, 2);
        errors.check_digits("amount", &dec!(12345678901234567), 18, 2);
        assert!(errors.has("commission"));
        assert!(errors.has("amount"));
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_decimals() {
        let mut errors = FieldErrors::new();
        errors.check_digits("amount", &dec!(10.5000), 18, 2);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_range() {
        let mut errors = FieldErrors::new();
        errors.check_range("commission", &dec!(0), dec!(0), dec!(100));
        errors.check_range("commission", &dec!(100), dec!(0), dec!(100));
        assert!(errors.is_empty());

        errors.check_range("commission", &dec!(-0.01), dec!(0), dec!(100));
        errors.check_range("commission", &dec!(100.01), dec!(0), dec!(100));
        assert_eq!(errors.get("commission").map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_file_name() {
        let mut errors = FieldErrors::new();
        errors.check_file_name("document", "factura-001.pdf", DEFAULT_MAX_LEN);
        assert!(errors.is_empty());

        errors.check_file_name("document", "../etc/passwd", DEFAULT_MAX_LEN);
        assert!(errors.has("document"));
    }

    #[test]
    fn test_new_password_rules() {
        let mut errors = FieldErrors::new();
        errors.check_new_password("password", "s3cret-pass", "s3cret-pass");
        assert!(errors.is_empty());

        let mut errors = FieldErrors::new();
        errors.check_new_password("password", "s3cret-pass", "other-pass");
        assert!(errors.has("password"));

        let mut errors = FieldErrors::new();
        errors.check_new_password("password", "12345678901", "12345678901");
        assert!(errors.has("password"));

        let mut errors = FieldErrors::new();
        errors.check_new_password("password", "short", "short");
        assert!(errors.has("password"));
    }

    #[test]
    fn test_display_joins_messages() {
        let mut errors = FieldErrors::new();
        errors.add("name", "This field is required.");
        errors.add("cbu", "Too long.");
        assert_eq!(
            errors.to_string(),
            "cbu: Too long.; name: This field is required."
        );
    }
}
