//! One-time links for password reset and account activation.
//!
//! A token is `<base36 timestamp>-<hex mac>`. The MAC covers the user's
//! password hash, last login and active flag, so setting a new password,
//! logging in or activating the account invalidates every token issued
//! before. Nothing is stored server side.
//!
//! Each purpose keys its own generator, so an activation token never passes
//! as a reset token or the other way round.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::models::User;
use crate::utils::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

const KEY_SALT: &[u8] = b"events-server.auth.tokens";
/// Bytes of the MAC kept in the token.
const MAC_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    PasswordReset,
    Activation,
}

impl TokenPurpose {
    fn salt(self) -> &'static [u8] {
        match self {
            TokenPurpose::PasswordReset => b"password-reset",
            TokenPurpose::Activation => b"account-activation",
        }
    }
}

pub struct TokenGenerator {
    mac: HmacSha256,
    timeout: Duration,
}

impl TokenGenerator {
    pub fn new(secret: &str, purpose: TokenPurpose, timeout: Duration) -> AppResult<Self> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::InternalServerError(format!("invalid token key: {}", e)))?;
        mac.update(KEY_SALT);
        mac.update(b":");
        mac.update(purpose.salt());
        Ok(Self { mac, timeout })
    }

    pub fn make_token(&self, user: &User) -> String {
        self.make_token_at(user, Utc::now())
    }

    pub fn make_token_at(&self, user: &User, now: DateTime<Utc>) -> String {
        let timestamp = now.timestamp().max(0) as u64;
        let digest = self.sign(user, timestamp).finalize().into_bytes();
        format!("{}-{}", to_base36(timestamp), to_hex(&digest[..MAC_LEN]))
    }

    pub fn check_token(&self, user: &User, token: &str) -> bool {
        self.check_token_at(user, token, Utc::now())
    }

    pub fn check_token_at(&self, user: &User, token: &str, now: DateTime<Utc>) -> bool {
        let Some((ts, mac)) = token.split_once('-') else {
            return false;
        };
        let Ok(timestamp) = u64::from_str_radix(ts, 36) else {
            return false;
        };
        let Some(mac) = from_hex(mac).filter(|bytes| bytes.len() == MAC_LEN) else {
            return false;
        };
        if self.sign(user, timestamp).verify_truncated_left(&mac).is_err() {
            return false;
        }
        let age = now.timestamp() - timestamp as i64;
        (0..=self.timeout.num_seconds()).contains(&age)
    }

    fn sign(&self, user: &User, timestamp: u64) -> HmacSha256 {
        let last_login = user
            .last_login
            .map(|at| at.timestamp_micros().to_string())
            .unwrap_or_default();

        let mut mac = self.mac.clone();
        mac.update(user.id.as_bytes());
        mac.update(user.password_hash.as_bytes());
        mac.update(last_login.as_bytes());
        mac.update(&timestamp.to_be_bytes());
        mac.update(&[u8::from(user.is_active)]);
        mac
    }
}

/// Encodes a user id for use in a URL path.
pub fn encode_uid(id: Uuid) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

pub fn decode_uid(uidb64: &str) -> Option<Uuid> {
    let raw = URL_SAFE_NO_PAD.decode(uidb64).ok()?;
    String::from_utf8(raw).ok()?.parse().ok()
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    fn generator() -> TokenGenerator {
        TokenGenerator::new("secret", TokenPurpose::PasswordReset, Duration::days(3)).unwrap()
    }

    fn user() -> User {
        User::create(NewUser {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "$argon2id$v=19$first".to_string(),
            is_active: false,
            is_superuser: false,
        })
    }

    #[test]
    fn test_fresh_token_checks() {
        let tokens = generator();
        let user = user();
        let token = tokens.make_token(&user);
        assert!(tokens.check_token(&user, &token));
        assert!(!tokens.check_token(&user, "garbage"));
        assert!(!tokens.check_token(&user, "zz-0011"));
    }

    #[test]
    fn test_token_expires_after_timeout() {
        let tokens = generator();
        let user = user();
        let issued = Utc::now() - Duration::days(4);
        let token = tokens.make_token_at(&user, issued);
        assert!(tokens.check_token_at(&user, &token, issued + Duration::days(3)));
        assert!(!tokens.check_token(&user, &token));
    }

    #[test]
    fn test_state_changes_invalidate_token() {
        let tokens = generator();
        let user = user();
        let token = tokens.make_token(&user);

        let mut activated = user.clone();
        activated.is_active = true;
        assert!(!tokens.check_token(&activated, &token));

        let mut reset = user.clone();
        reset.password_hash = "$argon2id$v=19$second".to_string();
        assert!(!tokens.check_token(&reset, &token));

        let mut logged_in = user.clone();
        logged_in.last_login = Some(Utc::now());
        assert!(!tokens.check_token(&logged_in, &token));
    }

    #[test]
    fn test_tokens_are_bound_to_the_secret() {
        let user = user();
        let token = generator().make_token(&user);
        let other =
            TokenGenerator::new("other-secret", TokenPurpose::PasswordReset, Duration::days(3))
                .unwrap();
        assert!(!other.check_token(&user, &token));
    }

    #[test]
    fn test_tokens_are_bound_to_their_purpose() {
        let user = user();
        let reset = generator();
        let activation =
            TokenGenerator::new("secret", TokenPurpose::Activation, Duration::days(3)).unwrap();

        let token = activation.make_token(&user);
        assert!(activation.check_token(&user, &token));
        assert!(!reset.check_token(&user, &token));
        assert!(!activation.check_token(&user, &reset.make_token(&user)));
    }

    #[test]
    fn test_uid_encoding() {
        let id = Uuid::new_v4();
        let encoded = encode_uid(id);
        assert!(!encoded.contains('='));
        assert_eq!(decode_uid(&encoded), Some(id));
        assert_eq!(decode_uid("!!not base64"), None);
        assert_eq!(decode_uid(&URL_SAFE_NO_PAD.encode("not-a-uuid")), None);
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(u64::from_str_radix(&to_base36(1_700_000_000), 36).unwrap(), 1_700_000_000);
    }
}
