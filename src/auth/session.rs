use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// Signs and checks the bearer tokens handed out at login.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("token signing failed: {}", e)))
    }

    /// Returns the user id the token was issued for.
    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected session token");
                AppError::AuthError("Invalid or expired session".to_string())
            })?;
        claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid or expired session".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    fn user() -> User {
        User::create(NewUser {
            username: "grace".to_string(),
            email: "grace@example.com".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            password_hash: String::new(),
            is_active: true,
            is_superuser: false,
        })
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = SessionKeys::new("secret", Duration::hours(1));
        let user = user();
        let token = keys.issue(&user).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), user.id);
    }

    #[test]
    fn test_foreign_and_expired_tokens_are_rejected() {
        let user = user();
        let token = SessionKeys::new("other", Duration::hours(1)).issue(&user).unwrap();
        let keys = SessionKeys::new("secret", Duration::hours(1));
        assert!(matches!(keys.verify(&token), Err(AppError::AuthError(_))));

        let stale = SessionKeys::new("secret", Duration::hours(-2)).issue(&user).unwrap();
        assert!(matches!(keys.verify(&stale), Err(AppError::AuthError(_))));
    }
}
