use std::sync::Arc;

use crate::auth::session::SessionKeys;
use crate::auth::tokens::{encode_uid, TokenGenerator, TokenPurpose};
use crate::config::Config;
use crate::models::User;
use crate::store::Store;
use crate::utils::error::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: Arc<SessionKeys>,
    pub reset_tokens: Arc<TokenGenerator>,
    pub activation_tokens: Arc<TokenGenerator>,
    pub site_url: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> AppResult<Self> {
        Ok(Self {
            store,
            sessions: Arc::new(SessionKeys::new(&config.secret_key, config.session_ttl)),
            reset_tokens: Arc::new(TokenGenerator::new(
                &config.secret_key,
                TokenPurpose::PasswordReset,
                config.password_reset_timeout,
            )?),
            activation_tokens: Arc::new(TokenGenerator::new(
                &config.secret_key,
                TokenPurpose::Activation,
                config.password_reset_timeout,
            )?),
            site_url: Arc::from(config.site_url.as_str()),
        })
    }

    pub fn tokens(&self, purpose: TokenPurpose) -> &TokenGenerator {
        match purpose {
            TokenPurpose::PasswordReset => self.reset_tokens.as_ref(),
            TokenPurpose::Activation => self.activation_tokens.as_ref(),
        }
    }

    /// Absolute link carrying a fresh one-time token for `user`.
    pub fn token_link(&self, prefix: &str, purpose: TokenPurpose, user: &User) -> String {
        format!(
            "{}{}/{}/{}/",
            self.site_url,
            prefix,
            encode_uid(user.id),
            self.tokens(purpose).make_token(user)
        )
    }
}
