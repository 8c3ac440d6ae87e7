//! Authentication backend for axum-login.
//!
//! The credential table lives in the `[users]` config section, one
//! `username = argon2-hash` pair per account. Username matching is exact;
//! passwords are verified with argon2id.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum_login::{AuthUser, AuthnBackend, UserId};
use std::collections::HashMap;

use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub username: String,
    /// The password hash string as bytes, used by axum-login to validate
    /// sessions.
    pw_hash_bytes: Vec<u8>,
}

impl AuthUser for User {
    type Id = String;

    fn id(&self) -> String {
        self.username.clone()
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.pw_hash_bytes
    }
}

/// Login credentials submitted via the login form.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Default)]
pub struct Backend {
    users: HashMap<String, String>,
}

impl Backend {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Self {
        Self::new(config.get_section("users").unwrap_or_default())
    }

    fn make_user(&self, username: &str, password_hash: &str) -> User {
        User {
            username: username.to_string(),
            pw_hash_bytes: password_hash.as_bytes().to_vec(),
        }
    }
}

impl AuthnBackend for Backend {
    type User = User;
    type Credentials = Credentials;
    type Error = std::convert::Infallible;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let Some(stored) = self.users.get(&creds.username) else {
            return Ok(None);
        };

        let parsed_hash = match PasswordHash::new(stored) {
            Ok(h) => h,
            Err(_) => return Ok(None),
        };

        let argon2 = Argon2::default();
        if argon2
            .verify_password(creds.password.as_bytes(), &parsed_hash)
            .is_ok()
        {
            Ok(Some(self.make_user(&creds.username, stored)))
        } else {
            Ok(None)
        }
    }

    async fn get_user(
        &self,
        user_id: &UserId<Self>,
    ) -> Result<Option<Self::User>, Self::Error> {
        Ok(self
            .users
            .get(user_id)
            .map(|hash| self.make_user(user_id, hash)))
    }
}
