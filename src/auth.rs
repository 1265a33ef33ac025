use anyhow::Result;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::http::{HeaderMap, header};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::accounts::Accounts;
use crate::error::ApiError;
use crate::handler::AppState;
use crate::model::User;

/// Hashes and checks password credentials. Constructed once at startup and
/// shared through `AppState`; plaintext passwords only ever exist on the
/// stack of these two methods and in the incoming request.
pub struct CredentialVerifier {
    argon2: Argon2<'static>,
}

impl CredentialVerifier {
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Salted Argon2id hash in PHC string form, ready for storage.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl Default for CredentialVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    /// Pulls a username/password pair out of a `Basic` Authorization header.
    /// Any absent or malformed header yields `None`; the caller treats that
    /// the same as a failed credential check.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let encoded = value.strip_prefix("Basic ")?;
        let decoded = String::from_utf8(BASE64.decode(encoded.trim()).ok()?).ok()?;
        let (username, password) = decoded.split_once(':')?;
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(BasicCredentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

/// Capability check for the mutating endpoints: resolves the Basic
/// credentials on the request to a stored user. Every failure mode — no
/// header, unknown username, wrong password — collapses into the same
/// `ApiError::Unauthorized` so responses never reveal whether a username
/// exists.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let Some(credentials) = BasicCredentials::from_headers(headers) else {
        return Err(ApiError::Unauthorized);
    };

    let accounts = Accounts::new(state.db.connection());
    let user = accounts.find_by_username(&credentials.username).await?;

    match user {
        Some(user) if state.verifier.verify_password(&credentials.password, &user.password_hash) => {
            Ok(user)
        }
        _ => Err(ApiError::Unauthorized),
    }
}
