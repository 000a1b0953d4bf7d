//! Session tokens and password policy.
//!
//! Tokens are HS256 JWTs carrying the subject id, email, given/family name
//! and one entry per role. Verification checks signature, issuer, audience
//! and expiry together.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::contract::model::{Actor, Role, User};
use crate::domain::error::Violations;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    BadSignature,
    #[error("token is malformed")]
    Malformed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Unknown role names are dropped.
    pub fn to_actor(&self) -> Result<Actor, TokenError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| TokenError::Malformed)?;
        let roles = self
            .roles
            .iter()
            .filter_map(|r| r.parse::<Role>().ok())
            .collect();
        Ok(Actor::new(id, self.email.clone(), roles))
    }
}

/// Issues and verifies signed session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&[cfg.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            lifetime: Duration::days(cfg.expiration_days),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            given_name: user.first_name.clone(),
            family_name: user.last_name.clone(),
            roles: user.roles.iter().map(|r| r.as_str().to_string()).collect(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "failed to sign session token");
            TokenError::Malformed
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })
    }

    /// Verify and resolve the acting identity.
    pub fn authenticate(&self, token: &str) -> Result<Actor, TokenError> {
        self.verify(token)?.to_actor()
    }
}

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Length, digit, lowercase, uppercase and non-alphanumeric requirements,
/// each reported separately on the `password` field.
pub fn check_password_policy(password: &str, violations: &mut Violations) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        violations.add(
            "password",
            format!("Passwords must be at least {MIN_PASSWORD_LEN} characters."),
        );
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.add("password", "Passwords must have at least one digit ('0'-'9').");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        violations.add("password", "Passwords must have at least one lowercase ('a'-'z').");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        violations.add("password", "Passwords must have at least one uppercase ('A'-'Z').");
    }
    if password.chars().all(|c| c.is_alphanumeric()) {
        violations.add(
            "password",
            "Passwords must have at least one non alphanumeric character.",
        );
    }
}
