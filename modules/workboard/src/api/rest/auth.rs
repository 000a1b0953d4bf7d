use std::sync::Arc;

use apikit::ProblemResponse;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use tracing::debug;

use crate::api::rest::error::{from_parts, map_domain_error, ProblemContext};
use crate::contract::model::Actor;
use crate::domain::credentials::TokenService;
use crate::domain::error::DomainError;

/// The caller identified by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = ProblemContext::from_parts(parts);
        let Some(tokens) = parts.extensions.get::<Arc<TokenService>>().cloned() else {
            return Err(from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal Server Error",
                "Token verification is not configured.",
                &ctx,
            ));
        };

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| {
                from_parts(
                    StatusCode::UNAUTHORIZED,
                    "MISSING_TOKEN",
                    "Unauthorized",
                    "A bearer token is required.",
                    &ctx,
                )
            })?;

        match tokens.authenticate(token) {
            Ok(actor) => Ok(Self(actor)),
            Err(e) => {
                debug!(error = %e, path = %ctx.instance, "Rejected bearer token");
                Err(map_domain_error(&DomainError::Token(e), &ctx))
            }
        }
    }
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
