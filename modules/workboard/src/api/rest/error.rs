use std::convert::Infallible;

use apikit::{Problem, ProblemResponse, ValidationError};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::domain::error::DomainError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Where a problem happened: request path and, when the ingress assigned one,
/// the request id.
#[derive(Debug, Clone, Default)]
pub struct ProblemContext {
    pub instance: String,
    pub request_id: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for ProblemContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

impl ProblemContext {
    pub fn from_parts(parts: &Parts) -> Self {
        Self {
            instance: parts.uri.path().to_string(),
            request_id: parts
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Build a problem response from its parts.
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    ctx: &ProblemContext,
) -> ProblemResponse {
    let mut problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.taskhub.dev/{}", code.to_lowercase()))
        .with_code(code)
        .with_instance(ctx.instance.clone());
    if let Some(id) = &ctx.request_id {
        problem = problem.with_request_id(id.clone());
    }
    ProblemResponse(problem)
}

/// Map a domain failure to its HTTP representation. Database details stay in
/// the log.
pub fn map_domain_error(e: &DomainError, ctx: &ProblemContext) -> ProblemResponse {
    match e {
        DomainError::Validation { violations } => {
            let mut resp = from_parts(
                StatusCode::BAD_REQUEST,
                "VALIDATION",
                "Validation failed",
                "One or more fields are invalid.",
                ctx,
            );
            resp.0 = resp.0.with_errors(
                violations
                    .iter()
                    .map(|v| ValidationError::field(&v.field, v.message.clone()))
                    .collect(),
            );
            resp
        }
        DomainError::ProjectNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "PROJECT_NOT_FOUND",
            "Project not found",
            e.to_string(),
            ctx,
        ),
        DomainError::TaskNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "TASK_NOT_FOUND",
            "Task not found",
            e.to_string(),
            ctx,
        ),
        DomainError::EmployeeNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "EMPLOYEE_NOT_FOUND",
            "Employee not found",
            e.to_string(),
            ctx,
        ),
        DomainError::EmployeeMissingEmail { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "EMPLOYEE_MISSING_EMAIL",
            "Employee email is required",
            e.to_string(),
            ctx,
        ),
        DomainError::ProjectNotFoundOrUnauthorized { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "PROJECT_NOT_FOUND_OR_UNAUTHORIZED",
            "Project not found or unauthorized",
            e.to_string(),
            ctx,
        ),
        DomainError::AlreadyAssigned { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "ALREADY_ASSIGNED",
            "Conflict",
            e.to_string(),
            ctx,
        ),
        DomainError::Forbidden { .. } => from_parts(
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Forbidden",
            e.to_string(),
            ctx,
        ),
        DomainError::InvalidCredentials => from_parts(
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "Unauthorized",
            e.to_string(),
            ctx,
        ),
        DomainError::AccountDeactivated => from_parts(
            StatusCode::UNAUTHORIZED,
            "ACCOUNT_DEACTIVATED",
            "Unauthorized",
            e.to_string(),
            ctx,
        ),
        DomainError::Token(_) => from_parts(
            StatusCode::UNAUTHORIZED,
            "INVALID_TOKEN",
            "Unauthorized",
            e.to_string(),
            ctx,
        ),
        DomainError::Database { .. } => from_parts(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "Internal Server Error",
            "An internal error occurred.",
            ctx,
        ),
    }
}
