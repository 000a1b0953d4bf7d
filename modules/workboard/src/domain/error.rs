use thiserror::Error;
use uuid::Uuid;

use crate::domain::credentials::TokenError;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {}", join_violations(.violations))]
    Validation { violations: Vec<FieldViolation> },

    #[error("Project not found: {id}")]
    ProjectNotFound { id: Uuid },

    #[error("Task not found: {id}")]
    TaskNotFound { id: Uuid },

    #[error("Employee not found: {id}")]
    EmployeeNotFound { id: Uuid },

    #[error("Employee email is required")]
    EmployeeMissingEmail { id: Uuid },

    #[error("Project not found or unauthorized")]
    ProjectNotFoundOrUnauthorized { id: Uuid },

    #[error("Employee is already assigned to this project")]
    AlreadyAssigned { project_id: Uuid, employee_id: Uuid },

    #[error("Access denied: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error("Invalid token: {0}")]
    Token(#[from] TokenError),

    #[error("Database error: {message}")]
    Database { message: String },
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![FieldViolation {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn project_not_found(id: Uuid) -> Self {
        Self::ProjectNotFound { id }
    }

    pub fn task_not_found(id: Uuid) -> Self {
        Self::TaskNotFound { id }
    }

    pub fn employee_not_found(id: Uuid) -> Self {
        Self::EmployeeNotFound { id }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

/// Collects field violations and turns them into a single
/// `DomainError::Validation`.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// Non-empty check for a required text field.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("The {field} field is required."));
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(
                field,
                format!("The field {field} must be a string with a maximum length of {max}."),
            );
        }
    }

    pub fn into_result(self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation { violations: self.0 })
        }
    }
}
