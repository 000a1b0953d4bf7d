//! Domain services. Each one owns its repositories through trait objects and
//! turns storage failures into `DomainError::Database`.

mod auth;
mod directory;
mod projects;
mod tasks;
mod workload;

pub use auth::{AuthService, LoginOutcome};
pub use directory::{DirectoryEntry, DirectoryService};
pub use projects::ProjectService;
pub use tasks::TaskService;
pub use workload::WorkloadTracker;

use crate::domain::error::DomainError;

pub(crate) fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}
