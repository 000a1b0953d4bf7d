use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{
    CommentDetails, EmployeeProfile, NewAccount, Project, ProjectAssignment, ProjectDetails, Role,
    Task, TaskComment, TaskDetails, User, WorkloadSnapshot,
};
use crate::domain::access::{ProjectScope, TaskScope};

/// Stored user together with its password hash.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

/// Persistence port for accounts and employee profiles.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_credentials(&self, email: &str) -> anyhow::Result<Option<Credentials>>;
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    /// Insert user, role memberships and profile atomically. Returns false
    /// when the normalized email is already taken.
    async fn insert_account(&self, account: NewAccount) -> anyhow::Result<bool>;
    async fn find_profile(&self, user_id: Uuid) -> anyhow::Result<Option<EmployeeProfile>>;
    /// Active users, optionally narrowed to one role, ordered by name.
    async fn list_active(&self, role: Option<Role>) -> anyhow::Result<Vec<User>>;
    /// Returns false when no such user exists.
    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool>;
    async fn save_workload(&self, user_id: Uuid, snapshot: &WorkloadSnapshot)
        -> anyhow::Result<()>;
}

/// Persistence port for projects and their assignments.
#[async_trait]
pub trait ProjectsRepository: Send + Sync {
    async fn list(&self, scope: ProjectScope) -> anyhow::Result<Vec<ProjectDetails>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Project>>;
    async fn find_details(&self, id: Uuid) -> anyhow::Result<Option<ProjectDetails>>;
    async fn insert(&self, project: Project) -> anyhow::Result<()>;
    async fn update(&self, project: Project) -> anyhow::Result<()>;
    /// Delete the project with its assignments, tasks and comments.
    /// Returns the employees whose assignments or tasks went with it, or
    /// `None` when no such project exists.
    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<Option<Vec<Uuid>>>;
    /// Returns false when an active assignment for the same pair already
    /// exists; the store's uniqueness guarantee decides races.
    async fn insert_assignment(&self, assignment: ProjectAssignment) -> anyhow::Result<bool>;
    async fn has_active_assignment(&self, project_id: Uuid, employee_id: Uuid)
        -> anyhow::Result<bool>;
    /// End dates of projects the employee is actively assigned to.
    async fn active_assignment_end_dates(
        &self,
        employee_id: Uuid,
    ) -> anyhow::Result<Vec<DateTime<Utc>>>;
}

/// Persistence port for tasks and comments.
#[async_trait]
pub trait TasksRepository: Send + Sync {
    async fn list(
        &self,
        scope: TaskScope,
        project_id: Option<Uuid>,
    ) -> anyhow::Result<Vec<TaskDetails>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Task>>;
    /// Includes comments ordered by creation time.
    async fn find_details(&self, id: Uuid) -> anyhow::Result<Option<TaskDetails>>;
    async fn insert(&self, task: Task) -> anyhow::Result<()>;
    async fn update(&self, task: Task) -> anyhow::Result<()>;
    async fn insert_comment(&self, comment: TaskComment) -> anyhow::Result<CommentDetails>;
    async fn count_open_for(&self, employee_id: Uuid) -> anyhow::Result<u64>;
}
