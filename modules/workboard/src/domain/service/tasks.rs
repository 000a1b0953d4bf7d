use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::contract::model::{
    Actor, CommentDetails, NewTask, Task, TaskComment, TaskDetails, TaskPatch, TaskStatus,
};
use crate::domain::access::{
    authorize_task_comment, authorize_task_create, authorize_task_read, authorize_task_update,
    check_task_patch, task_list_scope, TaskEditRights,
};
use crate::domain::error::{DomainError, Violations};
use crate::domain::notify::task_assignment_email;
use crate::domain::ports::Notifier;
use crate::domain::repo::{ProjectsRepository, TasksRepository, UsersRepository};
use crate::domain::service::{db_err, WorkloadTracker};

pub const TITLE_MAX_LEN: usize = 100;

/// Task lifecycle and comments.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TasksRepository>,
    projects: Arc<dyn ProjectsRepository>,
    users: Arc<dyn UsersRepository>,
    workload: WorkloadTracker,
    notifier: Arc<dyn Notifier>,
}

impl TaskService {
    pub fn new(
        tasks: Arc<dyn TasksRepository>,
        projects: Arc<dyn ProjectsRepository>,
        users: Arc<dyn UsersRepository>,
        workload: WorkloadTracker,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            tasks,
            projects,
            users,
            workload,
            notifier,
        }
    }

    #[instrument(name = "workboard.service.list_tasks", skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn list(
        &self,
        actor: &Actor,
        project_id: Option<Uuid>,
    ) -> Result<Vec<TaskDetails>, DomainError> {
        let scope = task_list_scope(actor);
        let tasks = self
            .tasks
            .list(scope, project_id)
            .await
            .map_err(db_err)?;
        info!(count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    #[instrument(name = "workboard.service.get_task", skip(self, actor), fields(actor_id = %actor.id, task_id = %id))]
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<TaskDetails, DomainError> {
        let details = self
            .tasks
            .find_details(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::task_not_found(id))?;
        authorize_task_read(actor)?;
        Ok(details)
    }

    /// Only the team lead owning the target project may create tasks in it.
    #[instrument(
        name = "workboard.service.create_task",
        skip(self, actor, new),
        fields(actor_id = %actor.id, project_id = %new.project_id, employee_id = %new.employee_id)
    )]
    pub async fn create(&self, actor: &Actor, new: NewTask) -> Result<Task, DomainError> {
        let project = self
            .projects
            .find(new.project_id)
            .await
            .map_err(db_err)?;
        authorize_task_create(actor, new.project_id, project.as_ref().map(|p| p.team_lead_id))?;
        let Some(project) = project else {
            return Err(DomainError::ProjectNotFoundOrUnauthorized { id: new.project_id });
        };

        let mut v = Violations::new();
        v.require("title", &new.title);
        v.max_len("title", new.title.trim(), TITLE_MAX_LEN);
        v.require("description", &new.description);
        v.require("priority", &new.priority);
        let assignee = self
            .users
            .find_by_id(new.employee_id)
            .await
            .map_err(db_err)?;
        if assignee.is_none() {
            v.add("employeeId", format!("Employee '{}' does not exist.", new.employee_id));
        }
        v.into_result()?;

        let task = Task {
            id: Uuid::new_v4(),
            title: new.title.trim().to_string(),
            description: new.description,
            status: new.status,
            priority: new.priority.trim().to_string(),
            due_date: new.due_date,
            created_date: Utc::now(),
            completed_date: None,
            project_id: new.project_id,
            employee_id: new.employee_id,
        };
        self.tasks.insert(task.clone()).await.map_err(db_err)?;
        info!(task_id = %task.id, "Task created");

        self.workload.refresh(task.employee_id).await;
        if let Some(assignee) = assignee {
            self.notifier
                .notify(task_assignment_email(&assignee, &task, &project.title));
        }
        Ok(task)
    }

    /// The owning project's team lead is looked up explicitly on every call.
    /// An assignee moving the task to `Completed` stamps the completion time.
    #[instrument(name = "workboard.service.update_task", skip(self, actor, patch), fields(actor_id = %actor.id, task_id = %id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, DomainError> {
        let current = self
            .tasks
            .find(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::task_not_found(id))?;
        let project_team_lead = self
            .projects
            .find(current.project_id)
            .await
            .map_err(db_err)?
            .map(|p| p.team_lead_id);

        let rights = authorize_task_update(actor, &current, project_team_lead)?;
        check_task_patch(rights, &current, &patch)?;

        let mut v = Violations::new();
        if let Some(title) = &patch.title {
            v.require("title", title);
            v.max_len("title", title.trim(), TITLE_MAX_LEN);
        }
        if let Some(priority) = &patch.priority {
            v.require("priority", priority);
        }
        v.into_result()?;

        let stamp_completion = rights == TaskEditRights::StatusAndDescription
            && patch.status == Some(TaskStatus::Completed);
        let status_changed = patch.status.is_some_and(|s| s != current.status);

        let task = Task {
            title: patch
                .title
                .map(|t| t.trim().to_string())
                .unwrap_or(current.title),
            description: patch.description.unwrap_or(current.description),
            status: patch.status.unwrap_or(current.status),
            priority: patch
                .priority
                .map(|p| p.trim().to_string())
                .unwrap_or(current.priority),
            due_date: patch.due_date.unwrap_or(current.due_date),
            completed_date: if stamp_completion {
                Some(Utc::now())
            } else {
                current.completed_date
            },
            ..current
        };
        self.tasks.update(task.clone()).await.map_err(db_err)?;

        info!(status = %task.status, completed = stamp_completion, "Task updated");
        if status_changed {
            self.workload.refresh(task.employee_id).await;
        }
        Ok(task)
    }

    #[instrument(name = "workboard.service.add_comment", skip(self, actor, content), fields(actor_id = %actor.id, task_id = %task_id))]
    pub async fn add_comment(
        &self,
        actor: &Actor,
        task_id: Uuid,
        content: &str,
    ) -> Result<CommentDetails, DomainError> {
        let task = self
            .tasks
            .find(task_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::task_not_found(task_id))?;
        authorize_task_comment(actor, &task)?;

        let mut v = Violations::new();
        v.require("content", content);
        v.into_result()?;

        let comment = TaskComment {
            id: Uuid::new_v4(),
            task_id,
            user_id: actor.id,
            content: content.trim().to_string(),
            created_date: Utc::now(),
        };
        let details = self
            .tasks
            .insert_comment(comment)
            .await
            .map_err(db_err)?;
        info!(comment_id = %details.comment.id, "Comment added");
        Ok(details)
    }
}
