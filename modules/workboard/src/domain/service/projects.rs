use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    Actor, Project, ProjectAssignment, ProjectDetails, ProjectDraft, ProjectRole,
};
use crate::domain::access::{authorize_project_manage, authorize_project_read, project_list_scope};
use crate::domain::error::{DomainError, Violations};
use crate::domain::notify::project_assignment_email;
use crate::domain::ports::Notifier;
use crate::domain::repo::{ProjectsRepository, UsersRepository};
use crate::domain::service::{db_err, WorkloadTracker};

pub const TITLE_MAX_LEN: usize = 100;

/// Project CRUD and the employee assignment workflow.
#[derive(Clone)]
pub struct ProjectService {
    projects: Arc<dyn ProjectsRepository>,
    users: Arc<dyn UsersRepository>,
    workload: WorkloadTracker,
    notifier: Arc<dyn Notifier>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectsRepository>,
        users: Arc<dyn UsersRepository>,
        workload: WorkloadTracker,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            projects,
            users,
            workload,
            notifier,
        }
    }

    #[instrument(name = "workboard.service.list_projects", skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn list(&self, actor: &Actor) -> Result<Vec<ProjectDetails>, DomainError> {
        let scope = project_list_scope(actor)?;
        let projects = self.projects.list(scope).await.map_err(db_err)?;
        info!(count = projects.len(), "Listed projects");
        Ok(projects)
    }

    #[instrument(name = "workboard.service.get_project", skip(self, actor), fields(actor_id = %actor.id, project_id = %id))]
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<ProjectDetails, DomainError> {
        let details = self
            .projects
            .find_details(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::project_not_found(id))?;
        authorize_project_read(actor)?;
        Ok(details)
    }

    #[instrument(name = "workboard.service.create_project", skip(self, actor, draft), fields(actor_id = %actor.id, title = %draft.title))]
    pub async fn create(&self, actor: &Actor, draft: ProjectDraft) -> Result<Project, DomainError> {
        authorize_project_manage(actor)?;
        let team_lead_id = draft.team_lead_id.unwrap_or(actor.id);
        self.validate(&draft, team_lead_id).await?;

        let project = Project {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft.description,
            requirements: draft.requirements,
            skills_required: draft.skills_required,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: draft.status,
            priority: draft.priority,
            criticality: draft.criticality,
            number_of_people_needed: draft.number_of_people_needed,
            team_lead_id,
            created_at: Utc::now(),
            modified_at: None,
        };
        self.projects
            .insert(project.clone())
            .await
            .map_err(db_err)?;

        info!(project_id = %project.id, team_lead_id = %team_lead_id, "Project created");
        Ok(project)
    }

    /// Replaces every editable field. The team lead is kept when the draft
    /// does not name one.
    #[instrument(name = "workboard.service.update_project", skip(self, actor, draft), fields(actor_id = %actor.id, project_id = %id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        draft: ProjectDraft,
    ) -> Result<Project, DomainError> {
        authorize_project_manage(actor)?;
        let current = self
            .projects
            .find(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::project_not_found(id))?;
        let team_lead_id = draft.team_lead_id.unwrap_or(current.team_lead_id);
        self.validate(&draft, team_lead_id).await?;

        let project = Project {
            title: draft.title.trim().to_string(),
            description: draft.description,
            requirements: draft.requirements,
            skills_required: draft.skills_required,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: draft.status,
            priority: draft.priority,
            criticality: draft.criticality,
            number_of_people_needed: draft.number_of_people_needed,
            team_lead_id,
            modified_at: Some(Utc::now()),
            ..current
        };
        self.projects
            .update(project.clone())
            .await
            .map_err(db_err)?;

        info!("Project updated");
        Ok(project)
    }

    #[instrument(name = "workboard.service.delete_project", skip(self, actor), fields(actor_id = %actor.id, project_id = %id))]
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        authorize_project_manage(actor)?;
        let affected = self
            .projects
            .delete_cascade(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::project_not_found(id))?;
        info!(affected_employees = affected.len(), "Project deleted");

        for employee_id in affected {
            self.workload.refresh(employee_id).await;
        }
        Ok(())
    }

    /// Attach an employee to a project. The assignment is committed before the
    /// notification is queued; delivery problems never fail this call.
    #[instrument(
        name = "workboard.service.assign_employee",
        skip(self, actor),
        fields(actor_id = %actor.id, project_id = %project_id, employee_id = %employee_id)
    )]
    pub async fn assign_employee(
        &self,
        actor: &Actor,
        project_id: Uuid,
        employee_id: Uuid,
        role: ProjectRole,
    ) -> Result<ProjectAssignment, DomainError> {
        authorize_project_manage(actor)?;

        let project = self
            .projects
            .find(project_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::project_not_found(project_id))?;
        let employee = self
            .users
            .find_by_id(employee_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::employee_not_found(employee_id))?;
        if employee.email.trim().is_empty() {
            return Err(DomainError::EmployeeMissingEmail { id: employee_id });
        }

        let already = DomainError::AlreadyAssigned {
            project_id,
            employee_id,
        };
        if self
            .projects
            .has_active_assignment(project_id, employee_id)
            .await
            .map_err(db_err)?
        {
            warn!("Employee already assigned");
            return Err(already);
        }

        let now = Utc::now();
        let assignment = ProjectAssignment {
            id: Uuid::new_v4(),
            project_id,
            employee_id,
            role,
            assignment_date: now,
            removal_date: None,
            is_active: true,
            created_at: now,
        };
        let inserted = self
            .projects
            .insert_assignment(assignment.clone())
            .await
            .map_err(db_err)?;
        if !inserted {
            warn!("Concurrent duplicate assignment rejected");
            return Err(already);
        }
        info!(assignment_id = %assignment.id, role = %role, "Employee assigned");

        self.workload.refresh(employee_id).await;
        self.notifier
            .notify(project_assignment_email(&employee, &project));

        Ok(assignment)
    }

    async fn validate(&self, draft: &ProjectDraft, team_lead_id: Uuid) -> Result<(), DomainError> {
        let mut v = Violations::new();
        v.require("title", &draft.title);
        v.max_len("title", draft.title.trim(), TITLE_MAX_LEN);
        v.require("description", &draft.description);
        v.require("requirements", &draft.requirements);
        v.require("skillsRequired", &draft.skills_required);
        v.require("criticality", &draft.criticality);
        if draft.end_date < draft.start_date {
            v.add("endDate", "End date must not be before the start date.");
        }
        if draft.number_of_people_needed < 0 {
            v.add("numberOfPeopleNeeded", "Number of people needed cannot be negative.");
        }
        let lead_exists = self
            .users
            .find_by_id(team_lead_id)
            .await
            .map_err(db_err)?
            .is_some();
        if !lead_exists {
            v.add("teamLeadId", format!("Team lead '{team_lead_id}' does not exist."));
        }
        v.into_result()
    }
}
