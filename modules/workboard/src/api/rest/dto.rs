use axum::extract::{FromRequest, FromRequestParts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use apikit::ProblemResponse;

use crate::contract::model::{
    AssignmentDetails, CommentDetails, EmployeeProfile, NewRegistration, NewTask, Project,
    ProjectAssignment, ProjectDetails, ProjectDraft, ProjectPriority, ProjectRole, ProjectStatus,
    ProjectSummary, Role, Task, TaskDetails, TaskPatch, TaskStatus, User, UserSummary,
    WorkloadStatus,
};
use crate::domain::service::DirectoryEntry;

/// JSON body extractor whose rejections render as problem documents.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ProblemResponse))]
pub struct JsonBody<T>(pub T);

/// Path parameters with problem-document rejections.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ProblemResponse))]
pub struct PathParam<T>(pub T);

/// Query string with problem-document rejections.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ProblemResponse))]
pub struct QueryParams<T>(pub T);

// ---------- auth ----------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReq {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_profile: Option<EmployeeProfileDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginDto {
    pub token: String,
    pub user: AccountDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyDto {
    pub user: AccountDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfileDto {
    pub user_id: Uuid,
    pub skills: String,
    pub total_years_of_experience: i32,
    pub current_role: String,
    pub responsibilities: String,
    pub workload_status: WorkloadStatus,
    pub number_of_active_projects: i32,
    pub number_of_tasks: i32,
    pub estimated_hours: i32,
    pub next_project_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

// ---------- shared ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

// ---------- projects ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub skills_required: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ProjectStatus,
    pub priority: ProjectPriority,
    pub criticality: String,
    pub number_of_people_needed: i32,
    pub team_lead_id: Uuid,
    #[serde(default)]
    pub team_lead: Option<UserSummaryDto>,
    #[serde(default)]
    pub assignments: Vec<AssignmentDto>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDto {
    pub id: Uuid,
    pub project_id: Uuid,
    pub employee_id: Uuid,
    pub role: ProjectRole,
    pub assignment_date: DateTime<Utc>,
    pub removal_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(default)]
    pub employee: Option<UserSummaryDto>,
}

/// Body of project create and update. `id` is only checked against the path
/// on update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReq {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub skills_required: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_project_status")]
    pub status: ProjectStatus,
    #[serde(default = "default_project_priority")]
    pub priority: ProjectPriority,
    #[serde(default)]
    pub criticality: String,
    #[serde(default)]
    pub number_of_people_needed: i32,
    #[serde(default)]
    pub team_lead_id: Option<Uuid>,
}

fn default_project_status() -> ProjectStatus {
    ProjectStatus::NotStarted
}

fn default_project_priority() -> ProjectPriority {
    ProjectPriority::Medium
}

/// Either a bare JSON string holding the employee id or an object that also
/// names the project role.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AssignEmployeeReq {
    Bare(Uuid),
    #[serde(rename_all = "camelCase")]
    Detailed {
        employee_id: Uuid,
        #[serde(default)]
        role: Option<ProjectRole>,
    },
}

impl AssignEmployeeReq {
    pub fn into_parts(self) -> (Uuid, ProjectRole) {
        match self {
            Self::Bare(id) => (id, ProjectRole::Developer),
            Self::Detailed { employee_id, role } => {
                (employee_id, role.unwrap_or(ProjectRole::Developer))
            }
        }
    }
}

// ---------- tasks ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: String,
    pub due_date: DateTime<Utc>,
    pub created_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub project_id: Uuid,
    pub employee_id: Uuid,
    #[serde(default)]
    pub project: Option<ProjectSummaryDto>,
    #[serde(default)]
    pub assignee: Option<UserSummaryDto>,
    #[serde(default)]
    pub comments: Vec<CommentDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryDto {
    pub id: Uuid,
    pub title: String,
    pub team_lead_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<UserSummaryDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskReq {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_task_status")]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: String,
    pub due_date: DateTime<Utc>,
    pub project_id: Uuid,
    pub employee_id: Uuid,
}

fn default_task_status() -> TaskStatus {
    TaskStatus::ToDo
}

/// Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskReq {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentReq {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub project_id: Option<Uuid>,
}

// ---------- employee directory ----------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDto {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub employee_profile: Option<EmployeeProfileDto>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEmployeesQuery {
    pub role: Option<Role>,
}

// Conversion implementations between REST DTOs and contract models

impl From<RegisterReq> for NewRegistration {
    fn from(req: RegisterReq) -> Self {
        Self {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            role: req.role.filter(|r| !r.trim().is_empty()),
        }
    }
}

impl AccountDto {
    pub fn new(user: User, profile: Option<EmployeeProfile>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            roles: user.roles,
            employee_profile: profile.map(EmployeeProfileDto::from),
        }
    }
}

impl From<EmployeeProfile> for EmployeeProfileDto {
    fn from(p: EmployeeProfile) -> Self {
        Self {
            user_id: p.user_id,
            skills: p.skills,
            total_years_of_experience: p.total_years_of_experience,
            current_role: p.current_role,
            responsibilities: p.responsibilities,
            workload_status: p.workload_status,
            number_of_active_projects: p.number_of_active_projects,
            number_of_tasks: p.number_of_tasks,
            estimated_hours: p.estimated_hours,
            next_project_deadline: p.next_project_deadline,
            created_at: p.created_at,
            modified_at: p.modified_at,
        }
    }
}

impl From<UserSummary> for UserSummaryDto {
    fn from(u: UserSummary) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
        }
    }
}

impl From<Project> for ProjectDto {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            requirements: p.requirements,
            skills_required: p.skills_required,
            start_date: p.start_date,
            end_date: p.end_date,
            status: p.status,
            priority: p.priority,
            criticality: p.criticality,
            number_of_people_needed: p.number_of_people_needed,
            team_lead_id: p.team_lead_id,
            team_lead: None,
            assignments: Vec::new(),
            created_at: p.created_at,
            modified_at: p.modified_at,
        }
    }
}

impl From<ProjectDetails> for ProjectDto {
    fn from(d: ProjectDetails) -> Self {
        Self {
            team_lead: d.team_lead.map(UserSummaryDto::from),
            assignments: d.assignments.into_iter().map(AssignmentDto::from).collect(),
            ..ProjectDto::from(d.project)
        }
    }
}

impl From<ProjectAssignment> for AssignmentDto {
    fn from(a: ProjectAssignment) -> Self {
        Self {
            id: a.id,
            project_id: a.project_id,
            employee_id: a.employee_id,
            role: a.role,
            assignment_date: a.assignment_date,
            removal_date: a.removal_date,
            is_active: a.is_active,
            employee: None,
        }
    }
}

impl From<AssignmentDetails> for AssignmentDto {
    fn from(d: AssignmentDetails) -> Self {
        Self {
            employee: d.employee.map(UserSummaryDto::from),
            ..AssignmentDto::from(d.assignment)
        }
    }
}

impl From<ProjectReq> for ProjectDraft {
    fn from(req: ProjectReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            requirements: req.requirements,
            skills_required: req.skills_required,
            start_date: req.start_date,
            end_date: req.end_date,
            status: req.status,
            priority: req.priority,
            criticality: req.criticality,
            number_of_people_needed: req.number_of_people_needed,
            team_lead_id: req.team_lead_id,
        }
    }
}

impl From<Task> for TaskDto {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status,
            priority: t.priority,
            due_date: t.due_date,
            created_date: t.created_date,
            completed_date: t.completed_date,
            project_id: t.project_id,
            employee_id: t.employee_id,
            project: None,
            assignee: None,
            comments: Vec::new(),
        }
    }
}

impl From<TaskDetails> for TaskDto {
    fn from(d: TaskDetails) -> Self {
        Self {
            project: d.project.map(ProjectSummaryDto::from),
            assignee: d.assignee.map(UserSummaryDto::from),
            comments: d.comments.into_iter().map(CommentDto::from).collect(),
            ..TaskDto::from(d.task)
        }
    }
}

impl From<ProjectSummary> for ProjectSummaryDto {
    fn from(p: ProjectSummary) -> Self {
        Self {
            id: p.id,
            title: p.title,
            team_lead_id: p.team_lead_id,
        }
    }
}

impl From<CommentDetails> for CommentDto {
    fn from(d: CommentDetails) -> Self {
        Self {
            id: d.comment.id,
            task_id: d.comment.task_id,
            user_id: d.comment.user_id,
            content: d.comment.content,
            created_date: d.comment.created_date,
            author: d.author.map(UserSummaryDto::from),
        }
    }
}

impl From<CreateTaskReq> for NewTask {
    fn from(req: CreateTaskReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            project_id: req.project_id,
            employee_id: req.employee_id,
        }
    }
}

impl From<UpdateTaskReq> for TaskPatch {
    fn from(req: UpdateTaskReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
        }
    }
}

impl From<DirectoryEntry> for EmployeeDto {
    fn from(e: DirectoryEntry) -> Self {
        Self {
            id: e.user.id,
            email: e.user.email,
            first_name: e.user.first_name,
            last_name: e.user.last_name,
            is_active: e.user.is_active,
            roles: e.user.roles,
            created_at: e.user.created_at,
            employee_profile: e.profile.map(EmployeeProfileDto::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assign_body_accepts_bare_string_or_object() {
        let id = Uuid::new_v4();

        let bare: AssignEmployeeReq = serde_json::from_value(json!(id.to_string())).unwrap();
        assert_eq!(bare.into_parts(), (id, ProjectRole::Developer));

        let detailed: AssignEmployeeReq =
            serde_json::from_value(json!({ "employeeId": id, "role": "Tester" })).unwrap();
        assert_eq!(detailed.into_parts(), (id, ProjectRole::Tester));

        assert!(serde_json::from_value::<AssignEmployeeReq>(json!("nope")).is_err());
    }

    #[test]
    fn register_blank_role_becomes_none() {
        let req: RegisterReq = serde_json::from_value(json!({
            "email": "a@x.com",
            "password": "P@ssw0rd1",
            "firstName": "A",
            "lastName": "B",
            "role": "  "
        }))
        .unwrap();
        assert_eq!(NewRegistration::from(req).role, None);
    }

    #[test]
    fn project_request_defaults() {
        let req: ProjectReq = serde_json::from_value(json!({
            "title": "Apollo",
            "startDate": "2025-06-01T00:00:00Z",
            "endDate": "2025-12-31T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(req.status, ProjectStatus::NotStarted);
        assert_eq!(req.priority, ProjectPriority::Medium);
        assert!(req.team_lead_id.is_none());
    }

    #[test]
    fn camel_case_on_the_wire() {
        let dto = UserSummaryDto {
            id: Uuid::nil(),
            email: "a@x.com".into(),
            first_name: "A".into(),
            last_name: "B".into(),
        };
        let v = serde_json::to_value(dto).unwrap();
        assert_eq!(v["firstName"], "A");
        assert!(v.get("first_name").is_none());
    }
}
