use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a string-backed enum with `as_str`, `Display` and `FromStr`.
/// Parsing is case-insensitive; the canonical spelling is the variant name.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

/// A string did not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

string_enum!(
    /// Organisational role carried as a token claim.
    Role { Manager, TeamLead, Employee }
);

string_enum!(
    /// Derived from the number of active project assignments.
    WorkloadStatus { Available, Moderate, High }
);

string_enum!(ProjectStatus {
    NotStarted,
    Active,
    OnHold,
    Completed,
    Cancelled
});

string_enum!(ProjectPriority { High, Medium, Low });

string_enum!(
    /// Role of an employee inside one project.
    ProjectRole {
        Developer,
        Tester,
        Designer,
        BusinessAnalyst,
        ProjectLead
    }
);

string_enum!(TaskStatus {
    ToDo,
    InProgress,
    Completed
});

impl Role {
    /// Lower value wins when an actor holds several roles.
    fn precedence(&self) -> u8 {
        match self {
            Role::Manager => 0,
            Role::TeamLead => 1,
            Role::Employee => 2,
        }
    }
}

impl WorkloadStatus {
    /// 0-1 active projects → Available, 2 → Moderate, 3+ → High.
    pub fn from_active_projects(count: u64) -> Self {
        match count {
            0 | 1 => WorkloadStatus::Available,
            2 => WorkloadStatus::Moderate,
            _ => WorkloadStatus::High,
        }
    }
}

/// Authenticated identity making a request, as resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
}

impl Actor {
    pub fn new(id: Uuid, email: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id,
            email: email.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Effective role: Manager > TeamLead > Employee. `None` for an actor
    /// without roles.
    pub fn primary_role(&self) -> Option<Role> {
        self.roles.iter().copied().min_by_key(Role::precedence)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Compact user reference embedded in project/task views.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeProfile {
    pub user_id: Uuid,
    pub skills: String,
    pub total_years_of_experience: i32,
    /// Descriptive label only; authorization uses token roles.
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

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Free-form; empty or unrecognized falls back to Employee.
    pub role: Option<String>,
}

/// Fully-formed account as persisted by registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user: User,
    pub password_hash: String,
    pub profile: EmployeeProfile,
}

/// Refreshed workload counters for one employee.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSnapshot {
    pub active_projects: u64,
    pub open_tasks: u64,
    pub next_project_deadline: Option<DateTime<Utc>>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
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
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Editable project fields, shared by create and full update.
#[derive(Debug, Clone)]
pub struct ProjectDraft {
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
    /// Defaults to the creating manager on create; unchanged on update when `None`.
    pub team_lead_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAssignment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub employee_id: Uuid,
    pub role: ProjectRole,
    pub assignment_date: DateTime<Utc>,
    pub removal_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDetails {
    pub assignment: ProjectAssignment,
    pub employee: Option<UserSummary>,
}

/// Project with its team lead and assignments resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetails {
    pub project: Project,
    pub team_lead: Option<UserSummary>,
    pub assignments: Vec<AssignmentDetails>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Free text, conventionally High/Medium/Low.
    pub priority: String,
    pub due_date: DateTime<Utc>,
    pub created_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub project_id: Uuid,
    pub employee_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: String,
    pub due_date: DateTime<Utc>,
    pub project_id: Uuid,
    pub employee_id: Uuid,
}

/// Task update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentDetails {
    pub comment: TaskComment,
    pub author: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub title: String,
    pub team_lead_id: Uuid,
}

/// Task with project, assignee and (on single reads) comments resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDetails {
    pub task: Task,
    pub project: Option<ProjectSummary>,
    pub assignee: Option<UserSummary>,
    pub comments: Vec<CommentDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("teamlead".parse::<Role>().unwrap(), Role::TeamLead);
        assert_eq!(" InProgress ".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!(
            "businessanalyst".parse::<ProjectRole>().unwrap(),
            ProjectRole::BusinessAnalyst
        );
        let err = "Boss".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "unknown Role 'Boss'");
    }

    #[test]
    fn primary_role_follows_precedence() {
        let id = Uuid::new_v4();
        let actor = Actor::new(id, "a@x.com", vec![Role::Employee, Role::Manager]);
        assert_eq!(actor.primary_role(), Some(Role::Manager));

        let actor = Actor::new(id, "a@x.com", vec![Role::Employee, Role::TeamLead]);
        assert_eq!(actor.primary_role(), Some(Role::TeamLead));

        assert_eq!(Actor::new(id, "a@x.com", vec![]).primary_role(), None);
    }

    #[test]
    fn workload_thresholds() {
        assert_eq!(WorkloadStatus::from_active_projects(0), WorkloadStatus::Available);
        assert_eq!(WorkloadStatus::from_active_projects(1), WorkloadStatus::Available);
        assert_eq!(WorkloadStatus::from_active_projects(2), WorkloadStatus::Moderate);
        assert_eq!(WorkloadStatus::from_active_projects(3), WorkloadStatus::High);
        assert_eq!(WorkloadStatus::from_active_projects(12), WorkloadStatus::High);
    }
}
