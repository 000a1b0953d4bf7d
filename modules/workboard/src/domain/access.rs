//! Role-scoped access rules for projects and tasks.
//!
//! Every function here is pure: callers load the facts (task, owning team
//! lead) and ask for a decision. Existence checks belong to the caller and
//! run first, so a missing record is reported as not-found and an existing
//! record the actor may not touch is reported as forbidden.

use uuid::Uuid;

use crate::contract::model::{Actor, Role, Task, TaskPatch};
use crate::domain::error::{DomainError, Violations};

/// Which projects an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    All,
    LedBy(Uuid),
}

/// Which tasks an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    InProjectsLedBy(Uuid),
    AssignedTo(Uuid),
}

/// What an authorized task update may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEditRights {
    /// Team lead of the owning project: every field.
    Full,
    /// Assignee: status and description only.
    StatusAndDescription,
}

pub fn project_list_scope(actor: &Actor) -> Result<ProjectScope, DomainError> {
    match actor.primary_role() {
        Some(Role::Manager) => Ok(ProjectScope::All),
        Some(Role::TeamLead) => Ok(ProjectScope::LedBy(actor.id)),
        _ => Err(DomainError::forbidden("only managers and team leads can list projects")),
    }
}

/// Single project reads are not filtered by ownership.
pub fn authorize_project_read(actor: &Actor) -> Result<(), DomainError> {
    match actor.primary_role() {
        Some(Role::Manager | Role::TeamLead) => Ok(()),
        _ => Err(DomainError::forbidden("only managers and team leads can view projects")),
    }
}

/// Create, update, delete and assign-employee.
pub fn authorize_project_manage(actor: &Actor) -> Result<(), DomainError> {
    if actor.primary_role() == Some(Role::Manager) {
        Ok(())
    } else {
        Err(DomainError::forbidden("only managers can manage projects"))
    }
}

/// Actors without a recognised role see their own assignments.
pub fn task_list_scope(actor: &Actor) -> TaskScope {
    match actor.primary_role() {
        Some(Role::Manager) => TaskScope::All,
        Some(Role::TeamLead) => TaskScope::InProjectsLedBy(actor.id),
        _ => TaskScope::AssignedTo(actor.id),
    }
}

/// Any authenticated actor may read a single task.
pub fn authorize_task_read(_actor: &Actor) -> Result<(), DomainError> {
    Ok(())
}

/// `project_team_lead` is `None` when the target project does not exist.
/// Missing and foreign projects produce the same error.
pub fn authorize_task_create(
    actor: &Actor,
    project_id: Uuid,
    project_team_lead: Option<Uuid>,
) -> Result<(), DomainError> {
    if actor.primary_role() != Some(Role::TeamLead) {
        return Err(DomainError::forbidden("only team leads can create tasks"));
    }
    match project_team_lead {
        Some(lead) if lead == actor.id => Ok(()),
        _ => Err(DomainError::ProjectNotFoundOrUnauthorized { id: project_id }),
    }
}

/// `project_team_lead` is the owner of the task's project, looked up
/// explicitly by the caller.
pub fn authorize_task_update(
    actor: &Actor,
    task: &Task,
    project_team_lead: Option<Uuid>,
) -> Result<TaskEditRights, DomainError> {
    match actor.primary_role() {
        Some(Role::Manager) => Err(DomainError::forbidden("managers cannot update tasks")),
        Some(Role::TeamLead) if project_team_lead == Some(actor.id) => Ok(TaskEditRights::Full),
        Some(Role::TeamLead) => Err(DomainError::forbidden(
            "task belongs to a project led by someone else",
        )),
        _ if task.employee_id == actor.id => Ok(TaskEditRights::StatusAndDescription),
        _ => Err(DomainError::forbidden("task is assigned to someone else")),
    }
}

/// Managers and team leads may comment on any task; others only on their own.
pub fn authorize_task_comment(actor: &Actor, task: &Task) -> Result<(), DomainError> {
    if actor.has_role(Role::Manager) || actor.has_role(Role::TeamLead) || task.employee_id == actor.id
    {
        Ok(())
    } else {
        Err(DomainError::forbidden("only the assignee can comment on this task"))
    }
}

/// Reject a patch that touches fields outside the granted rights.
/// Fields repeating the stored value are allowed.
pub fn check_task_patch(
    rights: TaskEditRights,
    current: &Task,
    patch: &TaskPatch,
) -> Result<(), DomainError> {
    if rights == TaskEditRights::Full {
        return Ok(());
    }
    let mut violations = Violations::new();
    let locked = "Only status and description can be changed by the assignee.";
    if patch.title.as_ref().is_some_and(|t| *t != current.title) {
        violations.add("title", locked);
    }
    if patch.priority.as_ref().is_some_and(|p| *p != current.priority) {
        violations.add("priority", locked);
    }
    if patch.due_date.is_some_and(|d| d != current.due_date) {
        violations.add("dueDate", locked);
    }
    violations.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::TaskStatus;
    use chrono::{Duration, Utc};

    fn actor(role: Role) -> Actor {
        Actor::new(Uuid::new_v4(), "someone@x.com", vec![role])
    }

    fn task_for(employee_id: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: "Write docs".into(),
            description: "All of them".into(),
            status: TaskStatus::ToDo,
            priority: "High".into(),
            due_date: now + Duration::days(3),
            created_date: now,
            completed_date: None,
            project_id: Uuid::new_v4(),
            employee_id,
        }
    }

    fn is_forbidden<T: std::fmt::Debug>(r: Result<T, DomainError>) -> bool {
        matches!(r, Err(DomainError::Forbidden { .. }))
    }

    #[test]
    fn project_rules_by_role() {
        let manager = actor(Role::Manager);
        let lead = actor(Role::TeamLead);
        let employee = actor(Role::Employee);

        assert_eq!(project_list_scope(&manager).unwrap(), ProjectScope::All);
        assert_eq!(project_list_scope(&lead).unwrap(), ProjectScope::LedBy(lead.id));
        assert!(is_forbidden(project_list_scope(&employee)));

        assert!(authorize_project_read(&manager).is_ok());
        assert!(authorize_project_read(&lead).is_ok());
        assert!(is_forbidden(authorize_project_read(&employee)));

        assert!(authorize_project_manage(&manager).is_ok());
        assert!(is_forbidden(authorize_project_manage(&lead)));
        assert!(is_forbidden(authorize_project_manage(&employee)));
    }

    #[test]
    fn task_list_scope_by_role() {
        let manager = actor(Role::Manager);
        let lead = actor(Role::TeamLead);
        let employee = actor(Role::Employee);
        let nobody = Actor::new(Uuid::new_v4(), "n@x.com", vec![]);

        assert_eq!(task_list_scope(&manager), TaskScope::All);
        assert_eq!(task_list_scope(&lead), TaskScope::InProjectsLedBy(lead.id));
        assert_eq!(task_list_scope(&employee), TaskScope::AssignedTo(employee.id));
        assert_eq!(task_list_scope(&nobody), TaskScope::AssignedTo(nobody.id));
    }

    #[test]
    fn task_create_requires_owning_team_lead() {
        let lead = actor(Role::TeamLead);
        let project = Uuid::new_v4();

        assert!(authorize_task_create(&lead, project, Some(lead.id)).is_ok());
        assert!(matches!(
            authorize_task_create(&lead, project, Some(Uuid::new_v4())),
            Err(DomainError::ProjectNotFoundOrUnauthorized { .. })
        ));
        assert!(matches!(
            authorize_task_create(&lead, project, None),
            Err(DomainError::ProjectNotFoundOrUnauthorized { .. })
        ));
        assert!(is_forbidden(authorize_task_create(
            &actor(Role::Manager),
            project,
            None
        )));
        assert!(is_forbidden(authorize_task_create(
            &actor(Role::Employee),
            project,
            None
        )));
    }

    #[test]
    fn task_update_rules() {
        let lead = actor(Role::TeamLead);
        let employee = actor(Role::Employee);
        let task = task_for(employee.id);

        assert_eq!(
            authorize_task_update(&lead, &task, Some(lead.id)).unwrap(),
            TaskEditRights::Full
        );
        assert!(is_forbidden(authorize_task_update(
            &lead,
            &task,
            Some(Uuid::new_v4())
        )));
        assert_eq!(
            authorize_task_update(&employee, &task, Some(lead.id)).unwrap(),
            TaskEditRights::StatusAndDescription
        );
        assert!(is_forbidden(authorize_task_update(
            &actor(Role::Employee),
            &task,
            Some(lead.id)
        )));
        assert!(is_forbidden(authorize_task_update(
            &actor(Role::Manager),
            &task,
            Some(lead.id)
        )));
    }

    #[test]
    fn comment_rules() {
        let employee = actor(Role::Employee);
        let task = task_for(employee.id);

        assert!(authorize_task_comment(&actor(Role::Manager), &task).is_ok());
        assert!(authorize_task_comment(&actor(Role::TeamLead), &task).is_ok());
        assert!(authorize_task_comment(&employee, &task).is_ok());
        assert!(is_forbidden(authorize_task_comment(
            &actor(Role::Employee),
            &task
        )));
    }

    #[test]
    fn assignee_patch_is_limited_to_status_and_description() {
        let task = task_for(Uuid::new_v4());

        let ok = TaskPatch {
            status: Some(TaskStatus::Completed),
            description: Some("done".into()),
            title: Some(task.title.clone()),
            ..Default::default()
        };
        assert!(check_task_patch(TaskEditRights::StatusAndDescription, &task, &ok).is_ok());

        let too_much = TaskPatch {
            title: Some("Renamed".into()),
            priority: Some("Low".into()),
            ..Default::default()
        };
        match check_task_patch(TaskEditRights::StatusAndDescription, &task, &too_much) {
            Err(DomainError::Validation { violations }) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "priority"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(check_task_patch(TaskEditRights::Full, &task, &too_much).is_ok());
    }
}
