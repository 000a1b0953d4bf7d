use anyhow::Context;

use crate::contract::model::{
    EmployeeProfile, Project, ProjectAssignment, Role, Task, TaskComment, User, UserSummary,
};
use crate::infra::storage::entity::{
    employee_profiles, project_assignments, projects, task_comments, tasks, users,
};

/// Convert a user row plus its role names into a contract model.
/// Role names the application does not know are skipped.
pub fn user_to_contract(entity: users::Model, role_names: &[String]) -> User {
    let mut roles: Vec<Role> = role_names.iter().filter_map(|r| r.parse().ok()).collect();
    roles.sort_by_key(|r| Role::ALL.iter().position(|x| x == r));
    User {
        id: entity.id,
        email: entity.email,
        first_name: entity.first_name,
        last_name: entity.last_name,
        is_active: entity.is_active,
        roles,
        created_at: entity.created_at,
    }
}

pub fn user_summary(entity: &users::Model) -> UserSummary {
    UserSummary {
        id: entity.id,
        email: entity.email.clone(),
        first_name: entity.first_name.clone(),
        last_name: entity.last_name.clone(),
    }
}

pub fn profile_to_contract(entity: employee_profiles::Model) -> anyhow::Result<EmployeeProfile> {
    Ok(EmployeeProfile {
        user_id: entity.user_id,
        skills: entity.skills,
        total_years_of_experience: entity.total_years_of_experience,
        current_role: entity.current_role,
        responsibilities: entity.responsibilities,
        workload_status: entity
            .workload_status
            .parse()
            .with_context(|| format!("profile {}", entity.user_id))?,
        number_of_active_projects: entity.number_of_active_projects,
        number_of_tasks: entity.number_of_tasks,
        estimated_hours: entity.estimated_hours,
        next_project_deadline: entity.next_project_deadline,
        created_at: entity.created_at,
        modified_at: entity.modified_at,
    })
}

pub fn profile_to_entity(profile: &EmployeeProfile) -> employee_profiles::Model {
    employee_profiles::Model {
        user_id: profile.user_id,
        skills: profile.skills.clone(),
        total_years_of_experience: profile.total_years_of_experience,
        current_role: profile.current_role.clone(),
        responsibilities: profile.responsibilities.clone(),
        workload_status: profile.workload_status.as_str().to_string(),
        number_of_active_projects: profile.number_of_active_projects,
        number_of_tasks: profile.number_of_tasks,
        estimated_hours: profile.estimated_hours,
        next_project_deadline: profile.next_project_deadline,
        created_at: profile.created_at,
        modified_at: profile.modified_at,
    }
}

pub fn project_to_contract(entity: projects::Model) -> anyhow::Result<Project> {
    let id = entity.id;
    Ok(Project {
        id,
        title: entity.title,
        description: entity.description,
        requirements: entity.requirements,
        skills_required: entity.skills_required,
        start_date: entity.start_date,
        end_date: entity.end_date,
        status: entity
            .status
            .parse()
            .with_context(|| format!("project {id}"))?,
        priority: entity
            .priority
            .parse()
            .with_context(|| format!("project {id}"))?,
        criticality: entity.criticality,
        number_of_people_needed: entity.number_of_people_needed,
        team_lead_id: entity.team_lead_id,
        created_at: entity.created_at,
        modified_at: entity.modified_at,
    })
}

pub fn project_to_entity(project: &Project) -> projects::Model {
    projects::Model {
        id: project.id,
        title: project.title.clone(),
        description: project.description.clone(),
        requirements: project.requirements.clone(),
        skills_required: project.skills_required.clone(),
        start_date: project.start_date,
        end_date: project.end_date,
        status: project.status.as_str().to_string(),
        priority: project.priority.as_str().to_string(),
        criticality: project.criticality.clone(),
        number_of_people_needed: project.number_of_people_needed,
        team_lead_id: project.team_lead_id,
        created_at: project.created_at,
        modified_at: project.modified_at,
    }
}

pub fn assignment_to_contract(
    entity: project_assignments::Model,
) -> anyhow::Result<ProjectAssignment> {
    Ok(ProjectAssignment {
        id: entity.id,
        project_id: entity.project_id,
        employee_id: entity.employee_id,
        role: entity
            .role
            .parse()
            .with_context(|| format!("assignment {}", entity.id))?,
        assignment_date: entity.assignment_date,
        removal_date: entity.removal_date,
        is_active: entity.is_active,
        created_at: entity.created_at,
    })
}

pub fn assignment_to_entity(assignment: &ProjectAssignment) -> project_assignments::Model {
    project_assignments::Model {
        id: assignment.id,
        project_id: assignment.project_id,
        employee_id: assignment.employee_id,
        role: assignment.role.as_str().to_string(),
        assignment_date: assignment.assignment_date,
        removal_date: assignment.removal_date,
        is_active: assignment.is_active,
        created_at: assignment.created_at,
    }
}

pub fn task_to_contract(entity: tasks::Model) -> anyhow::Result<Task> {
    Ok(Task {
        id: entity.id,
        title: entity.title,
        description: entity.description,
        status: entity
            .status
            .parse()
            .with_context(|| format!("task {}", entity.id))?,
        priority: entity.priority,
        due_date: entity.due_date,
        created_date: entity.created_date,
        completed_date: entity.completed_date,
        project_id: entity.project_id,
        employee_id: entity.employee_id,
    })
}

pub fn task_to_entity(task: &Task) -> tasks::Model {
    tasks::Model {
        id: task.id,
        title: task.title.clone(),
        description: task.description.clone(),
        status: task.status.as_str().to_string(),
        priority: task.priority.clone(),
        due_date: task.due_date,
        created_date: task.created_date,
        completed_date: task.completed_date,
        project_id: task.project_id,
        employee_id: task.employee_id,
    }
}

pub fn comment_to_contract(entity: task_comments::Model) -> TaskComment {
    TaskComment {
        id: entity.id,
        task_id: entity.task_id,
        user_id: entity.user_id,
        content: entity.content,
        created_date: entity.created_date,
    }
}

pub fn comment_to_entity(comment: &TaskComment) -> task_comments::Model {
    task_comments::Model {
        id: comment.id,
        task_id: comment.task_id,
        user_id: comment.user_id,
        content: comment.content.clone(),
        created_date: comment.created_date,
    }
}
