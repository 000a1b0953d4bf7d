mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use workboard::contract::model::{
    EmployeeProfile, NewAccount, Project, ProjectAssignment, ProjectPriority, ProjectRole,
    ProjectStatus, Role, Task, TaskStatus, User, WorkloadStatus,
};
use workboard::domain::access::{ProjectScope, TaskScope};
use workboard::domain::repo::{ProjectsRepository, TasksRepository, UsersRepository};
use workboard::domain::service::WorkloadTracker;
use workboard::infra::storage::SeaOrmRepository;

async fn repo() -> Arc<SeaOrmRepository> {
    Arc::new(SeaOrmRepository::new(common::create_test_db().await))
}

fn account(email: &str, role: Role) -> NewAccount {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: "Test".into(),
        last_name: role.to_string(),
        is_active: true,
        roles: vec![role],
        created_at: now,
    };
    let profile = EmployeeProfile {
        user_id: user.id,
        skills: String::new(),
        total_years_of_experience: 0,
        current_role: role.to_string(),
        responsibilities: String::new(),
        workload_status: WorkloadStatus::Available,
        number_of_active_projects: 0,
        number_of_tasks: 0,
        estimated_hours: 0,
        next_project_deadline: None,
        created_at: now,
        modified_at: None,
    };
    NewAccount {
        user,
        password_hash: "hash".into(),
        profile,
    }
}

async fn user(repo: &SeaOrmRepository, email: &str, role: Role) -> User {
    let account = account(email, role);
    let user = account.user.clone();
    assert!(repo.insert_account(account).await.unwrap());
    user
}

async fn project(repo: &SeaOrmRepository, lead: Uuid, end_in_days: i64) -> Project {
    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        title: format!("Project ending in {end_in_days}d"),
        description: "d".into(),
        requirements: "r".into(),
        skills_required: "s".into(),
        start_date: now - Duration::days(30),
        end_date: now + Duration::days(end_in_days),
        status: ProjectStatus::Active,
        priority: ProjectPriority::Medium,
        criticality: "Normal".into(),
        number_of_people_needed: 1,
        team_lead_id: lead,
        created_at: now,
        modified_at: None,
    };
    ProjectsRepository::insert(repo, project.clone()).await.unwrap();
    project
}

fn assignment(project_id: Uuid, employee_id: Uuid, is_active: bool) -> ProjectAssignment {
    let now = Utc::now();
    ProjectAssignment {
        id: Uuid::new_v4(),
        project_id,
        employee_id,
        role: ProjectRole::Developer,
        assignment_date: now,
        removal_date: (!is_active).then_some(now),
        is_active,
        created_at: now,
    }
}

fn task(project_id: Uuid, employee_id: Uuid, status: TaskStatus) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        title: "t".into(),
        description: "d".into(),
        status,
        priority: "High".into(),
        due_date: now + Duration::days(3),
        created_date: now,
        completed_date: None,
        project_id,
        employee_id,
    }
}

#[tokio::test]
async fn test_active_pair_is_unique_but_history_is_kept() {
    let repo = repo().await;
    let lead = user(&repo, "lead@example.com", Role::TeamLead).await;
    let emp = user(&repo, "emp@example.com", Role::Employee).await;
    let p = project(&repo, lead.id, 10).await;

    assert!(repo.insert_assignment(assignment(p.id, emp.id, false)).await.unwrap());
    assert!(repo.insert_assignment(assignment(p.id, emp.id, true)).await.unwrap());
    assert!(!repo.insert_assignment(assignment(p.id, emp.id, true)).await.unwrap());

    assert!(repo.has_active_assignment(p.id, emp.id).await.unwrap());
    let details = ProjectsRepository::find_details(&*repo, p.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(details.assignments.len(), 2);
    assert_eq!(details.team_lead.unwrap().email, "lead@example.com");
}

#[tokio::test]
async fn test_project_and_task_scopes() {
    let repo = repo().await;
    let lead_a = user(&repo, "a@example.com", Role::TeamLead).await;
    let lead_b = user(&repo, "b@example.com", Role::TeamLead).await;
    let emp = user(&repo, "emp@example.com", Role::Employee).await;
    let pa = project(&repo, lead_a.id, 10).await;
    let pb = project(&repo, lead_b.id, 20).await;

    TasksRepository::insert(&*repo, task(pa.id, emp.id, TaskStatus::ToDo)).await.unwrap();
    TasksRepository::insert(&*repo, task(pb.id, lead_a.id, TaskStatus::ToDo)).await.unwrap();

    let led = ProjectsRepository::list(&*repo, ProjectScope::LedBy(lead_a.id)).await.unwrap();
    assert_eq!(led.len(), 1);
    assert_eq!(led[0].project.id, pa.id);
    assert_eq!(ProjectsRepository::list(&*repo, ProjectScope::All).await.unwrap().len(), 2);

    let in_led = TasksRepository::list(&*repo, TaskScope::InProjectsLedBy(lead_a.id), None)
        .await
        .unwrap();
    assert_eq!(in_led.len(), 1);
    assert_eq!(in_led[0].task.project_id, pa.id);

    let mine = TasksRepository::list(&*repo, TaskScope::AssignedTo(lead_a.id), None)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].task.project_id, pb.id);

    let filtered = TasksRepository::list(&*repo, TaskScope::All, Some(pb.id)).await.unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn test_workload_refresh_counts_open_work() {
    let repo = repo().await;
    let lead = user(&repo, "lead@example.com", Role::TeamLead).await;
    let emp = user(&repo, "emp@example.com", Role::Employee).await;
    let near = project(&repo, lead.id, 5).await;
    let far = project(&repo, lead.id, 50).await;
    let past = project(&repo, lead.id, -5).await;
    for p in [&near, &far, &past] {
        assert!(repo.insert_assignment(assignment(p.id, emp.id, true)).await.unwrap());
    }
    TasksRepository::insert(&*repo, task(near.id, emp.id, TaskStatus::InProgress)).await.unwrap();
    TasksRepository::insert(&*repo, task(near.id, emp.id, TaskStatus::Completed)).await.unwrap();

    let tracker = WorkloadTracker::new(repo.clone(), repo.clone(), repo.clone());
    let snapshot = tracker.snapshot(emp.id).await.unwrap();
    assert_eq!(snapshot.active_projects, 3);
    assert_eq!(snapshot.open_tasks, 1);
    // Overdue projects still count as the earliest deadline.
    let stored = ProjectsRepository::find(&*repo, past.id).await.unwrap().unwrap();
    assert_eq!(snapshot.next_project_deadline, Some(stored.end_date));

    tracker.refresh(emp.id).await;
    let profile = repo.find_profile(emp.id).await.unwrap().unwrap();
    assert_eq!(profile.workload_status, WorkloadStatus::High);
    assert_eq!(profile.number_of_active_projects, 3);
    assert_eq!(profile.number_of_tasks, 1);
    assert!(profile.modified_at.is_some());
}

#[tokio::test]
async fn test_delete_cascade_reports_affected_employees() {
    let repo = repo().await;
    let lead = user(&repo, "lead@example.com", Role::TeamLead).await;
    let assigned = user(&repo, "assigned@example.com", Role::Employee).await;
    let tasked = user(&repo, "tasked@example.com", Role::Employee).await;
    let p = project(&repo, lead.id, 10).await;
    assert!(repo.insert_assignment(assignment(p.id, assigned.id, true)).await.unwrap());
    TasksRepository::insert(&*repo, task(p.id, assigned.id, TaskStatus::ToDo)).await.unwrap();
    TasksRepository::insert(&*repo, task(p.id, tasked.id, TaskStatus::ToDo)).await.unwrap();

    let mut affected = repo.delete_cascade(p.id).await.unwrap().unwrap();
    affected.sort();
    let mut expected = vec![assigned.id, tasked.id];
    expected.sort();
    assert_eq!(affected, expected);

    assert!(ProjectsRepository::find(&*repo, p.id).await.unwrap().is_none());
    assert_eq!(repo.count_open_for(tasked.id).await.unwrap(), 0);
    assert!(repo.delete_cascade(p.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_accounts_by_normalized_email_and_role() {
    let repo = repo().await;
    let emp = user(&repo, "Mixed.Case@Example.com", Role::Employee).await;
    user(&repo, "lead@example.com", Role::TeamLead).await;

    assert!(repo.email_exists("mixed.case@example.com").await.unwrap());
    let creds = repo.find_credentials(" MIXED.CASE@example.com ").await.unwrap().unwrap();
    assert_eq!(creds.user.id, emp.id);
    assert_eq!(creds.user.roles, vec![Role::Employee]);

    let employees = repo.list_active(Some(Role::Employee)).await.unwrap();
    assert_eq!(employees.len(), 1);

    assert!(repo.set_active(emp.id, false).await.unwrap());
    assert!(!repo.set_active(Uuid::new_v4(), false).await.unwrap());
    assert!(repo.list_active(Some(Role::Employee)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_normalized_email_is_rejected_without_partial_rows() {
    let repo = repo().await;
    user(&repo, "dup@example.com", Role::Employee).await;

    let second = account("DUP@Example.com", Role::Manager);
    let second_id = second.user.id;
    assert!(!repo.insert_account(second).await.unwrap());

    assert!(repo.find_by_id(second_id).await.unwrap().is_none());
    assert!(repo.find_profile(second_id).await.unwrap().is_none());
    assert!(repo.list_active(Some(Role::Manager)).await.unwrap().is_empty());
}
