//! SeaORM-backed implementation of the workboard repositories.
//!
//! Multi-row writes (account creation, project deletion) run inside a single
//! transaction and only touch the transaction handle until commit.

use std::collections::{BTreeSet, HashMap};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
    TransactionTrait,
};
use uuid::Uuid;

use crate::contract::model::{
    AssignmentDetails, CommentDetails, EmployeeProfile, NewAccount, Project, ProjectAssignment,
    ProjectDetails, ProjectSummary, Role, Task, TaskComment, TaskDetails, TaskStatus, User,
    UserSummary, WorkloadSnapshot, WorkloadStatus,
};
use crate::domain::access::{ProjectScope, TaskScope};
use crate::domain::repo::{Credentials, ProjectsRepository, TasksRepository, UsersRepository};
use crate::infra::storage::entity::{
    employee_profiles, project_assignments, projects, task_comments, tasks, user_roles, users,
};
use crate::infra::storage::mapper;

#[derive(Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn user_with_roles(&self, row: users::Model) -> anyhow::Result<User> {
        let mut roles = roles_by_user(&self.db, &[row.id]).await?;
        let names = roles.remove(&row.id).unwrap_or_default();
        Ok(mapper::user_to_contract(row, &names))
    }
}

async fn roles_by_user<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, Vec<String>>> {
    let mut map: HashMap<Uuid, Vec<String>> = HashMap::new();
    if ids.is_empty() {
        return Ok(map);
    }
    let rows = user_roles::Entity::find()
        .filter(user_roles::Column::UserId.is_in(ids.iter().copied()))
        .all(conn)
        .await
        .context("load user roles")?;
    for row in rows {
        map.entry(row.user_id).or_default().push(row.role);
    }
    Ok(map)
}

async fn summaries<C: ConnectionTrait>(
    conn: &C,
    ids: Vec<Uuid>,
) -> anyhow::Result<HashMap<Uuid, UserSummary>> {
    let mut ids = ids;
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = users::Entity::find()
        .filter(users::Column::Id.is_in(ids))
        .all(conn)
        .await
        .context("load user summaries")?;
    Ok(rows
        .iter()
        .map(|u| (u.id, mapper::user_summary(u)))
        .collect())
}

async fn project_details<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<projects::Model>,
) -> anyhow::Result<Vec<ProjectDetails>> {
    let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
    let assignment_rows = if ids.is_empty() {
        Vec::new()
    } else {
        project_assignments::Entity::find()
            .filter(project_assignments::Column::ProjectId.is_in(ids))
            .order_by_asc(project_assignments::Column::AssignmentDate)
            .all(conn)
            .await
            .context("load project assignments")?
    };

    let people = summaries(
        conn,
        rows.iter()
            .map(|p| p.team_lead_id)
            .chain(assignment_rows.iter().map(|a| a.employee_id))
            .collect(),
    )
    .await?;

    let mut by_project: HashMap<Uuid, Vec<AssignmentDetails>> = HashMap::new();
    for row in assignment_rows {
        let employee = people.get(&row.employee_id).cloned();
        by_project
            .entry(row.project_id)
            .or_default()
            .push(AssignmentDetails {
                assignment: mapper::assignment_to_contract(row)?,
                employee,
            });
    }

    rows.into_iter()
        .map(|row| {
            let team_lead = people.get(&row.team_lead_id).cloned();
            let assignments = by_project.remove(&row.id).unwrap_or_default();
            Ok(ProjectDetails {
                project: mapper::project_to_contract(row)?,
                team_lead,
                assignments,
            })
        })
        .collect()
}

async fn task_details<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<tasks::Model>,
) -> anyhow::Result<Vec<TaskDetails>> {
    let mut project_ids: Vec<Uuid> = rows.iter().map(|t| t.project_id).collect();
    project_ids.sort_unstable();
    project_ids.dedup();
    let projects: HashMap<Uuid, ProjectSummary> = if project_ids.is_empty() {
        HashMap::new()
    } else {
        projects::Entity::find()
            .filter(projects::Column::Id.is_in(project_ids))
            .all(conn)
            .await
            .context("load task projects")?
            .into_iter()
            .map(|p| {
                (
                    p.id,
                    ProjectSummary {
                        id: p.id,
                        title: p.title,
                        team_lead_id: p.team_lead_id,
                    },
                )
            })
            .collect()
    };
    let people = summaries(conn, rows.iter().map(|t| t.employee_id).collect()).await?;

    rows.into_iter()
        .map(|row| {
            let project = projects.get(&row.project_id).cloned();
            let assignee = people.get(&row.employee_id).cloned();
            Ok(TaskDetails {
                task: mapper::task_to_contract(row)?,
                project,
                assignee,
                comments: Vec::new(),
            })
        })
        .collect()
}

#[async_trait]
impl UsersRepository for SeaOrmRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        match row {
            Some(row) => Ok(Some(self.user_with_roles(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_credentials(&self, email: &str) -> anyhow::Result<Option<Credentials>> {
        let row = users::Entity::find()
            .filter(users::Column::NormalizedEmail.eq(users::normalize_email(email)))
            .one(&self.db)
            .await
            .context("find user by email")?;
        let Some(row) = row else {
            return Ok(None);
        };
        let password_hash = row.password_hash.clone();
        let user = self.user_with_roles(row).await?;
        Ok(Some(Credentials {
            user,
            password_hash,
        }))
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::NormalizedEmail.eq(users::normalize_email(email)))
            .count(&self.db)
            .await
            .context("check email uniqueness")?;
        Ok(count > 0)
    }

    async fn insert_account(&self, account: NewAccount) -> anyhow::Result<bool> {
        let NewAccount {
            user,
            password_hash,
            profile,
        } = account;

        let txn = self.db.begin().await.context("begin account insert")?;

        let row = users::Model {
            id: user.id,
            email: user.email.clone(),
            normalized_email: users::normalize_email(&user.email),
            password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            created_at: user.created_at,
        };
        match users::Entity::insert(row.into_active_model().reset_all())
            .exec_without_returning(&txn)
            .await
        {
            Ok(_) => {}
            // Dropping the transaction rolls it back.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Ok(false)
            }
            Err(e) => return Err(e).context("insert user"),
        }

        for role in &user.roles {
            let membership = user_roles::Model {
                user_id: user.id,
                role: role.as_str().to_string(),
            };
            user_roles::Entity::insert(membership.into_active_model().reset_all())
                .exec_without_returning(&txn)
                .await
                .with_context(|| format!("insert role membership {role}"))?;
        }

        employee_profiles::Entity::insert(
            mapper::profile_to_entity(&profile)
                .into_active_model()
                .reset_all(),
        )
        .exec_without_returning(&txn)
        .await
        .context("insert employee profile")?;

        txn.commit().await.context("commit account insert")?;
        Ok(true)
    }

    async fn find_profile(&self, user_id: Uuid) -> anyhow::Result<Option<EmployeeProfile>> {
        employee_profiles::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .context("find employee profile")?
            .map(mapper::profile_to_contract)
            .transpose()
    }

    async fn list_active(&self, role: Option<Role>) -> anyhow::Result<Vec<User>> {
        let mut query = users::Entity::find().filter(users::Column::IsActive.eq(true));
        if let Some(role) = role {
            query = query.filter(
                users::Column::Id.in_subquery(
                    Query::select()
                        .column(user_roles::Column::UserId)
                        .from(user_roles::Entity)
                        .and_where(user_roles::Column::Role.eq(role.as_str()))
                        .to_owned(),
                ),
            );
        }
        let rows = query
            .order_by_asc(users::Column::LastName)
            .order_by_asc(users::Column::FirstName)
            .all(&self.db)
            .await
            .context("list active users")?;

        let ids: Vec<Uuid> = rows.iter().map(|u| u.id).collect();
        let mut roles = roles_by_user(&self.db, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let names = roles.remove(&row.id).unwrap_or_default();
                mapper::user_to_contract(row, &names)
            })
            .collect())
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::IsActive, Expr::value(active))
            .filter(users::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("update user active flag")?;
        Ok(result.rows_affected > 0)
    }

    async fn save_workload(
        &self,
        user_id: Uuid,
        snapshot: &WorkloadSnapshot,
    ) -> anyhow::Result<()> {
        let status = WorkloadStatus::from_active_projects(snapshot.active_projects);
        employee_profiles::Entity::update_many()
            .col_expr(
                employee_profiles::Column::NumberOfActiveProjects,
                Expr::value(i32::try_from(snapshot.active_projects).unwrap_or(i32::MAX)),
            )
            .col_expr(
                employee_profiles::Column::NumberOfTasks,
                Expr::value(i32::try_from(snapshot.open_tasks).unwrap_or(i32::MAX)),
            )
            .col_expr(
                employee_profiles::Column::WorkloadStatus,
                Expr::value(status.as_str()),
            )
            .col_expr(
                employee_profiles::Column::NextProjectDeadline,
                Expr::value(snapshot.next_project_deadline),
            )
            .col_expr(
                employee_profiles::Column::ModifiedAt,
                Expr::value(Some(snapshot.computed_at)),
            )
            .filter(employee_profiles::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("save workload snapshot")?;
        Ok(())
    }
}

#[async_trait]
impl ProjectsRepository for SeaOrmRepository {
    async fn list(&self, scope: ProjectScope) -> anyhow::Result<Vec<ProjectDetails>> {
        let mut query = projects::Entity::find();
        if let ProjectScope::LedBy(lead) = scope {
            query = query.filter(projects::Column::TeamLeadId.eq(lead));
        }
        let rows = query
            .order_by_desc(projects::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("list projects")?;
        project_details(&self.db, rows).await
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        projects::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find project")?
            .map(mapper::project_to_contract)
            .transpose()
    }

    async fn find_details(&self, id: Uuid) -> anyhow::Result<Option<ProjectDetails>> {
        let Some(row) = projects::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find project")?
        else {
            return Ok(None);
        };
        Ok(project_details(&self.db, vec![row]).await?.pop())
    }

    async fn insert(&self, project: Project) -> anyhow::Result<()> {
        projects::Entity::insert(
            mapper::project_to_entity(&project)
                .into_active_model()
                .reset_all(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("insert project")?;
        Ok(())
    }

    async fn update(&self, project: Project) -> anyhow::Result<()> {
        mapper::project_to_entity(&project)
            .into_active_model()
            .reset_all()
            .update(&self.db)
            .await
            .context("update project")?;
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<Option<Vec<Uuid>>> {
        let txn = self.db.begin().await.context("begin project delete")?;

        let mut affected: BTreeSet<Uuid> = project_assignments::Entity::find()
            .select_only()
            .column(project_assignments::Column::EmployeeId)
            .filter(project_assignments::Column::ProjectId.eq(id))
            .into_tuple::<Uuid>()
            .all(&txn)
            .await
            .context("load project assignees")?
            .into_iter()
            .collect();
        affected.extend(
            tasks::Entity::find()
                .select_only()
                .column(tasks::Column::EmployeeId)
                .filter(tasks::Column::ProjectId.eq(id))
                .into_tuple::<Uuid>()
                .all(&txn)
                .await
                .context("load project task assignees")?,
        );

        task_comments::Entity::delete_many()
            .filter(
                task_comments::Column::TaskId.in_subquery(
                    Query::select()
                        .column(tasks::Column::Id)
                        .from(tasks::Entity)
                        .and_where(tasks::Column::ProjectId.eq(id))
                        .to_owned(),
                ),
            )
            .exec(&txn)
            .await
            .context("delete project task comments")?;
        tasks::Entity::delete_many()
            .filter(tasks::Column::ProjectId.eq(id))
            .exec(&txn)
            .await
            .context("delete project tasks")?;
        project_assignments::Entity::delete_many()
            .filter(project_assignments::Column::ProjectId.eq(id))
            .exec(&txn)
            .await
            .context("delete project assignments")?;
        let result = projects::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete project")?;

        txn.commit().await.context("commit project delete")?;
        Ok((result.rows_affected > 0).then(|| affected.into_iter().collect()))
    }

    async fn insert_assignment(&self, assignment: ProjectAssignment) -> anyhow::Result<bool> {
        let row = mapper::assignment_to_entity(&assignment)
            .into_active_model()
            .reset_all();
        match project_assignments::Entity::insert(row)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(e).context("insert project assignment"),
        }
    }

    async fn has_active_assignment(
        &self,
        project_id: Uuid,
        employee_id: Uuid,
    ) -> anyhow::Result<bool> {
        let count = project_assignments::Entity::find()
            .filter(project_assignments::Column::ProjectId.eq(project_id))
            .filter(project_assignments::Column::EmployeeId.eq(employee_id))
            .filter(project_assignments::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .context("check active assignment")?;
        Ok(count > 0)
    }

    async fn active_assignment_end_dates(
        &self,
        employee_id: Uuid,
    ) -> anyhow::Result<Vec<DateTime<Utc>>> {
        projects::Entity::find()
            .select_only()
            .column(projects::Column::EndDate)
            .filter(
                projects::Column::Id.in_subquery(
                    Query::select()
                        .column(project_assignments::Column::ProjectId)
                        .from(project_assignments::Entity)
                        .and_where(project_assignments::Column::EmployeeId.eq(employee_id))
                        .and_where(project_assignments::Column::IsActive.eq(true))
                        .to_owned(),
                ),
            )
            .into_tuple::<DateTime<Utc>>()
            .all(&self.db)
            .await
            .context("load assignment end dates")
    }
}

#[async_trait]
impl TasksRepository for SeaOrmRepository {
    async fn list(
        &self,
        scope: TaskScope,
        project_id: Option<Uuid>,
    ) -> anyhow::Result<Vec<TaskDetails>> {
        let mut query = tasks::Entity::find();
        query = match scope {
            TaskScope::All => query,
            TaskScope::InProjectsLedBy(lead) => query.filter(
                tasks::Column::ProjectId.in_subquery(
                    Query::select()
                        .column(projects::Column::Id)
                        .from(projects::Entity)
                        .and_where(projects::Column::TeamLeadId.eq(lead))
                        .to_owned(),
                ),
            ),
            TaskScope::AssignedTo(employee) => {
                query.filter(tasks::Column::EmployeeId.eq(employee))
            }
        };
        if let Some(project_id) = project_id {
            query = query.filter(tasks::Column::ProjectId.eq(project_id));
        }
        let rows = query
            .order_by_asc(tasks::Column::DueDate)
            .order_by_asc(tasks::Column::CreatedDate)
            .all(&self.db)
            .await
            .context("list tasks")?;
        task_details(&self.db, rows).await
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        tasks::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find task")?
            .map(mapper::task_to_contract)
            .transpose()
    }

    async fn find_details(&self, id: Uuid) -> anyhow::Result<Option<TaskDetails>> {
        let Some(row) = tasks::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find task")?
        else {
            return Ok(None);
        };
        let Some(mut details) = task_details(&self.db, vec![row]).await?.pop() else {
            return Ok(None);
        };

        let comment_rows = task_comments::Entity::find()
            .filter(task_comments::Column::TaskId.eq(id))
            .order_by_asc(task_comments::Column::CreatedDate)
            .all(&self.db)
            .await
            .context("load task comments")?;
        let authors = summaries(&self.db, comment_rows.iter().map(|c| c.user_id).collect()).await?;
        details.comments = comment_rows
            .into_iter()
            .map(|row| {
                let author = authors.get(&row.user_id).cloned();
                CommentDetails {
                    comment: mapper::comment_to_contract(row),
                    author,
                }
            })
            .collect();
        Ok(Some(details))
    }

    async fn insert(&self, task: Task) -> anyhow::Result<()> {
        tasks::Entity::insert(mapper::task_to_entity(&task).into_active_model().reset_all())
            .exec_without_returning(&self.db)
            .await
            .context("insert task")?;
        Ok(())
    }

    async fn update(&self, task: Task) -> anyhow::Result<()> {
        mapper::task_to_entity(&task)
            .into_active_model()
            .reset_all()
            .update(&self.db)
            .await
            .context("update task")?;
        Ok(())
    }

    async fn insert_comment(&self, comment: TaskComment) -> anyhow::Result<CommentDetails> {
        task_comments::Entity::insert(
            mapper::comment_to_entity(&comment)
                .into_active_model()
                .reset_all(),
        )
        .exec_without_returning(&self.db)
        .await
        .context("insert task comment")?;
        let author = summaries(&self.db, vec![comment.user_id])
            .await?
            .remove(&comment.user_id);
        Ok(CommentDetails { comment, author })
    }

    async fn count_open_for(&self, employee_id: Uuid) -> anyhow::Result<u64> {
        tasks::Entity::find()
            .filter(tasks::Column::EmployeeId.eq(employee_id))
            .filter(tasks::Column::Status.ne(TaskStatus::Completed.as_str()))
            .count(&self.db)
            .await
            .context("count open tasks")
    }
}
