use std::sync::Arc;

use apikit::ProblemResponse;
use axum::{
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::rest::auth::Authenticated;
use crate::api::rest::dto::{
    AccountDto, AssignEmployeeReq, AssignmentDto, CommentDto, CommentReq, CreateTaskReq,
    EmployeeDto, JsonBody, ListEmployeesQuery, ListTasksQuery, LoginDto, LoginReq, MessageDto,
    PathParam, ProjectDto, ProjectReq, QueryParams, RegisterReq, TaskDto, UpdateTaskReq, VerifyDto,
};
use crate::api::rest::error::{map_domain_error, ProblemContext};
use crate::domain::error::DomainError;
use crate::domain::service::{AuthService, DirectoryService, ProjectService, TaskService};

type ApiResult<T> = Result<T, ProblemResponse>;

/// Log a failed operation and render it. Server-side failures are errors,
/// everything else is the caller's problem.
fn fail(e: DomainError, ctx: &ProblemContext, op: &str) -> ProblemResponse {
    if matches!(e, DomainError::Database { .. }) {
        error!(path = %ctx.instance, "Failed to {}: {}", op, e);
    } else {
        warn!(path = %ctx.instance, "Failed to {}: {}", op, e);
    }
    map_domain_error(&e, ctx)
}

fn body_id_mismatch(ctx: &ProblemContext, path_id: Uuid, body_id: Option<Uuid>) -> ApiResult<()> {
    match body_id {
        Some(id) if id != path_id => Err(map_domain_error(
            &DomainError::validation("id", "The id in the body does not match the URL."),
            ctx,
        )),
        _ => Ok(()),
    }
}

// ---------- auth ----------

/// Register a new account
pub async fn register(
    Extension(svc): Extension<Arc<AuthService>>,
    ctx: ProblemContext,
    JsonBody(req): JsonBody<RegisterReq>,
) -> ApiResult<Json<MessageDto>> {
    info!(email = %req.email, "Registering account");

    match svc.register(req.into()).await {
        Ok(_) => Ok(Json(MessageDto {
            message: "User registered successfully".to_string(),
        })),
        Err(e) => Err(fail(e, &ctx, "register account")),
    }
}

/// Exchange credentials for a bearer token
pub async fn login(
    Extension(svc): Extension<Arc<AuthService>>,
    ctx: ProblemContext,
    JsonBody(req): JsonBody<LoginReq>,
) -> ApiResult<Json<LoginDto>> {
    match svc.login(&req.email, &req.password).await {
        Ok(outcome) => Ok(Json(LoginDto {
            token: outcome.token,
            user: AccountDto::new(outcome.user, None),
        })),
        Err(e) => Err(fail(e, &ctx, "log in")),
    }
}

/// Current account with its employee profile
pub async fn verify(
    Extension(svc): Extension<Arc<AuthService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
) -> ApiResult<Json<VerifyDto>> {
    match svc.verify(&actor).await {
        Ok((user, profile)) => Ok(Json(VerifyDto {
            user: AccountDto::new(user, profile),
        })),
        Err(e) => Err(fail(e, &ctx, "verify session")),
    }
}

// ---------- projects ----------

/// List projects visible to the caller
pub async fn list_projects(
    Extension(svc): Extension<Arc<ProjectService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
) -> ApiResult<Json<Vec<ProjectDto>>> {
    match svc.list(&actor).await {
        Ok(projects) => Ok(Json(projects.into_iter().map(ProjectDto::from).collect())),
        Err(e) => Err(fail(e, &ctx, "list projects")),
    }
}

/// Get a project with its team lead and assignments
pub async fn get_project(
    Extension(svc): Extension<Arc<ProjectService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<ProjectDto>> {
    match svc.get(&actor, id).await {
        Ok(details) => Ok(Json(ProjectDto::from(details))),
        Err(e) => Err(fail(e, &ctx, "get project")),
    }
}

/// Create a project
pub async fn create_project(
    Extension(svc): Extension<Arc<ProjectService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    JsonBody(req): JsonBody<ProjectReq>,
) -> ApiResult<(StatusCode, Json<ProjectDto>)> {
    info!(title = %req.title, "Creating project");

    match svc.create(&actor, req.into()).await {
        Ok(project) => Ok((StatusCode::CREATED, Json(ProjectDto::from(project)))),
        Err(e) => Err(fail(e, &ctx, "create project")),
    }
}

/// Replace a project's editable fields
pub async fn update_project(
    Extension(svc): Extension<Arc<ProjectService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<ProjectReq>,
) -> ApiResult<Json<ProjectDto>> {
    body_id_mismatch(&ctx, id, req.id)?;

    match svc.update(&actor, id, req.into()).await {
        Ok(project) => Ok(Json(ProjectDto::from(project))),
        Err(e) => Err(fail(e, &ctx, "update project")),
    }
}

/// Delete a project with its tasks and assignments
pub async fn delete_project(
    Extension(svc): Extension<Arc<ProjectService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    match svc.delete(&actor, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(fail(e, &ctx, "delete project")),
    }
}

/// Assign an employee to a project
pub async fn assign_employee(
    Extension(svc): Extension<Arc<ProjectService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(project_id): PathParam<Uuid>,
    JsonBody(req): JsonBody<AssignEmployeeReq>,
) -> ApiResult<Json<AssignmentDto>> {
    let (employee_id, role) = req.into_parts();
    info!(%project_id, %employee_id, %role, "Assigning employee");

    match svc
        .assign_employee(&actor, project_id, employee_id, role)
        .await
    {
        Ok(assignment) => Ok(Json(AssignmentDto::from(assignment))),
        Err(e) => Err(fail(e, &ctx, "assign employee")),
    }
}

// ---------- tasks ----------

/// List tasks visible to the caller, optionally within one project
pub async fn list_tasks(
    Extension(svc): Extension<Arc<TaskService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    QueryParams(query): QueryParams<ListTasksQuery>,
) -> ApiResult<Json<Vec<TaskDto>>> {
    match svc.list(&actor, query.project_id).await {
        Ok(tasks) => Ok(Json(tasks.into_iter().map(TaskDto::from).collect())),
        Err(e) => Err(fail(e, &ctx, "list tasks")),
    }
}

/// Get a task with its project, assignee and comments
pub async fn get_task(
    Extension(svc): Extension<Arc<TaskService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<TaskDto>> {
    match svc.get(&actor, id).await {
        Ok(details) => Ok(Json(TaskDto::from(details))),
        Err(e) => Err(fail(e, &ctx, "get task")),
    }
}

/// Create a task in a project led by the caller
pub async fn create_task(
    Extension(svc): Extension<Arc<TaskService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    JsonBody(req): JsonBody<CreateTaskReq>,
) -> ApiResult<(StatusCode, Json<TaskDto>)> {
    info!(title = %req.title, project_id = %req.project_id, "Creating task");

    match svc.create(&actor, req.into()).await {
        Ok(task) => Ok((StatusCode::CREATED, Json(TaskDto::from(task)))),
        Err(e) => Err(fail(e, &ctx, "create task")),
    }
}

/// Update a task; assignees may only change status and description
pub async fn update_task(
    Extension(svc): Extension<Arc<TaskService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(id): PathParam<Uuid>,
    JsonBody(req): JsonBody<UpdateTaskReq>,
) -> ApiResult<Json<TaskDto>> {
    body_id_mismatch(&ctx, id, req.id)?;

    match svc.update(&actor, id, req.into()).await {
        Ok(task) => Ok(Json(TaskDto::from(task))),
        Err(e) => Err(fail(e, &ctx, "update task")),
    }
}

/// Add a comment to a task
pub async fn add_comment(
    Extension(svc): Extension<Arc<TaskService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(task_id): PathParam<Uuid>,
    JsonBody(req): JsonBody<CommentReq>,
) -> ApiResult<(StatusCode, Json<CommentDto>)> {
    match svc.add_comment(&actor, task_id, &req.content).await {
        Ok(comment) => Ok((StatusCode::CREATED, Json(CommentDto::from(comment)))),
        Err(e) => Err(fail(e, &ctx, "add comment")),
    }
}

// ---------- employee directory ----------

/// List active employees, optionally with one role
pub async fn list_employees(
    Extension(svc): Extension<Arc<DirectoryService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    QueryParams(query): QueryParams<ListEmployeesQuery>,
) -> ApiResult<Json<Vec<EmployeeDto>>> {
    match svc.list(&actor, query.role).await {
        Ok(entries) => Ok(Json(entries.into_iter().map(EmployeeDto::from).collect())),
        Err(e) => Err(fail(e, &ctx, "list employees")),
    }
}

/// Get one employee with their profile
pub async fn get_employee(
    Extension(svc): Extension<Arc<DirectoryService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Json<EmployeeDto>> {
    match svc.get(&actor, id).await {
        Ok(entry) => Ok(Json(EmployeeDto::from(entry))),
        Err(e) => Err(fail(e, &ctx, "get employee")),
    }
}

/// Deactivate an account
pub async fn deactivate_employee(
    Extension(svc): Extension<Arc<DirectoryService>>,
    ctx: ProblemContext,
    Authenticated(actor): Authenticated,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    info!(employee_id = %id, "Deactivating account");

    match svc.deactivate(&actor, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err(fail(e, &ctx, "deactivate employee")),
    }
}
