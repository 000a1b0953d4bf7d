use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};

use crate::api::rest::handlers;
use crate::domain::credentials::TokenService;
use crate::domain::service::{AuthService, DirectoryService, ProjectService, TaskService};

/// Services the REST handlers reach through request extensions.
#[derive(Clone)]
pub struct RestServices {
    pub auth: Arc<AuthService>,
    pub projects: Arc<ProjectService>,
    pub tasks: Arc<TaskService>,
    pub directory: Arc<DirectoryService>,
    pub tokens: Arc<TokenService>,
}

/// Mount the workboard API under `/api` on `router`.
pub fn register_routes(router: Router, services: RestServices) -> Router {
    let api = Router::new()
        // auth
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/verify", get(handlers::verify))
        // projects
        .route(
            "/api/project",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/project/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/api/project/{id}/AssignEmployee",
            post(handlers::assign_employee),
        )
        // tasks
        .route(
            "/api/task",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route(
            "/api/task/{id}",
            get(handlers::get_task).put(handlers::update_task),
        )
        .route("/api/task/{id}/Comment", post(handlers::add_comment))
        // employee directory
        .route("/api/employee", get(handlers::list_employees))
        .route("/api/employee/{id}", get(handlers::get_employee))
        .route(
            "/api/employee/{id}/Deactivate",
            post(handlers::deactivate_employee),
        )
        .layer(Extension(services.auth))
        .layer(Extension(services.projects))
        .layer(Extension(services.tasks))
        .layer(Extension(services.directory))
        .layer(Extension(services.tokens));

    router.merge(api)
}
