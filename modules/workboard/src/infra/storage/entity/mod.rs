//! SeaORM entities, one module per table. Relations are resolved with
//! explicit queries in the repository, so the `Relation` enums stay empty.

pub mod employee_profiles;
pub mod project_assignments;
pub mod projects;
pub mod roles;
pub mod task_comments;
pub mod tasks;
pub mod user_roles;
pub mod users;
