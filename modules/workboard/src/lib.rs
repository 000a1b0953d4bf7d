//! Project and task workboard: credentials, role-scoped access rules,
//! the assignment workflow and the task lifecycle, with SeaORM storage,
//! SMTP notifications and a REST surface.

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === MODULE WIRING ===
pub mod module;
pub use module::Workboard;

// === INTERNAL MODULES ===
// Exposed for integration tests; other crates should stick to `contract`
// and `module`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
