//! Process-level plumbing shared by the server binary and its modules:
//! layered configuration and logging bootstrap.

pub mod config;
mod home_dir;
pub mod logging;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
pub use home_dir::resolve_home_dir;
