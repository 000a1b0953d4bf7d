//! Small HTTP toolkit shared by REST modules.

pub mod problem;
pub mod shutdown;

pub use problem::{Problem, ProblemResponse, ValidationError, APPLICATION_PROBLEM_JSON};
