use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::contract::model::WorkloadSnapshot;
use crate::domain::repo::{ProjectsRepository, TasksRepository, UsersRepository};

/// Recomputes the workload counters stored on an employee profile.
#[derive(Clone)]
pub struct WorkloadTracker {
    users: Arc<dyn UsersRepository>,
    projects: Arc<dyn ProjectsRepository>,
    tasks: Arc<dyn TasksRepository>,
}

impl WorkloadTracker {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        projects: Arc<dyn ProjectsRepository>,
        tasks: Arc<dyn TasksRepository>,
    ) -> Self {
        Self {
            users,
            projects,
            tasks,
        }
    }

    pub async fn snapshot(&self, employee_id: Uuid) -> anyhow::Result<WorkloadSnapshot> {
        let now = Utc::now();
        let end_dates = self.projects.active_assignment_end_dates(employee_id).await?;
        let open_tasks = self.tasks.count_open_for(employee_id).await?;
        Ok(WorkloadSnapshot {
            active_projects: end_dates.len() as u64,
            open_tasks,
            next_project_deadline: end_dates.into_iter().min(),
            computed_at: now,
        })
    }

    /// Best-effort: the triggering mutation has already committed, so a
    /// failure here is only logged.
    pub async fn refresh(&self, employee_id: Uuid) {
        let result = async {
            let snapshot = self.snapshot(employee_id).await?;
            self.users.save_workload(employee_id, &snapshot).await?;
            anyhow::Ok(snapshot)
        }
        .await;

        match result {
            Ok(s) => debug!(
                employee_id = %employee_id,
                active_projects = s.active_projects,
                open_tasks = s.open_tasks,
                "Workload refreshed"
            ),
            Err(e) => warn!(employee_id = %employee_id, error = %e, "Workload refresh failed"),
        }
    }
}
