use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::contract::model::{Actor, EmployeeProfile, Role, User};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;
use crate::domain::service::db_err;

/// A user as seen in the employee directory.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub user: User,
    pub profile: Option<EmployeeProfile>,
}

/// Read access to accounts and profiles, plus deactivation.
#[derive(Clone)]
pub struct DirectoryService {
    users: Arc<dyn UsersRepository>,
}

impl DirectoryService {
    pub fn new(users: Arc<dyn UsersRepository>) -> Self {
        Self { users }
    }

    #[instrument(name = "workboard.service.list_employees", skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn list(
        &self,
        actor: &Actor,
        role: Option<Role>,
    ) -> Result<Vec<DirectoryEntry>, DomainError> {
        if !matches!(actor.primary_role(), Some(Role::Manager | Role::TeamLead)) {
            return Err(DomainError::forbidden(
                "only managers and team leads can browse the directory",
            ));
        }
        let users = self.users.list_active(role).await.map_err(db_err)?;
        let mut entries = Vec::with_capacity(users.len());
        for user in users {
            let profile = self.users.find_profile(user.id).await.map_err(db_err)?;
            entries.push(DirectoryEntry { user, profile });
        }
        info!(count = entries.len(), "Listed employees");
        Ok(entries)
    }

    /// Managers and team leads may read anyone; others only themselves.
    #[instrument(name = "workboard.service.get_employee", skip(self, actor), fields(actor_id = %actor.id, employee_id = %id))]
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<DirectoryEntry, DomainError> {
        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::employee_not_found(id))?;
        let privileged = matches!(actor.primary_role(), Some(Role::Manager | Role::TeamLead));
        if !privileged && actor.id != id {
            return Err(DomainError::forbidden("employees can only view their own record"));
        }
        let profile = self.users.find_profile(id).await.map_err(db_err)?;
        Ok(DirectoryEntry { user, profile })
    }

    #[instrument(name = "workboard.service.deactivate_employee", skip(self, actor), fields(actor_id = %actor.id, employee_id = %id))]
    pub async fn deactivate(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        if actor.primary_role() != Some(Role::Manager) {
            return Err(DomainError::forbidden("only managers can deactivate accounts"));
        }
        if actor.id == id {
            return Err(DomainError::validation("id", "You cannot deactivate your own account."));
        }
        let found = self.users.set_active(id, false).await.map_err(db_err)?;
        if !found {
            return Err(DomainError::employee_not_found(id));
        }
        info!("Account deactivated");
        Ok(())
    }
}
