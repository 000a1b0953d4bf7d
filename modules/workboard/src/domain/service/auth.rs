use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    Actor, EmployeeProfile, NewAccount, NewRegistration, Role, User, WorkloadStatus,
};
use crate::domain::credentials::{check_password_policy, TokenService};
use crate::domain::error::{DomainError, Violations};
use crate::domain::ports::PasswordHasher;
use crate::domain::repo::UsersRepository;
use crate::domain::service::db_err;

/// Successful login: a signed token plus the account it was issued for.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Registration, login and session verification.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub fn tokens(&self) -> Arc<TokenService> {
        self.tokens.clone()
    }

    #[instrument(name = "workboard.service.register", skip(self, reg), fields(email = %reg.email))]
    pub async fn register(&self, reg: NewRegistration) -> Result<User, DomainError> {
        info!("Registering new account");

        let email = reg.email.trim().to_string();
        let mut violations = Violations::new();
        violations.require("email", &email);
        if !email.is_empty() && !looks_like_email(&email) {
            violations.add("email", "The Email field is not a valid e-mail address.");
        }
        violations.require("firstName", &reg.first_name);
        violations.require("lastName", &reg.last_name);
        check_password_policy(&reg.password, &mut violations);

        if !email.is_empty()
            && self
                .users
                .email_exists(&email)
                .await
                .map_err(db_err)?
        {
            violations.add("email", format!("Email '{email}' is already taken."));
        }
        violations.into_result()?;

        let role = reg
            .role
            .as_deref()
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or(Role::Employee);

        let password_hash = self
            .hasher
            .hash(&reg.password)
            .await
            .map_err(|e| DomainError::database(format!("password hashing failed: {e}")))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            first_name: reg.first_name.trim().to_string(),
            last_name: reg.last_name.trim().to_string(),
            is_active: true,
            roles: vec![role],
            created_at: now,
        };
        let profile = EmployeeProfile {
            user_id: user.id,
            skills: String::new(),
            total_years_of_experience: 0,
            current_role: role.as_str().to_string(),
            responsibilities: String::new(),
            workload_status: WorkloadStatus::Available,
            number_of_active_projects: 0,
            number_of_tasks: 0,
            estimated_hours: 0,
            next_project_deadline: None,
            created_at: now,
            modified_at: None,
        };

        let inserted = self
            .users
            .insert_account(NewAccount {
                user: user.clone(),
                password_hash,
                profile,
            })
            .await
            .map_err(db_err)?;
        if !inserted {
            warn!("Concurrent registration with the same email rejected");
            return Err(DomainError::validation(
                "email",
                format!("Email '{}' is already taken.", user.email),
            ));
        }

        info!(user_id = %user.id, role = %role, "Account registered");
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    /// A deactivated account is only reported after the password matched.
    #[instrument(name = "workboard.service.login", skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, DomainError> {
        debug!("Attempting login");

        let Some(stored) = self
            .users
            .find_credentials(email.trim())
            .await
            .map_err(db_err)?
        else {
            warn!("Login failed");
            return Err(DomainError::InvalidCredentials);
        };

        let matches = self
            .hasher
            .verify(password, &stored.password_hash)
            .await
            .map_err(|e| DomainError::database(format!("password verification failed: {e}")))?;
        if !matches {
            warn!(user_id = %stored.user.id, "Login failed");
            return Err(DomainError::InvalidCredentials);
        }
        if !stored.user.is_active {
            warn!(user_id = %stored.user.id, "Login refused for deactivated account");
            return Err(DomainError::AccountDeactivated);
        }

        let token = self.tokens.issue(&stored.user)?;
        info!(user_id = %stored.user.id, "Login succeeded");
        Ok(LoginOutcome {
            token,
            user: stored.user,
        })
    }

    /// Resolve the current account behind a verified token.
    #[instrument(name = "workboard.service.verify", skip(self, actor), fields(user_id = %actor.id))]
    pub async fn verify(
        &self,
        actor: &Actor,
    ) -> Result<(User, Option<EmployeeProfile>), DomainError> {
        let user = self
            .users
            .find_by_id(actor.id)
            .await
            .map_err(db_err)?
            .ok_or(DomainError::InvalidCredentials)?;
        if !user.is_active {
            return Err(DomainError::AccountDeactivated);
        }
        let profile = self.users.find_profile(user.id).await.map_err(db_err)?;
        Ok((user, profile))
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !s.contains(' ')
        }
        None => false,
    }
}
